//! Register identifiers.
//!
//! Registers are numbered from 1 in the IR: [`Reg::Null`] is 0 and `r0` is 1.
//! Every encoder site that packs a general-purpose register therefore writes
//! `reg as u32 - 1`; see [`Reg::gpr_number`].

use core::fmt;

macro_rules! registers {
    ($($variant:ident = $value:literal => $name:literal,)*) => {
        /// A register known to the IR.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u8)]
        pub enum Reg {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant = $value,
            )*
        }

        impl Reg {
            /// Every register, in id order.
            pub const ALL: &'static [Reg] = &[$(Reg::$variant,)*];

            /// Assembler name of the register.
            pub fn name(self) -> &'static str {
                match self {
                    $(Reg::$variant => $name,)*
                }
            }

            /// Look up a register by its numeric id.
            pub fn from_id(id: u8) -> Option<Reg> {
                match id {
                    $($value => Some(Reg::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

registers! {
    Null = 0 => "null",
    R0 = 1 => "r0",
    R1 = 2 => "r1",
    R2 = 3 => "r2",
    R3 = 4 => "r3",
    R4 = 5 => "r4",
    R5 = 6 => "r5",
    R6 = 7 => "r6",
    R7 = 8 => "r7",
    R8 = 9 => "r8",
    R9 = 10 => "r9",
    R10 = 11 => "r10",
    R11 = 12 => "r11",
    R12 = 13 => "r12",
    R13 = 14 => "sp",
    R14 = 15 => "lr",
    R15 = 16 => "pc",
    S0 = 17 => "s0",
    S1 = 18 => "s1",
    S2 = 19 => "s2",
    S3 = 20 => "s3",
    S4 = 21 => "s4",
    S5 = 22 => "s5",
    S6 = 23 => "s6",
    S7 = 24 => "s7",
    S8 = 25 => "s8",
    S9 = 26 => "s9",
    S10 = 27 => "s10",
    S11 = 28 => "s11",
    S12 = 29 => "s12",
    S13 = 30 => "s13",
    S14 = 31 => "s14",
    S15 = 32 => "s15",
    S16 = 33 => "s16",
    S17 = 34 => "s17",
    S18 = 35 => "s18",
    S19 = 36 => "s19",
    S20 = 37 => "s20",
    S21 = 38 => "s21",
    S22 = 39 => "s22",
    S23 = 40 => "s23",
    S24 = 41 => "s24",
    S25 = 42 => "s25",
    S26 = 43 => "s26",
    S27 = 44 => "s27",
    S28 = 45 => "s28",
    S29 = 46 => "s29",
    S30 = 47 => "s30",
    S31 = 48 => "s31",
    D0 = 49 => "d0",
    D1 = 50 => "d1",
    D2 = 51 => "d2",
    D3 = 52 => "d3",
    D4 = 53 => "d4",
    D5 = 54 => "d5",
    D6 = 55 => "d6",
    D7 = 56 => "d7",
    D8 = 57 => "d8",
    D9 = 58 => "d9",
    D10 = 59 => "d10",
    D11 = 60 => "d11",
    D12 = 61 => "d12",
    D13 = 62 => "d13",
    D14 = 63 => "d14",
    D15 = 64 => "d15",
    D16 = 65 => "d16",
    D17 = 66 => "d17",
    D18 = 67 => "d18",
    D19 = 68 => "d19",
    D20 = 69 => "d20",
    D21 = 70 => "d21",
    D22 = 71 => "d22",
    D23 = 72 => "d23",
    D24 = 73 => "d24",
    D25 = 74 => "d25",
    D26 = 75 => "d26",
    D27 = 76 => "d27",
    D28 = 77 => "d28",
    D29 = 78 => "d29",
    D30 = 79 => "d30",
    D31 = 80 => "d31",
    Q0 = 81 => "q0",
    Q1 = 82 => "q1",
    Q2 = 83 => "q2",
    Q3 = 84 => "q3",
    Q4 = 85 => "q4",
    Q5 = 86 => "q5",
    Q6 = 87 => "q6",
    Q7 = 88 => "q7",
    Q8 = 89 => "q8",
    Q9 = 90 => "q9",
    Q10 = 91 => "q10",
    Q11 = 92 => "q11",
    Q12 = 93 => "q12",
    Q13 = 94 => "q13",
    Q14 = 95 => "q14",
    Q15 = 96 => "q15",
    Cr0 = 97 => "c0",
    Cr1 = 98 => "c1",
    Cr2 = 99 => "c2",
    Cr3 = 100 => "c3",
    Cr4 = 101 => "c4",
    Cr5 = 102 => "c5",
    Cr6 = 103 => "c6",
    Cr7 = 104 => "c7",
    Cr8 = 105 => "c8",
    Cr9 = 106 => "c9",
    Cr10 = 107 => "c10",
    Cr11 = 108 => "c11",
    Cr12 = 109 => "c12",
    Cr13 = 110 => "c13",
    Cr14 = 111 => "c14",
    Cr15 = 112 => "c15",
    Cpsr = 113 => "cpsr",
    Spsr = 114 => "spsr",
    Fpscr = 115 => "fpscr",
}

/// Register class, used by templates to constrain register operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegBank {
    /// `r0`..`pc`.
    Gpr,
    /// Single-precision VFP registers `s0`..`s31`.
    Single,
    /// Double-precision VFP registers `d0`..`d31`.
    Double,
    /// Advanced SIMD quad registers `q0`..`q15`.
    Quad,
    /// Coprocessor registers `c0`..`c15`.
    Coproc,
    /// `cpsr` and `spsr`.
    Status,
    /// The VFP status and control register.
    Fpscr,
}

impl Reg {
    /// Stack pointer (`r13`).
    pub const SP: Reg = Reg::R13;
    /// Link register (`r14`).
    pub const LR: Reg = Reg::R14;
    /// Program counter (`r15`).
    pub const PC: Reg = Reg::R15;

    /// The register's bank, or `None` for [`Reg::Null`].
    pub fn bank(self) -> Option<RegBank> {
        let id = self as u8;
        match id {
            1..=16 => Some(RegBank::Gpr),
            17..=48 => Some(RegBank::Single),
            49..=80 => Some(RegBank::Double),
            81..=96 => Some(RegBank::Quad),
            97..=112 => Some(RegBank::Coproc),
            113 | 114 => Some(RegBank::Status),
            115 => Some(RegBank::Fpscr),
            _ => None,
        }
    }

    /// Index of the register within its bank (`r7` → 7, `d3` → 3).
    pub fn bank_index(self) -> u32 {
        let id = self as u32;
        match self.bank() {
            Some(RegBank::Gpr) => id - Reg::R0 as u32,
            Some(RegBank::Single) => id - Reg::S0 as u32,
            Some(RegBank::Double) => id - Reg::D0 as u32,
            Some(RegBank::Quad) => id - Reg::Q0 as u32,
            Some(RegBank::Coproc) => id - Reg::Cr0 as u32,
            Some(RegBank::Status) => id - Reg::Cpsr as u32,
            Some(RegBank::Fpscr) | None => 0,
        }
    }

    /// The 4-bit encoding of a general-purpose register.
    ///
    /// # Panics
    ///
    /// Panics if the register is not `r0`..`pc`.
    pub fn gpr_number(self) -> u32 {
        assert!(self.is_gpr(), "{} is not a general-purpose register", self);
        self as u32 - 1
    }

    /// Size of the register in bytes.
    pub fn size_in_bytes(self) -> usize {
        match self.bank() {
            Some(RegBank::Gpr | RegBank::Single | RegBank::Coproc) => 4,
            Some(RegBank::Status | RegBank::Fpscr) => 4,
            Some(RegBank::Double) => 8,
            Some(RegBank::Quad) => 16,
            None => 0,
        }
    }

    /// Returns `true` for `r0`..`pc`.
    pub fn is_gpr(self) -> bool {
        self.bank() == Some(RegBank::Gpr)
    }

    /// General-purpose register with the given 4-bit number.
    pub fn gpr(n: u32) -> Reg {
        debug_assert!(n < 16);
        Reg::from_bank(RegBank::Gpr, n)
    }

    /// Register `index` of `bank`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the bank.
    pub fn from_bank(bank: RegBank, index: u32) -> Reg {
        let (first, count) = match bank {
            RegBank::Gpr => (Reg::R0, 16),
            RegBank::Single => (Reg::S0, 32),
            RegBank::Double => (Reg::D0, 32),
            RegBank::Quad => (Reg::Q0, 16),
            RegBank::Coproc => (Reg::Cr0, 16),
            RegBank::Status => (Reg::Cpsr, 2),
            RegBank::Fpscr => (Reg::Fpscr, 1),
        };
        assert!(index < count, "register index {} out of range for {:?}", index, bank);
        match Reg::from_id(first as u8 + index as u8) {
            Some(reg) => reg,
            None => unreachable!("register banks are contiguous"),
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gprs_are_one_based() {
        assert_eq!(Reg::Null as u8, 0);
        assert_eq!(Reg::R0 as u8, 1);
        assert_eq!(Reg::PC as u8, 16);
        assert_eq!(Reg::from_id(1).unwrap().gpr_number(), 0b0000);
        assert_eq!(Reg::from_id(2).unwrap().gpr_number(), 0b0001);
        assert_eq!(Reg::R2.gpr_number(), 0b0010);
        assert_eq!(Reg::PC.gpr_number(), 15);
    }

    #[test]
    fn ids_are_dense() {
        for (i, reg) in Reg::ALL.iter().enumerate() {
            assert_eq!(*reg as usize, i);
            assert_eq!(Reg::from_id(i as u8), Some(*reg));
        }
        assert_eq!(Reg::from_id(Reg::ALL.len() as u8), None);
    }

    #[test]
    fn bank_round_trip() {
        for reg in Reg::ALL.iter().skip(1) {
            let bank = reg.bank().unwrap();
            assert_eq!(Reg::from_bank(bank, reg.bank_index()), *reg);
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(Reg::R4.size_in_bytes(), 4);
        assert_eq!(Reg::S31.size_in_bytes(), 4);
        assert_eq!(Reg::D0.size_in_bytes(), 8);
        assert_eq!(Reg::Q15.size_in_bytes(), 16);
        assert_eq!(Reg::Cpsr.size_in_bytes(), 4);
        assert_eq!(Reg::Null.size_in_bytes(), 0);
    }

    #[test]
    fn names() {
        assert_eq!(Reg::SP.to_string(), "sp");
        assert_eq!(Reg::R10.name(), "r10");
        assert_eq!(Reg::D17.name(), "d17");
        assert_eq!(Reg::Cr3.name(), "c3");
    }

    #[test]
    #[should_panic(expected = "not a general-purpose register")]
    fn gpr_number_rejects_vfp() {
        let _ = Reg::S0.gpr_number();
    }
}
