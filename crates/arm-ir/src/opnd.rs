//! Operand model.
//!
//! An [`Operand`] is a small `Copy` value. Operands that point at other
//! instructions ([`Operand::Instr`], [`Operand::MemInstr`]) hold an
//! [`InstrId`] handle and never own the target.

use core::fmt;

use crate::instrlist::InstrId;
use crate::reg::Reg;
use crate::size::OpndSize;

/// `msr` mask writing the N, Z, C, V and Q flags (`APSR_nzcvq`).
pub const MASK_NZCVQ: u32 = 0b1000;
/// `msr` mask writing the GE flags (`APSR_g`).
pub const MASK_G: u32 = 0b0100;
/// `msr` mask writing all application-level flags (`APSR_nzcvqg`).
pub const MASK_NZCVQG: u32 = 0b1100;

/// Base + index * scale + displacement memory reference.
///
/// With neither base nor index the operand is an absolute address held in
/// `disp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseDisp {
    /// Base register, or [`Reg::Null`].
    pub base: Reg,
    /// Index register, or [`Reg::Null`].
    pub index: Reg,
    /// Multiplier applied to the index; a power of two.
    pub scale: u32,
    /// Signed byte displacement.
    pub disp: i32,
    /// Size of the access.
    pub size: OpndSize,
    /// The index is subtracted from the base (`[r0, -r1]`).
    pub subtract_index: bool,
    /// Keep a zero displacement explicit when printing.
    pub encode_zero_disp: bool,
    /// Prefer the widest displacement field.
    pub force_full_disp: bool,
    /// Prefer a short address form.
    pub disp_short_addr: bool,
}

impl BaseDisp {
    /// `[base, #disp]`.
    pub fn new(base: Reg, disp: i32, size: OpndSize) -> Self {
        Self {
            base,
            index: Reg::Null,
            scale: 1,
            disp,
            size,
            subtract_index: false,
            encode_zero_disp: false,
            force_full_disp: false,
            disp_short_addr: false,
        }
    }

    /// `[base, ±index, lsl #log2(scale)]`.
    pub fn indexed(base: Reg, index: Reg, scale: u32, subtract: bool, size: OpndSize) -> Self {
        Self {
            index,
            scale,
            subtract_index: subtract,
            ..Self::new(base, 0, size)
        }
    }

    /// Whether an index register is present.
    pub fn has_index(&self) -> bool {
        self.index != Reg::Null
    }

    fn address_key(&self) -> (Reg, Reg, u32, bool, i32) {
        let scale = if self.has_index() { self.scale } else { 1 };
        let subtract = self.has_index() && self.subtract_index;
        (self.base, self.index, scale, subtract, self.disp)
    }
}

/// An instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// No operand.
    #[default]
    Null,
    /// A register.
    Reg(Reg),
    /// A set of general-purpose registers; bit `i` selects `r<i>`.
    RegList(u16),
    /// The memory addressed by a register.
    MemReg(Reg),
    /// An integer constant of the given size class.
    Immed {
        /// Value; interpretation depends on the size class.
        value: i64,
        /// Size class the value must fit.
        size: OpndSize,
    },
    /// Base + index + displacement memory reference.
    BaseDisp(BaseDisp),
    /// Absolute code address.
    Pc(u32),
    /// Absolute code address in another segment.
    FarPc {
        /// Segment selector.
        seg: u16,
        /// Address within the segment.
        pc: u32,
    },
    /// Another instruction in the same list.
    Instr(InstrId),
    /// Another instruction, reached through a segment.
    FarInstr {
        /// Segment selector.
        seg: u16,
        /// Target instruction.
        instr: InstrId,
    },
    /// Memory at a displacement from another instruction's final address.
    MemInstr {
        /// Anchor instruction.
        instr: InstrId,
        /// Byte displacement from the anchor.
        disp: i32,
        /// Size of the access.
        size: OpndSize,
    },
    /// Status-register field mask (bit 3 `f`, bit 2 `s`, bit 1 `x`, bit 0 `c`).
    Mask(u32),
}

impl Operand {
    /// Register operand.
    pub fn reg(reg: Reg) -> Self {
        Operand::Reg(reg)
    }

    /// Immediate with an explicit size class.
    pub fn immed(value: i64, size: OpndSize) -> Self {
        Operand::Immed { value, size }
    }

    /// Unsized immediate.
    pub fn immed_int(value: i64) -> Self {
        Operand::Immed {
            value,
            size: OpndSize::Na,
        }
    }

    /// `[base, #disp]` of the given access size.
    pub fn base_disp(base: Reg, disp: i32, size: OpndSize) -> Self {
        Operand::BaseDisp(BaseDisp::new(base, disp, size))
    }

    /// Register list from individual general-purpose registers.
    pub fn reg_list(regs: &[Reg]) -> Self {
        let mut mask = 0u16;
        for reg in regs {
            mask |= 1 << reg.gpr_number();
        }
        Operand::RegList(mask)
    }

    /// Size class of the operand.
    ///
    /// Unsized immediates report [`OpndSize::Bits32`]; code targets report the
    /// 4-byte address size.
    pub fn size_of(&self) -> OpndSize {
        match self {
            Operand::Null => OpndSize::Na,
            Operand::Reg(reg) => OpndSize::from_bytes(reg.size_in_bytes()),
            Operand::RegList(_) => OpndSize::RegList,
            Operand::MemReg(_) => OpndSize::Bytes4,
            Operand::Immed { size, .. } => default_immed_size(*size),
            Operand::BaseDisp(bd) => bd.size,
            Operand::Pc(_)
            | Operand::FarPc { .. }
            | Operand::Instr(_)
            | Operand::FarInstr { .. } => OpndSize::Bytes4,
            Operand::MemInstr { size, .. } => *size,
            Operand::Mask(_) => OpndSize::UBits4,
        }
    }

    /// Same kind, same size after default resolution and same fields.
    pub fn same(&self, other: &Operand) -> bool {
        match (self, other) {
            (
                Operand::Immed { value: a, size: sa },
                Operand::Immed { value: b, size: sb },
            ) => a == b && default_immed_size(*sa) == default_immed_size(*sb),
            _ => self == other,
        }
    }

    /// Whether both operands address the same memory, ignoring access size.
    pub fn same_address(&self, other: &Operand) -> bool {
        match (self.address_key(), other.address_key()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (
                    Operand::MemInstr {
                        instr: a, disp: da, ..
                    },
                    Operand::MemInstr {
                        instr: b, disp: db, ..
                    },
                ) => a == b && da == db,
                _ => false,
            },
        }
    }

    fn address_key(&self) -> Option<(Reg, Reg, u32, bool, i32)> {
        match self {
            Operand::MemReg(reg) => Some((*reg, Reg::Null, 1, false, 0)),
            Operand::BaseDisp(bd) => Some(bd.address_key()),
            _ => None,
        }
    }

    /// Returns `true` for [`Operand::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Null)
    }

    /// Returns `true` for a register operand.
    pub fn is_reg(&self) -> bool {
        matches!(self, Operand::Reg(_))
    }

    /// Returns `true` for an immediate.
    pub fn is_immed(&self) -> bool {
        matches!(self, Operand::Immed { .. })
    }

    /// Returns `true` for any operand that denotes memory.
    pub fn is_memory_reference(&self) -> bool {
        matches!(
            self,
            Operand::MemReg(_) | Operand::BaseDisp(_) | Operand::MemInstr { .. }
        )
    }

    /// Returns `true` for a near absolute code address.
    pub fn is_near_pc(&self) -> bool {
        matches!(self, Operand::Pc(_))
    }

    /// Returns `true` for a near instruction reference.
    pub fn is_near_instr(&self) -> bool {
        matches!(self, Operand::Instr(_))
    }

    /// Returns `true` for a base+disp operand with neither base nor index.
    pub fn is_abs_addr(&self) -> bool {
        matches!(self, Operand::BaseDisp(bd) if bd.base == Reg::Null && !bd.has_index())
    }

    /// The register of a [`Operand::Reg`].
    pub fn as_reg(&self) -> Option<Reg> {
        match self {
            Operand::Reg(reg) => Some(*reg),
            _ => None,
        }
    }

    /// The value of an [`Operand::Immed`].
    pub fn immed_value(&self) -> Option<i64> {
        match self {
            Operand::Immed { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Base register of a memory operand, or [`Reg::Null`].
    pub fn base(&self) -> Reg {
        match self {
            Operand::MemReg(reg) => *reg,
            Operand::BaseDisp(bd) => bd.base,
            _ => Reg::Null,
        }
    }

    /// Index register of a memory operand, or [`Reg::Null`].
    pub fn index(&self) -> Reg {
        match self {
            Operand::BaseDisp(bd) => bd.index,
            _ => Reg::Null,
        }
    }

    /// Displacement of a memory operand, or 0.
    pub fn disp(&self) -> i32 {
        match self {
            Operand::BaseDisp(bd) => bd.disp,
            Operand::MemInstr { disp, .. } => *disp,
            _ => 0,
        }
    }

    /// Whether the operand reads or names `reg`.
    pub fn uses_reg(&self, reg: Reg) -> bool {
        match self {
            Operand::Reg(r) | Operand::MemReg(r) => *r == reg,
            Operand::RegList(mask) => reg.is_gpr() && mask & (1 << reg.gpr_number()) != 0,
            Operand::BaseDisp(bd) => reg != Reg::Null && (bd.base == reg || bd.index == reg),
            _ => false,
        }
    }

    /// Replace every use of `old` with `new`. Returns `true` if anything changed.
    pub fn replace_reg(&mut self, old: Reg, new: Reg) -> bool {
        match self {
            Operand::Reg(r) | Operand::MemReg(r) if *r == old => {
                *r = new;
                true
            }
            Operand::RegList(mask) if old.is_gpr() && new.is_gpr() => {
                let bit = 1 << old.gpr_number();
                if *mask & bit == 0 {
                    return false;
                }
                *mask = (*mask & !bit) | (1 << new.gpr_number());
                true
            }
            Operand::BaseDisp(bd) => {
                let mut changed = false;
                if bd.base == old {
                    bd.base = new;
                    changed = true;
                }
                if bd.index == old {
                    bd.index = new;
                    changed = true;
                }
                changed
            }
            _ => false,
        }
    }
}

fn default_immed_size(size: OpndSize) -> OpndSize {
    if size == OpndSize::Na {
        OpndSize::Bits32
    } else {
        size
    }
}

/// Iterate the registers of a register-list bitmap in ascending order.
pub fn reg_list_regs(mask: u16) -> impl Iterator<Item = Reg> {
    (0..16u32).filter(move |i| mask & (1 << i) != 0).map(Reg::gpr)
}

impl fmt::Display for BaseDisp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.base == Reg::Null && !self.has_index() {
            return write!(f, "[{:#x}]", self.disp as u32);
        }
        write!(f, "[{}", self.base)?;
        if self.has_index() {
            let sign = if self.subtract_index { "-" } else { "" };
            write!(f, ", {}{}", sign, self.index)?;
            if self.scale > 1 {
                write!(f, ", lsl #{}", self.scale.trailing_zeros())?;
            }
        }
        if self.disp != 0 || self.encode_zero_disp {
            write!(f, ", #{}", self.disp)?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Null => Ok(()),
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::RegList(mask) => {
                f.write_str("{")?;
                for (i, reg) in reg_list_regs(*mask).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", reg)?;
                }
                f.write_str("}")
            }
            Operand::MemReg(reg) => write!(f, "[{}]", reg),
            Operand::Immed { value, .. } => {
                if (0..=255).contains(value) || *value < 0 {
                    write!(f, "#{}", value)
                } else {
                    write!(f, "#{:#x}", value)
                }
            }
            Operand::BaseDisp(bd) => write!(f, "{}", bd),
            Operand::Pc(pc) => write!(f, "{:#x}", pc),
            Operand::FarPc { seg, pc } => write!(f, "{:#x}:{:#x}", seg, pc),
            Operand::Instr(id) => write!(f, "{}", id),
            Operand::FarInstr { seg, instr } => write!(f, "{:#x}:{}", seg, instr),
            Operand::MemInstr { instr, disp, .. } => write!(f, "[{}, #{}]", instr, disp),
            Operand::Mask(mask) => {
                f.write_str("_")?;
                for (bit, letter) in [(8, 'f'), (4, 's'), (2, 'x'), (1, 'c')] {
                    if mask & bit != 0 {
                        write!(f, "{}", letter)?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn sizes_of_operands() {
        assert_eq!(Operand::reg(Reg::R0).size_of(), OpndSize::Bytes4);
        assert_eq!(Operand::reg(Reg::D1).size_of(), OpndSize::Bytes8);
        assert_eq!(Operand::immed_int(3).size_of(), OpndSize::Bits32);
        assert_eq!(
            Operand::base_disp(Reg::R1, 4, OpndSize::Bytes2).size_of(),
            OpndSize::Bytes2
        );
        assert_eq!(Operand::Pc(0x1000).size_of(), OpndSize::Bytes4);
        assert_eq!(Operand::Mask(MASK_G).size_of(), OpndSize::UBits4);
    }

    #[test]
    fn same_resolves_default_sizes() {
        let a = Operand::immed_int(5);
        let b = Operand::immed(5, OpndSize::Bits32);
        let c = Operand::immed(5, OpndSize::Bits8);
        assert!(a.same(&b));
        assert!(!a.same(&c));
        assert!(Operand::reg(Reg::R3).same(&Operand::reg(Reg::R3)));
        assert!(!Operand::reg(Reg::R3).same(&Operand::reg(Reg::R4)));
        assert!(!Operand::reg(Reg::R3).same(&Operand::MemReg(Reg::R3)));
    }

    #[test]
    fn same_address_ignores_size() {
        let word = Operand::base_disp(Reg::R2, 8, OpndSize::Bytes4);
        let byte = Operand::base_disp(Reg::R2, 8, OpndSize::Bytes1);
        assert!(word.same_address(&byte));
        assert!(!word.same(&byte));
        let plain = Operand::base_disp(Reg::R2, 0, OpndSize::Bytes4);
        assert!(plain.same_address(&Operand::MemReg(Reg::R2)));
        assert!(!word.same_address(&Operand::MemReg(Reg::R2)));
        assert!(!Operand::reg(Reg::R2).same_address(&Operand::reg(Reg::R2)));
    }

    #[test]
    fn reg_list_membership() {
        let list = Operand::reg_list(&[Reg::R4, Reg::LR]);
        assert_eq!(list, Operand::RegList(0x4010));
        assert!(list.uses_reg(Reg::LR));
        assert!(!list.uses_reg(Reg::R5));
        assert!(!list.uses_reg(Reg::S4));
    }

    #[test]
    fn replace_reg_in_memory_operand() {
        let mut op = Operand::BaseDisp(BaseDisp::indexed(
            Reg::PC,
            Reg::R1,
            4,
            false,
            OpndSize::Bytes4,
        ));
        assert!(op.replace_reg(Reg::PC, Reg::R10));
        assert_eq!(op.base(), Reg::R10);
        assert_eq!(op.index(), Reg::R1);
        assert!(!op.replace_reg(Reg::PC, Reg::R10));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Operand::reg_list(&[Reg::R0, Reg::R4])), "{r0, r4}");
        assert_eq!(
            format!("{}", Operand::base_disp(Reg::R1, -4, OpndSize::Bytes4)),
            "[r1, #-4]"
        );
        let indexed = Operand::BaseDisp(BaseDisp::indexed(
            Reg::R1,
            Reg::R2,
            4,
            true,
            OpndSize::Bytes4,
        ));
        assert_eq!(format!("{}", indexed), "[r1, -r2, lsl #2]");
        assert_eq!(format!("{}", Operand::immed_int(0x1000)), "#0x1000");
        assert_eq!(format!("{}", Operand::Mask(MASK_NZCVQG)), "_fs");
    }
}
