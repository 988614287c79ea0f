//! Bits shared by every layout, and operand packing helpers.

use crate::instr::{InstrFlags, Instruction};
use crate::opcode::{OpcodeInfo, D_BIT, H_BIT, M_BIT, P_BIT, R_BIT, S_BIT, U_BIT, W_BIT};
use crate::opnd::Operand;
use crate::reg::{Reg, RegBank};

/// Condition, instruction type, primary opcode, fixed bits and every
/// variable flag the opcode declares.
///
/// ```text
/// cond|type|primary|....fixed....|........
/// ```
pub(crate) fn encode_common_bits(instr: &Instruction, info: &OpcodeInfo) -> u32 {
    let op = instr.opcode();
    let cond = if op.is_unconditional() {
        0xF
    } else {
        instr.cond() as u32
    };
    let mut word =
        (cond << 28) | ((info.ty as u32) << 25) | (u32::from(info.primary) << 20) | info.fixed;

    let flags = instr.flags();
    let variable = [
        (op.has_p_flag(), InstrFlags::P, P_BIT),
        (op.has_u_flag(), InstrFlags::U, U_BIT),
        (op.has_d_flag(), InstrFlags::D, D_BIT),
        (op.has_w_flag(), InstrFlags::W, W_BIT),
        (op.has_s_flag(), InstrFlags::S, S_BIT),
        (op.has_h_flag(), InstrFlags::H, H_BIT),
        (op.has_m_flag(), InstrFlags::M, M_BIT),
        (op.has_r_flag(), InstrFlags::R, R_BIT),
    ];
    for (applies, flag, bit) in variable {
        if applies && flags.contains(flag) {
            word |= bit;
        }
    }
    word
}

/// Shift type at bits 6..5 and the secondary opcode, ORed into bits 7..0.
pub(crate) fn encode_bits_7_to_0(instr: &Instruction, info: &OpcodeInfo) -> u32 {
    let mut bits = u32::from(info.secondary);
    if let Some(shift) = instr.shift() {
        if instr.opcode().has_shift() {
            bits |= (shift as u32) << 5;
        }
    }
    bits
}

// ── Operand accessors ────────────────────────────────────────────────────
//
// The matched template guarantees operand kinds, so a mismatch here is a
// bug in the template table.

pub(crate) fn reg_of(op: &Operand) -> Reg {
    match op {
        Operand::Reg(reg) => *reg,
        other => unreachable!("expected a register operand, found {:?}", other),
    }
}

pub(crate) fn imm_of(op: &Operand) -> i64 {
    match op {
        Operand::Immed { value, .. } => *value,
        other => unreachable!("expected an immediate operand, found {:?}", other),
    }
}

/// 4-bit number of a general-purpose register operand placed at `shift`.
pub(crate) fn gpr_at(op: &Operand, shift: u32) -> u32 {
    reg_of(op).gpr_number() << shift
}

/// 4-bit bank index of a coprocessor register operand placed at `shift`.
pub(crate) fn creg_at(op: &Operand, shift: u32) -> u32 {
    let reg = reg_of(op);
    debug_assert_eq!(reg.bank(), Some(RegBank::Coproc));
    reg.bank_index() << shift
}

/// Field of a VFP register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VfpField {
    /// `Vd` at 15..12, `D` at 22.
    D,
    /// `Vn` at 19..16, `N` at 7.
    N,
    /// `Vm` at 3..0, `M` at 5.
    M,
}

impl VfpField {
    fn positions(self) -> (u32, u32) {
        match self {
            VfpField::D => (12, 22),
            VfpField::N => (16, 7),
            VfpField::M => (0, 5),
        }
    }
}

/// Split a VFP register into its 4-bit field and extra bit.
///
/// Single registers are `Vx:X` (extra bit low); double registers are
/// `X:Vx` (extra bit high).
pub(crate) fn vfp_reg_at(reg: Reg, field: VfpField) -> u32 {
    let (main, extra) = field.positions();
    let index = reg.bank_index();
    match reg.bank() {
        Some(RegBank::Single) => ((index >> 1) << main) | ((index & 1) << extra),
        Some(RegBank::Double) => ((index & 0xF) << main) | ((index >> 4) << extra),
        other => unreachable!("{} is not a VFP register ({:?})", reg, other),
    }
}

/// Inverse of [`vfp_reg_at`].
pub(crate) fn vfp_reg_from(word: u32, field: VfpField, bank: RegBank) -> Reg {
    let (main, extra) = field.positions();
    let v = (word >> main) & 0xF;
    let x = (word >> extra) & 1;
    let index = match bank {
        RegBank::Single => (v << 1) | x,
        _ => (x << 4) | v,
    };
    Reg::from_bank(bank, index)
}

/// Components of a memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemParts {
    pub base: Reg,
    pub index: Reg,
    /// `log2(scale)`, the LSL amount applied to the index.
    pub shift: u32,
    pub subtract: bool,
    pub disp: i32,
}

impl MemParts {
    /// Magnitude of the displacement.
    pub fn magnitude(&self) -> u32 {
        self.disp.unsigned_abs()
    }
}

/// Split a register-based memory operand. `None` for other operands.
pub(crate) fn mem_parts(op: &Operand) -> Option<MemParts> {
    match op {
        Operand::MemReg(base) => Some(MemParts {
            base: *base,
            index: Reg::Null,
            shift: 0,
            subtract: false,
            disp: 0,
        }),
        Operand::BaseDisp(bd) => Some(MemParts {
            base: bd.base,
            index: bd.index,
            shift: if bd.has_index() {
                bd.scale.trailing_zeros()
            } else {
                0
            },
            subtract: bd.has_index() && bd.subtract_index,
            disp: bd.disp,
        }),
        _ => None,
    }
}

/// Memory operand of an instruction; the first memory reference among its
/// sources, then its destinations.
pub(crate) fn mem_operand(instr: &Instruction) -> &Operand {
    match instr
        .srcs()
        .iter()
        .chain(instr.dsts().iter())
        .find(|op| op.is_memory_reference())
    {
        Some(op) => op,
        None => unreachable!("{} has no memory operand", instr.opcode()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use crate::instr::{Cond, ShiftType};
    use crate::opcode::Opcode;

    #[test]
    fn common_bits_of_add() {
        let add = create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2);
        let info = Opcode::AddReg.info().unwrap();
        assert_eq!(encode_common_bits(&add, &info), 0xE080_0000);
        let adds = add.with_flags(InstrFlags::S).with_cond(Cond::Ne);
        assert_eq!(encode_common_bits(&adds, &info), 0x1090_0000);
    }

    #[test]
    fn unconditional_opcodes_ignore_stored_cond() {
        let dmb = create::dmb(0xF).with_cond(Cond::Eq);
        let info = Opcode::Dmb.info().unwrap();
        assert_eq!(encode_common_bits(&dmb, &info) >> 28, 0xF);
    }

    #[test]
    fn inapplicable_flags_are_dropped() {
        let cmp = create::dp_test_reg(Opcode::CmpReg, Reg::R0, Reg::R1).with_flags(InstrFlags::W);
        let info = Opcode::CmpReg.info().unwrap();
        assert_eq!(encode_common_bits(&cmp, &info), 0xE150_0000);
    }

    #[test]
    fn secondary_bits_always_present() {
        // mul r0, r0, r0: bits 7..4 must be 1001 even though every
        // operand field is zero.
        let mul = create::mul(Reg::R0, Reg::R0, Reg::R0);
        let info = Opcode::Mul.info().unwrap();
        assert_eq!(encode_bits_7_to_0(&mul, &info), 0x90);
    }

    #[test]
    fn shift_type_lands_in_bits_6_5() {
        let sub =
            create::dp_reg_shifted(Opcode::SubReg, Reg::R0, Reg::R1, Reg::R2, ShiftType::Ror, 1);
        let info = Opcode::SubReg.info().unwrap();
        assert_eq!(encode_bits_7_to_0(&sub, &info), 0b0110_0000);
    }

    #[test]
    fn vfp_register_split() {
        assert_eq!(vfp_reg_at(Reg::S3, VfpField::D), (1 << 12) | (1 << 22));
        assert_eq!(vfp_reg_at(Reg::D17, VfpField::M), 1 | (1 << 5));
        assert_eq!(vfp_reg_at(Reg::S30, VfpField::N), 15 << 16);
        for reg in [Reg::S0, Reg::S17, Reg::S31] {
            let bits = vfp_reg_at(reg, VfpField::N);
            assert_eq!(vfp_reg_from(bits, VfpField::N, RegBank::Single), reg);
        }
        for reg in [Reg::D0, Reg::D9, Reg::D31] {
            let bits = vfp_reg_at(reg, VfpField::D);
            assert_eq!(vfp_reg_from(bits, VfpField::D, RegBank::Double), reg);
        }
    }
}
