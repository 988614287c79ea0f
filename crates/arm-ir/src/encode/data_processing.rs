//! Type 0 and type 1 encoders: data processing, multiplies, miscellaneous
//! and the immediate forms.
//!
//! The extra load/store families also live in type 0; their packers are in
//! [`super::load_store`].

use alloc::format;

use super::common::{gpr_at, imm_of, reg_of};
use super::{invalid, load_store, pc_relative_offset, EncodeSite};
use crate::error::IrError;
use crate::instr::Instruction;
use crate::opcode::{Family, Opcode, OpcodeInfo};
use crate::opnd::Operand;
use crate::reg::Reg;
use crate::size::{decode_rotated_imm, encode_rotated_imm};

/// Data-processing opcode field (bits 24..21) of `add` and `sub`.
const DP_ADD: u32 = 0b0100;
const DP_SUB: u32 = 0b0010;

/// Type 0 switch.
pub(super) fn encode_data_processing_and_els(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    match info.family {
        Family::DpReg | Family::DpRegMove | Family::DpRegTest => {
            Ok(encode_dp_reg(word, instr, info.family))
        }
        Family::DpRsr | Family::DpRsrMove | Family::DpRsrTest => {
            Ok(encode_dp_rsr(word, instr, info.family))
        }
        Family::Multiply | Family::MultiplyAccumulate => Ok(encode_multiply(word, instr)),
        Family::MultiplyLong => Ok(encode_multiply_long(word, instr)),
        Family::BranchExchange => Ok(word | gpr_at(&instr.src(0), 0)),
        Family::CountLeadingZeros => Ok(word | gpr_at(&instr.dst(0), 12) | gpr_at(&instr.src(0), 0)),
        Family::StatusRegRead => Ok(encode_mrs(word, instr)),
        Family::StatusRegWriteReg => Ok(encode_msr_reg(word, instr)),
        Family::Breakpoint => Ok(encode_bkpt(word, instr)),
        Family::SaturatingArith => Ok(word
            | gpr_at(&instr.dst(0), 12)
            | gpr_at(&instr.src(0), 0)
            | gpr_at(&instr.src(1), 16)),
        Family::ExtraLoadStoreImm | Family::ExtraLoadStoreReg => {
            load_store::encode_extra_load_store(word, instr, info.family)
        }
        Family::DualLoadStoreImm | Family::DualLoadStoreReg => {
            load_store::encode_dual_load_store(word, instr, info.family)
        }
        Family::ExtraLoadStoreLit => load_store::encode_extra_literal(word, instr, site),
        Family::LoadExclusive => Ok(word
            | gpr_at(&instr.dst(0), 12)
            | (instr.src(0).base().gpr_number() << 16)),
        Family::StoreExclusive => Ok(word
            | gpr_at(&instr.dst(0), 12)
            | (instr.dst(1).base().gpr_number() << 16)
            | gpr_at(&instr.src(0), 0)),
        other => unreachable!("{:?} is not a type 0 family", other),
    }
}

/// Type 1 switch.
pub(super) fn encode_data_processing_immediate(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    _site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    match info.family {
        Family::DpImm | Family::DpImmMove | Family::DpImmTest => {
            encode_dp_imm(word, instr, info.family)
        }
        Family::MoveWide => Ok(encode_move_wide(word, instr)),
        Family::StatusRegWriteImm => encode_msr_imm(word, instr),
        Family::Hint => Ok(word),
        Family::AddressOfPc => {
            let field = rotated_imm_field(instr, &instr.src(0))?;
            Ok(word | gpr_at(&instr.dst(0), 12) | field)
        }
        other => unreachable!("{:?} is not a type 1 family", other),
    }
}

// ── Data processing ──────────────────────────────────────────────────────

/// ```text
/// cond|000|opcode|S|Rn|Rd|imm5|type|0|Rm
/// ```
///
/// Without an amount operand the shift is `lsl #0`.
fn encode_dp_reg(mut word: u32, instr: &Instruction, family: Family) -> u32 {
    let srcs = instr.srcs();
    let rest = match family {
        Family::DpRegMove => {
            word |= gpr_at(&instr.dst(0), 12);
            srcs
        }
        Family::DpRegTest => {
            word |= gpr_at(&srcs[0], 16);
            &srcs[1..]
        }
        _ => {
            word |= gpr_at(&instr.dst(0), 12) | gpr_at(&srcs[0], 16);
            &srcs[1..]
        }
    };
    word |= gpr_at(&rest[0], 0);
    if let Some(amount) = rest.get(1) {
        word |= ((imm_of(amount) as u32) & 0x1F) << 7;
    }
    word
}

/// ```text
/// cond|000|opcode|S|Rn|Rd|Rs|0|type|1|Rm
/// ```
fn encode_dp_rsr(mut word: u32, instr: &Instruction, family: Family) -> u32 {
    let srcs = instr.srcs();
    let rest = match family {
        Family::DpRsrMove => {
            word |= gpr_at(&instr.dst(0), 12);
            srcs
        }
        Family::DpRsrTest => {
            word |= gpr_at(&srcs[0], 16);
            &srcs[1..]
        }
        _ => {
            word |= gpr_at(&instr.dst(0), 12) | gpr_at(&srcs[0], 16);
            &srcs[1..]
        }
    };
    word | gpr_at(&rest[0], 0) | gpr_at(&rest[1], 8)
}

/// ```text
/// cond|001|opcode|S|Rn|Rd|rotate|imm8
/// ```
fn encode_dp_imm(mut word: u32, instr: &Instruction, family: Family) -> Result<u32, IrError> {
    let srcs = instr.srcs();
    let value = match family {
        Family::DpImmMove => {
            word |= gpr_at(&instr.dst(0), 12);
            &srcs[0]
        }
        Family::DpImmTest => {
            word |= gpr_at(&srcs[0], 16);
            &srcs[1]
        }
        _ => {
            word |= gpr_at(&instr.dst(0), 12) | gpr_at(&srcs[0], 16);
            &srcs[1]
        }
    };
    Ok(word | rotated_imm_field(instr, value)?)
}

/// 12-bit modified-immediate field of an immediate operand.
fn rotated_imm_field(instr: &Instruction, op: &Operand) -> Result<u32, IrError> {
    let value = imm_of(op);
    match encode_rotated_imm(value as u32) {
        Some((rot, imm8)) => Ok((rot << 8) | imm8),
        None => Err(invalid(
            instr.opcode(),
            format!("{:#x} is not a rotated 8-bit immediate", value),
        )),
    }
}

/// Re-aim a copied `add rd, pc, #imm` or `sub rd, pc, #imm` so that it
/// computes the same address from `to` that it computed from `from`.
///
/// The copy becomes whichever of `add` and `sub` holds the new offset. An
/// offset that no rotated immediate expresses is unreachable even when
/// reachability is not checked, since there is no field to truncate into.
pub(super) fn retarget_adr_word(
    opcode: Opcode,
    word: u32,
    from: u32,
    to: u32,
) -> Result<u32, IrError> {
    let value = decode_rotated_imm(word & 0xFFF);
    let base = from.wrapping_add(8);
    let target = if (word >> 21) & 0xF == DP_SUB {
        base.wrapping_sub(value)
    } else {
        base.wrapping_add(value)
    };
    let offset = pc_relative_offset(to, target);
    let op = if offset >= 0 { DP_ADD } else { DP_SUB };
    let (rot, imm8) = u32::try_from(offset.unsigned_abs())
        .ok()
        .and_then(encode_rotated_imm)
        .ok_or(IrError::TargetUnreachable {
            opcode,
            offset,
            max: 0xFF,
        })?;
    Ok((word & !((0xF << 21) | 0xFFF)) | (op << 21) | (rot << 8) | imm8)
}

/// ```text
/// cond|0011|0H00|imm4|Rd|imm12
/// ```
///
/// `movt` names `Rd` as a source too; the immediate is its last source.
fn encode_move_wide(word: u32, instr: &Instruction) -> u32 {
    let srcs = instr.srcs();
    let value = imm_of(&srcs[srcs.len() - 1]) as u32 & 0xFFFF;
    word | gpr_at(&instr.dst(0), 12) | ((value >> 12) << 16) | (value & 0xFFF)
}

// ── Multiplies ───────────────────────────────────────────────────────────

/// ```text
/// cond|0000|opc|S|Rd|Ra|Rm|1001|Rn
/// ```
fn encode_multiply(word: u32, instr: &Instruction) -> u32 {
    let srcs = instr.srcs();
    let mut word = word | gpr_at(&instr.dst(0), 16) | gpr_at(&srcs[0], 0) | gpr_at(&srcs[1], 8);
    if let Some(ra) = srcs.get(2) {
        word |= gpr_at(ra, 12);
    }
    word
}

/// ```text
/// cond|0000|1UA|S|RdHi|RdLo|Rm|1001|Rn
/// ```
///
/// The accumulating forms repeat `RdLo` and `RdHi` as their first sources.
fn encode_multiply_long(word: u32, instr: &Instruction) -> u32 {
    let srcs = instr.srcs();
    let (rn, rm) = (&srcs[srcs.len() - 2], &srcs[srcs.len() - 1]);
    word | gpr_at(&instr.dst(0), 12) | gpr_at(&instr.dst(1), 16) | gpr_at(rn, 0) | gpr_at(rm, 8)
}

// ── Status registers and breakpoints ─────────────────────────────────────

/// `spsr` rather than `cpsr`. Not the media-multiply R flag.
const SPSR_BIT: u32 = 1 << 22;

fn status_r_bit(op: &Operand) -> u32 {
    if reg_of(op) == Reg::Spsr {
        SPSR_BIT
    } else {
        0
    }
}

/// ```text
/// cond|00010|R|00|1111|Rd|000000000000
/// ```
fn encode_mrs(word: u32, instr: &Instruction) -> u32 {
    word | gpr_at(&instr.dst(0), 12) | status_r_bit(&instr.src(0))
}

fn mask_field(op: &Operand) -> u32 {
    match op {
        Operand::Mask(mask) => (mask & 0xF) << 16,
        other => unreachable!("expected a field mask, found {:?}", other),
    }
}

/// ```text
/// cond|00010|R|10|mask|1111|00000000|Rn
/// ```
fn encode_msr_reg(word: u32, instr: &Instruction) -> u32 {
    word | status_r_bit(&instr.dst(0)) | mask_field(&instr.src(0)) | gpr_at(&instr.src(1), 0)
}

/// ```text
/// cond|00110|R|10|mask|1111|rotate|imm8
/// ```
fn encode_msr_imm(word: u32, instr: &Instruction) -> Result<u32, IrError> {
    let field = rotated_imm_field(instr, &instr.src(1))?;
    Ok(word | status_r_bit(&instr.dst(0)) | mask_field(&instr.src(0)) | field)
}

/// ```text
/// cond|00010010|imm12|0111|imm4
/// ```
fn encode_bkpt(word: u32, instr: &Instruction) -> u32 {
    let value = imm_of(&instr.src(0)) as u32 & 0xFFFF;
    word | ((value >> 4) << 8) | (value & 0xF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use crate::encode::encode;
    use crate::error::IrError;
    use crate::instr::{Cond, InstrFlags, ShiftType};
    use crate::opcode::Opcode;
    use crate::opnd::{MASK_NZCVQ, MASK_NZCVQG};

    fn arm(instr: &Instruction) -> u32 {
        let mut buf = [0u8; 4];
        encode(instr, &mut buf, 0).unwrap();
        u32::from_le_bytes(buf)
    }

    #[test]
    fn retargeted_adr_switches_between_add_and_sub() {
        // adr r0, #16 at 0x2000 → 0x2018
        assert_eq!(retarget_adr_word(Opcode::Adr, 0xE28F_0010, 0x2000, 0x1F00).unwrap(), 0xE28F_0E11);
        assert_eq!(retarget_adr_word(Opcode::Adr, 0xE28F_0010, 0x2000, 0x3000).unwrap(), 0xE24F_0EFF);
        assert_eq!(retarget_adr_word(Opcode::SubImm, 0xE24F_0EFF, 0x3000, 0x2000).unwrap(), 0xE28F_0010);
        assert!(matches!(
            retarget_adr_word(Opcode::Adr, 0xE28F_0010, 0x2000, 0x1000),
            Err(IrError::TargetUnreachable { offset: 0x1010, .. })
        ));
    }

    #[test]
    fn register_forms() {
        // add r0, r1, r2 → E0810002
        assert_eq!(arm(&create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2)), 0xE081_0002);
        // subs r3, r4, r5 → E0543005
        let subs = create::dp_reg(Opcode::SubReg, Reg::R3, Reg::R4, Reg::R5).with_flags(InstrFlags::S);
        assert_eq!(arm(&subs), 0xE054_3005);
        // mov r0, r1 → E1A00001
        assert_eq!(arm(&create::dp_move_reg(Opcode::MovReg, Reg::R0, Reg::R1)), 0xE1A0_0001);
        // cmp r0, r1 → E1500001
        assert_eq!(arm(&create::dp_test_reg(Opcode::CmpReg, Reg::R0, Reg::R1)), 0xE150_0001);
    }

    #[test]
    fn shifted_register() {
        // add r0, r1, r2, lsl #2 → E0810102
        let add =
            create::dp_reg_shifted(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2, ShiftType::Lsl, 2);
        assert_eq!(arm(&add), 0xE081_0102);
        // mov r0, r1, lsr #3 → E1A001A1
        let mov = create::dp_move_shifted(Opcode::MovReg, Reg::R0, Reg::R1, ShiftType::Lsr, 3);
        assert_eq!(arm(&mov), 0xE1A0_01A1);
    }

    #[test]
    fn register_shifted_register() {
        // add r0, r1, r2, lsl r3 → E0810312
        let add = create::dp_rsr(Opcode::AddRsr, Reg::R0, Reg::R1, Reg::R2, ShiftType::Lsl, Reg::R3);
        assert_eq!(arm(&add), 0xE081_0312);
        // mov r0, r1, asr r2 → E1A00251
        let mov = create::dp_rsr_move(Opcode::MovRsr, Reg::R0, Reg::R1, ShiftType::Asr, Reg::R2);
        assert_eq!(arm(&mov), 0xE1A0_0251);
    }

    #[test]
    fn immediates() {
        // add r0, r1, #1 → E2810001
        assert_eq!(arm(&create::dp_imm(Opcode::AddImm, Reg::R0, Reg::R1, 1)), 0xE281_0001);
        // mov r0, #0xFF000000 → E3A004FF
        assert_eq!(arm(&create::dp_move_imm(Opcode::MovImm, Reg::R0, 0xFF00_0000)), 0xE3A0_04FF);
        // cmp r0, #0 → E3500000
        assert_eq!(arm(&create::dp_test_imm(Opcode::CmpImm, Reg::R0, 0)), 0xE350_0000);
        // mvn r0, #0 → E3E00000
        assert_eq!(arm(&create::dp_move_imm(Opcode::MvnImm, Reg::R0, 0)), 0xE3E0_0000);
    }

    #[test]
    fn unrotatable_immediate_has_no_template() {
        let bad = create::dp_move_imm(Opcode::MovImm, Reg::R0, 0x101);
        assert_eq!(
            encode(&bad, &mut [0u8; 4], 0).unwrap_err(),
            IrError::NoEncoding {
                opcode: Opcode::MovImm
            }
        );
    }

    #[test]
    fn wide_moves() {
        // movw r0, #0x1234 → E3010234
        assert_eq!(arm(&create::movw(Reg::R0, 0x1234)), 0xE301_0234);
        // movt r0, #0xABCD → E34A0BCD
        assert_eq!(arm(&create::movt(Reg::R0, 0xABCD)), 0xE34A_0BCD);
    }

    #[test]
    fn multiplies() {
        // mul r0, r1, r2 → E0000291
        assert_eq!(arm(&create::mul(Reg::R0, Reg::R1, Reg::R2)), 0xE000_0291);
        // mla r0, r1, r2, r3 → E0203291
        assert_eq!(arm(&create::mla(Opcode::Mla, Reg::R0, Reg::R1, Reg::R2, Reg::R3)), 0xE020_3291);
        // umull r0, r1, r2, r3 → E0810392
        assert_eq!(
            arm(&create::mul_long(Opcode::Umull, Reg::R0, Reg::R1, Reg::R2, Reg::R3)),
            0xE081_0392
        );
        // smlal r4, r5, r6, r7 → E0E54796
        assert_eq!(
            arm(&create::mul_long_acc(Opcode::Smlal, Reg::R4, Reg::R5, Reg::R6, Reg::R7)),
            0xE0E5_4796
        );
    }

    #[test]
    fn miscellaneous() {
        // bx lr → E12FFF1E
        assert_eq!(arm(&create::bx(Reg::LR)), 0xE12F_FF1E);
        // blx r3 → E12FFF33
        assert_eq!(arm(&create::blx_reg(Reg::R3)), 0xE12F_FF33);
        // clz r0, r1 → E16F0F11
        assert_eq!(arm(&create::clz(Reg::R0, Reg::R1)), 0xE16F_0F11);
        // bkpt #0x1234 → E1212374
        assert_eq!(arm(&create::bkpt(0x1234)), 0xE121_2374);
        // qadd r0, r1, r2 → E1020051
        assert_eq!(arm(&create::saturating(Opcode::Qadd, Reg::R0, Reg::R1, Reg::R2)), 0xE102_0051);
    }

    #[test]
    fn status_registers() {
        // mrs r0, cpsr → E10F0000
        assert_eq!(arm(&create::mrs(Reg::R0, Reg::Cpsr)), 0xE10F_0000);
        // mrs r1, spsr → E14F1000
        assert_eq!(arm(&create::mrs(Reg::R1, Reg::Spsr)), 0xE14F_1000);
        // msr APSR_nzcvq, r0 → E128F000
        assert_eq!(arm(&create::msr_reg(Reg::Cpsr, MASK_NZCVQ, Reg::R0)), 0xE128_F000);
        // msr spsr_fc, r2 → E169F002
        assert_eq!(arm(&create::msr_reg(Reg::Spsr, 0b1001, Reg::R2)), 0xE169_F002);
        // msr APSR_nzcvqg, #0xF0000000 → E32CF20F
        assert_eq!(arm(&create::msr_imm(Reg::Cpsr, MASK_NZCVQG, 0xF000_0000)), 0xE32C_F20F);
    }

    #[test]
    fn hints_and_adr() {
        assert_eq!(arm(&create::nop()), 0xE320_F000);
        assert_eq!(arm(&create::hint(Opcode::Yield)), 0xE320_F001);
        assert_eq!(arm(&create::hint(Opcode::Wfi).with_cond(Cond::Eq)), 0x0320_F003);
        // adr r0, . + 8 + 16 → E28F0010
        assert_eq!(arm(&create::adr(Reg::R0, 16)), 0xE28F_0010);
    }
}
