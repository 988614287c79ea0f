//! Type 6 and type 7 encoders: coprocessor transfers and data operations,
//! VFP loads, stores and arithmetic, and `svc`.

use super::common::{creg_at, gpr_at, imm_of, mem_operand, mem_parts, reg_of, vfp_reg_at, VfpField};
use super::EncodeSite;
use crate::error::IrError;
use crate::instr::Instruction;
use crate::opcode::{Family, Opcode, OpcodeInfo};
use crate::opnd::Operand;

/// Type 6 switch.
pub(super) fn encode_coprocessor_data_movement(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    _site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    match info.family {
        // cond|110|P|U|D|W|L|Rn|CRd|coproc|imm8
        Family::CoprocLoadStore => {
            let crd = if instr.opcode().is_load() {
                instr.dst(0)
            } else {
                instr.src(1)
            };
            Ok(word
                | creg_at(&crd, 12)
                | coproc_field(&instr.src(0))
                | memory_imm8x4(instr))
        }
        // cond|1100010|L|Rt2|Rt|coproc|opc1|CRm
        Family::CoprocTwoReg => {
            let srcs = instr.srcs();
            let (rt, rt2, crm) = if to_core(instr.opcode()) {
                (instr.dst(0), instr.dst(1), srcs[2])
            } else {
                (srcs[2], srcs[3], instr.dst(0))
            };
            Ok(word
                | gpr_at(&rt2, 16)
                | gpr_at(&rt, 12)
                | coproc_field(&srcs[0])
                | ((imm_of(&srcs[1]) as u32 & 0xF) << 4)
                | creg_at(&crm, 0))
        }
        // cond|1101|U|D|0|L|Rn|Vd|101|sz|imm8
        Family::VfpLoadStore => {
            let vd = if instr.opcode().is_load() {
                instr.dst(0)
            } else {
                instr.src(0)
            };
            Ok(word | vfp_reg_at(reg_of(&vd), VfpField::D) | memory_imm8x4(instr))
        }
        other => unreachable!("{:?} is not a type 6 family", other),
    }
}

/// Type 7 switch.
pub(super) fn encode_advanced_coprocessor_and_syscall(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    _site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    let srcs = instr.srcs();
    match info.family {
        // cond|1111|imm24
        Family::SupervisorCall => Ok(word | (imm_of(&srcs[0]) as u32 & 0x00FF_FFFF)),
        // cond|1110|opc1|CRn|CRd|coproc|opc2|0|CRm
        Family::CoprocDataOp => Ok(word
            | ((imm_of(&srcs[1]) as u32 & 0xF) << 20)
            | creg_at(&srcs[2], 16)
            | creg_at(&instr.dst(0), 12)
            | coproc_field(&srcs[0])
            | ((imm_of(&srcs[4]) as u32 & 0x7) << 5)
            | creg_at(&srcs[3], 0)),
        // cond|1110|opc1|L|CRn|Rt|coproc|opc2|1|CRm
        Family::CoprocRegTransfer => {
            let (crn, rt) = if to_core(instr.opcode()) {
                (srcs[2], instr.dst(0))
            } else {
                (instr.dst(0), srcs[2])
            };
            Ok(word
                | ((imm_of(&srcs[1]) as u32 & 0x7) << 21)
                | creg_at(&crn, 16)
                | gpr_at(&rt, 12)
                | coproc_field(&srcs[0])
                | ((imm_of(&srcs[4]) as u32 & 0x7) << 5)
                | creg_at(&srcs[3], 0))
        }
        // cond|11100|D|op|Vn|Vd|101|sz|N|op|M|0|Vm
        Family::VfpDataOp => Ok(word
            | vfp_reg_at(reg_of(&instr.dst(0)), VfpField::D)
            | vfp_reg_at(reg_of(&srcs[0]), VfpField::N)
            | vfp_reg_at(reg_of(&srcs[1]), VfpField::M)),
        // cond|1110000|op|Vn|Rt|1010|N|0010000
        Family::VfpCoreTransfer => {
            let (sn, rt) = if to_core(instr.opcode()) {
                (srcs[0], instr.dst(0))
            } else {
                (instr.dst(0), srcs[0])
            };
            Ok(word | vfp_reg_at(reg_of(&sn), VfpField::N) | gpr_at(&rt, 12))
        }
        // cond|1110111|L|0001|Rt|1010|0001|0000
        Family::VfpStatusTransfer => {
            let rt = if to_core(instr.opcode()) {
                instr.dst(0)
            } else {
                srcs[0]
            };
            Ok(word | gpr_at(&rt, 12))
        }
        other => unreachable!("{:?} is not a type 7 family", other),
    }
}

/// Transfers into core registers (the L bit set).
fn to_core(opcode: Opcode) -> bool {
    matches!(opcode, Opcode::Mrrc | Opcode::Mrc | Opcode::VmovRs | Opcode::Vmrs)
}

/// Coprocessor number at 11..8.
fn coproc_field(op: &Operand) -> u32 {
    (imm_of(op) as u32 & 0xF) << 8
}

/// `Rn` and the word-scaled 8-bit offset of a coprocessor or VFP transfer.
fn memory_imm8x4(instr: &Instruction) -> u32 {
    let parts = match mem_parts(mem_operand(instr)) {
        Some(parts) => parts,
        None => unreachable!("{} has no register-based memory operand", instr.opcode()),
    };
    (parts.base.gpr_number() << 16) | ((parts.magnitude() / 4) & 0xFF)
}
