//! Load/store encoders (types 2 and 3, plus the extra and dual forms that
//! live in type 0) and the type 3 media instructions.

use alloc::format;

use super::common::{gpr_at, imm_of, mem_operand, mem_parts, reg_of, MemParts};
use super::{check_range, invalid, pc_relative_offset, EncodeSite};
use crate::error::IrError;
use crate::instr::Instruction;
use crate::opcode::{Family, Opcode, OpcodeInfo, U_BIT};
use crate::opnd::Operand;
use crate::reg::Reg;

/// Type 2 switch.
pub(super) fn encode_load_store_1(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    match info.family {
        Family::LoadStoreImm => {
            let parts = parts_of(instr);
            Ok(word | transfer_reg(instr) | base_bits(&parts) | (parts.magnitude() & 0xFFF))
        }
        Family::LoadLiteral => {
            let (up, magnitude) = literal_fields(instr, site, 0xFFF)?;
            Ok(with_up(word, up) | gpr_at(&instr.dst(0), 12) | magnitude)
        }
        Family::PreloadImm => {
            let parts = parts_of(instr);
            Ok(word | base_bits(&parts) | (parts.magnitude() & 0xFFF))
        }
        Family::Barrier => Ok(word | (imm_of(&instr.src(0)) as u32 & 0xF)),
        Family::ClearExclusive => Ok(word),
        other => unreachable!("{:?} is not a type 2 family", other),
    }
}

/// Type 3 switch.
pub(super) fn encode_load_store_2_and_media(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    _site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    match info.family {
        Family::LoadStoreReg => {
            // cond|011|P|U|B|W|L|Rn|Rt|imm5|00|0|Rm
            let parts = parts_of(instr);
            Ok(word
                | transfer_reg(instr)
                | base_bits(&parts)
                | (parts.shift << 7)
                | parts.index.gpr_number())
        }
        Family::Extend => encode_extend(word, instr),
        Family::Reverse => Ok(word | gpr_at(&instr.dst(0), 12) | gpr_at(&instr.src(0), 0)),
        Family::BitfieldExtract | Family::BitfieldInsert | Family::BitfieldClear => {
            encode_bitfield(word, instr, info.family)
        }
        Family::DualMultiply | Family::MostSignificantMultiply => {
            // cond|01110|op1|Rd|Ra|Rm|op2|1|Rn
            let srcs = instr.srcs();
            let mut word =
                word | gpr_at(&instr.dst(0), 16) | gpr_at(&srcs[0], 0) | gpr_at(&srcs[1], 8);
            if let Some(ra) = srcs.get(2) {
                word |= gpr_at(ra, 12);
            }
            Ok(word)
        }
        other => unreachable!("{:?} is not a type 3 family", other),
    }
}

// ── Operand helpers ──────────────────────────────────────────────────────

fn parts_of(instr: &Instruction) -> MemParts {
    match mem_parts(mem_operand(instr)) {
        Some(parts) => parts,
        None => unreachable!("{} has no register-based memory operand", instr.opcode()),
    }
}

fn base_bits(parts: &MemParts) -> u32 {
    parts.base.gpr_number() << 16
}

/// `Rt` at 15..12: the destination of a load, the source of a store.
fn transfer_reg(instr: &Instruction) -> u32 {
    let rt = if instr.opcode().is_store() {
        instr.src(0)
    } else {
        instr.dst(0)
    };
    gpr_at(&rt, 12)
}

/// Split 8-bit offset of the extra load/store forms.
fn split_imm8(magnitude: u32) -> u32 {
    (((magnitude >> 4) & 0xF) << 8) | (magnitude & 0xF)
}

fn with_up(word: u32, up: Option<bool>) -> u32 {
    match up {
        Some(true) => word | U_BIT,
        Some(false) => word & !U_BIT,
        None => word,
    }
}

/// Direction and magnitude of a literal load's offset.
///
/// `[pc, #disp]` keeps the U flag the instruction carries. An
/// instruction-relative literal is resolved against the encode site and
/// overrides U with the sign of the final offset.
fn literal_fields(
    instr: &Instruction,
    site: &EncodeSite<'_>,
    max: u32,
) -> Result<(Option<bool>, u32), IrError> {
    let op = instr.src(0);
    match op {
        Operand::MemInstr { .. } => {
            let offset = site.pc_offset(site.target_address(&op)?);
            let limit = i64::from(max);
            check_range(instr.opcode(), offset, -limit, limit, site.check_reachable)?;
            Ok((Some(offset >= 0), offset.unsigned_abs() as u32 & max))
        }
        _ => Ok((None, op.disp().unsigned_abs() & max)),
    }
}

/// Even-numbered first register of a doubleword transfer, and its
/// consecutive partner.
fn dual_pair(instr: &Instruction) -> Result<u32, IrError> {
    let (first, second) = if instr.opcode().is_store() {
        (instr.src(0), instr.src(1))
    } else {
        (instr.dst(0), instr.dst(1))
    };
    let (rt, rt2) = (reg_of(&first), reg_of(&second));
    let n = rt.gpr_number();
    if n % 2 != 0 || rt == Reg::LR {
        return Err(invalid(
            instr.opcode(),
            format!("first register {} must be even and not lr", rt),
        ));
    }
    if rt2.gpr_number() != n + 1 {
        return Err(invalid(
            instr.opcode(),
            format!("second register {} must follow {}", rt2, rt),
        ));
    }
    Ok(n << 12)
}

// ── Extra and dual load/store ────────────────────────────────────────────

/// ```text
/// cond|000|P|U|1|W|L|Rn|Rt|imm4H|1|op2|1|imm4L
/// cond|000|P|U|0|W|L|Rn|Rt|0000|1|op2|1|Rm
/// ```
pub(super) fn encode_extra_load_store(
    word: u32,
    instr: &Instruction,
    family: Family,
) -> Result<u32, IrError> {
    let parts = parts_of(instr);
    let offset = match family {
        Family::ExtraLoadStoreReg => parts.index.gpr_number(),
        _ => split_imm8(parts.magnitude()),
    };
    Ok(word | transfer_reg(instr) | base_bits(&parts) | offset)
}

/// `ldrd`/`strd`; same layouts as [`encode_extra_load_store`] with an
/// implied second register.
pub(super) fn encode_dual_load_store(
    word: u32,
    instr: &Instruction,
    family: Family,
) -> Result<u32, IrError> {
    let rt = dual_pair(instr)?;
    let parts = parts_of(instr);
    let offset = match family {
        Family::DualLoadStoreReg => parts.index.gpr_number(),
        _ => split_imm8(parts.magnitude()),
    };
    Ok(word | rt | base_bits(&parts) | offset)
}

/// ```text
/// cond|0001|U|1|0|L|1111|Rt|imm4H|1|op2|1|imm4L
/// ```
pub(super) fn encode_extra_literal(
    word: u32,
    instr: &Instruction,
    site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    let rt = if instr.opcode() == Opcode::LdrdLit {
        dual_pair(instr)?
    } else {
        gpr_at(&instr.dst(0), 12)
    };
    let (up, magnitude) = literal_fields(instr, site, 0xFF)?;
    Ok(with_up(word, up) | rt | split_imm8(magnitude))
}

/// Re-aim a copied literal load so that it reads the same address from `to`
/// that it read from `from`.
///
/// `ldr`/`ldrb` hold a 12-bit offset in bits 11..0; the extra loads split an
/// 8-bit offset across bits 11..8 and 3..0.
pub(super) fn retarget_literal_word(
    opcode: Opcode,
    word: u32,
    from: u32,
    to: u32,
    check_reachable: bool,
) -> Result<u32, IrError> {
    let split = opcode.family() == Some(Family::ExtraLoadStoreLit);
    let (field, max) = if split { (0xF0F, 0xFF) } else { (0xFFF, 0xFFF) };
    let magnitude = if split {
        ((word >> 4) & 0xF0) | (word & 0xF)
    } else {
        word & 0xFFF
    };
    let offset = if word & U_BIT != 0 {
        i64::from(magnitude)
    } else {
        -i64::from(magnitude)
    };
    let target = (i64::from(from) + 8 + offset) as u32;
    let moved = pc_relative_offset(to, target);
    check_range(opcode, moved, -i64::from(max), i64::from(max), check_reachable)?;
    let up = if moved >= 0 { U_BIT } else { 0 };
    let magnitude = moved.unsigned_abs() as u32 & max;
    let packed = if split { split_imm8(magnitude) } else { magnitude };
    Ok((word & !(U_BIT | field)) | up | packed)
}

// ── Media ────────────────────────────────────────────────────────────────

/// ```text
/// cond|01101|U|1|1|1111|Rd|rot|00|0111|Rm
/// ```
fn encode_extend(word: u32, instr: &Instruction) -> Result<u32, IrError> {
    let srcs = instr.srcs();
    let rotation = srcs.get(1).map_or(0, |op| imm_of(op) as u32);
    if rotation % 8 != 0 || rotation > 24 {
        return Err(invalid(
            instr.opcode(),
            format!("rotation {} is not 0, 8, 16 or 24", rotation),
        ));
    }
    Ok(word | gpr_at(&instr.dst(0), 12) | ((rotation / 8) << 10) | gpr_at(&srcs[0], 0))
}

/// ```text
/// cond|0111101|widthm1|Rd|lsb|101|Rn      sbfx/ubfx
/// cond|0111110|msb|Rd|lsb|001|Rn          bfi/bfc (bfc: Rn = 1111)
/// ```
fn encode_bitfield(word: u32, instr: &Instruction, family: Family) -> Result<u32, IrError> {
    let srcs = instr.srcs();
    let (rn, lsb, width) = match family {
        Family::BitfieldExtract => (Some(&srcs[0]), &srcs[1], &srcs[2]),
        Family::BitfieldInsert => (Some(&srcs[1]), &srcs[2], &srcs[3]),
        _ => (None, &srcs[1], &srcs[2]),
    };
    let (lsb, width) = (imm_of(lsb) as u32, imm_of(width) as u32);
    if width == 0 || lsb + width > 32 {
        return Err(invalid(
            instr.opcode(),
            format!("field of width {} at bit {} does not fit a word", width, lsb),
        ));
    }
    let high = match family {
        Family::BitfieldExtract => width - 1,
        _ => lsb + width - 1,
    };
    let mut word = word | (high << 16) | gpr_at(&instr.dst(0), 12) | (lsb << 7);
    if let Some(rn) = rn {
        word |= gpr_at(rn, 0);
    }
    Ok(word)
}
