//! Type 5 encoders: `b`, `bl` and `blx` with an immediate target.
//!
//! ```text
//! cond|101|L|imm24        b, bl
//! 1111|101|H|imm24        blx
//! ```
//!
//! The offset is measured from the read-ahead PC (the instruction address
//! plus 8) and stored shifted right by 2. `blx` switches to Thumb, so its
//! target may be halfword aligned; bit 1 of the offset goes into H.

use alloc::format;

use super::{check_range, invalid, pc_relative_offset, EncodeSite};
use crate::error::IrError;
use crate::instr::Instruction;
use crate::opcode::{Family, Opcode, OpcodeInfo, H_BIT};

/// Largest forward offset of `b`/`bl`.
pub(crate) const MAX_BRANCH_OFFSET: i64 = 0x01FF_FFFC;
/// Largest backward offset.
pub(crate) const MIN_BRANCH_OFFSET: i64 = -0x0200_0000;

/// Type 5 switch.
pub(super) fn encode_branch(
    word: u32,
    instr: &Instruction,
    info: &OpcodeInfo,
    site: &EncodeSite<'_>,
) -> Result<u32, IrError> {
    match info.family {
        Family::Branch | Family::BranchLinkExchangeImm => {
            let target = site.target_address(&instr.src(0))?;
            let offset = site.pc_offset(target);
            let fields = pack_offset(instr.opcode(), offset, site.check_reachable)?;
            Ok((word & !H_BIT) | fields)
        }
        other => unreachable!("{:?} is not a type 5 family", other),
    }
}

/// imm24 (and H for `blx`) of a branch offset.
fn pack_offset(opcode: Opcode, offset: i64, check_reachable: bool) -> Result<u32, IrError> {
    let exchange = opcode == Opcode::BlxImm;
    let align = if exchange { 2 } else { 4 };
    if offset % align != 0 {
        return Err(invalid(
            opcode,
            format!("offset {} is not a multiple of {}", offset, align),
        ));
    }
    let max = if exchange {
        MAX_BRANCH_OFFSET + 2
    } else {
        MAX_BRANCH_OFFSET
    };
    check_range(opcode, offset, MIN_BRANCH_OFFSET, max, check_reachable)?;
    let mut fields = ((offset >> 2) as u32) & 0x00FF_FFFF;
    if exchange && offset & 2 != 0 {
        fields |= H_BIT;
    }
    Ok(fields)
}

/// Signed byte offset stored in a branch word.
pub(crate) fn unpack_offset(opcode: Opcode, word: u32) -> i64 {
    let mut offset = i64::from(((word & 0x00FF_FFFF) << 8) as i32 >> 6);
    if opcode == Opcode::BlxImm && word & H_BIT != 0 {
        offset += 2;
    }
    offset
}

/// Re-aim a copied branch so that it reaches from `to` the target it
/// reached from `from`.
pub(super) fn retarget_branch_word(
    opcode: Opcode,
    word: u32,
    from: u32,
    to: u32,
    check_reachable: bool,
) -> Result<u32, IrError> {
    let target = (i64::from(from) + 8 + unpack_offset(opcode, word)) as u32;
    let fields = pack_offset(opcode, pc_relative_offset(to, target), check_reachable)?;
    let keep = if opcode == Opcode::BlxImm {
        !(0x00FF_FFFF | H_BIT)
    } else {
        !0x00FF_FFFF
    };
    Ok((word & keep) | fields)
}
