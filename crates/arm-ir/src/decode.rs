//! A32 decoding.
//!
//! Each known opcode yields a `(mask, value)` pattern from its fixed bits:
//! every bit outside the family's operand fields and the opcode's variable
//! flags is fixed. A word decodes to the matching opcode with the most fixed
//! bits, so specialised forms (`push` over `stmdb sp!`, `nop` over `msr`,
//! `vldr` over `ldc`) win over the general form they overlap.
//!
//! Operand layouts mirror the `create` constructors exactly, so that
//! decoding an encoded instruction gives back an equal instruction.

use alloc::vec::Vec;

use crate::encode::unpack_offset;
use crate::error::IrError;
use crate::instr::{Cond, InstrFlags, Instruction, ShiftType};
use crate::opcode::{
    Family, Opcode, D_BIT, M_BIT, P_BIT, R_BIT, S_BIT, U_BIT, W_BIT,
};
use crate::opnd::{BaseDisp, Operand};
use crate::reg::{Reg, RegBank};
use crate::size::{decode_rotated_imm, OpndSize};

/// `(mask, value)` recognising `op`, or `None` for pseudo opcodes.
pub(crate) fn pattern(op: Opcode) -> Option<(u32, u32)> {
    let info = op.info()?;
    let variable = (info.family.operand_mask() & !info.fixed) | op.flag_bits();
    let mut mask = 0x0FFF_FFFF & !variable;
    let mut value = ((info.ty as u32) << 25)
        | (u32::from(info.primary) << 20)
        | info.fixed
        | u32::from(info.secondary);
    if op.is_unconditional() {
        mask |= 0xF000_0000;
        value |= 0xF000_0000;
    }
    Some((mask, value & mask))
}

/// The opcode of an A32 word.
///
/// # Errors
///
/// [`IrError::Undecodable`] if no known encoding matches.
pub fn decode_opcode(word: u32) -> Result<Opcode, IrError> {
    let unconditional = word >> 28 == 0xF;
    let mut best: Option<(Opcode, u32)> = None;
    for &op in Opcode::KNOWN {
        if op.is_unconditional() != unconditional {
            continue;
        }
        let Some((mask, value)) = pattern(op) else {
            continue;
        };
        if word & mask != value {
            continue;
        }
        let weight = mask.count_ones();
        if best.map_or(true, |(_, w)| weight > w) {
            best = Some((op, weight));
        }
    }
    best.map(|(op, _)| op).ok_or(IrError::Undecodable { word })
}

/// Length of the instruction at the start of `bytes`, if it decodes.
pub fn decode_sizeof(bytes: &[u8]) -> Option<usize> {
    let word = first_word(bytes).ok()?;
    decode_opcode(word).ok().map(|_| 4)
}

/// Decode the instruction at the start of `bytes`, fetched from `pc`.
///
/// Returns the instruction with valid raw bits and its length.
///
/// # Errors
///
/// [`IrError::Truncated`] for fewer than four bytes and
/// [`IrError::Undecodable`] for words outside the supported encodings.
pub fn decode(bytes: &[u8], pc: u32) -> Result<(Instruction, usize), IrError> {
    let word = first_word(bytes)?;
    Ok((decode_word(word, pc)?, 4))
}

fn first_word(bytes: &[u8]) -> Result<u32, IrError> {
    match bytes {
        [b0, b1, b2, b3, ..] => Ok(u32::from_le_bytes([*b0, *b1, *b2, *b3])),
        _ => Err(IrError::Truncated { len: bytes.len() }),
    }
}

/// Decode one A32 word fetched from `pc`.
///
/// PC-relative branch targets become absolute [`Operand::Pc`] values;
/// literal loads keep their `[pc, #disp]` form.
pub fn decode_word(word: u32, pc: u32) -> Result<Instruction, IrError> {
    let opcode = decode_opcode(word)?;
    let undecodable = IrError::Undecodable { word };
    let cond = if opcode.is_unconditional() {
        Cond::Al
    } else {
        Cond::from_bits(word >> 28).ok_or_else(|| undecodable.clone())?
    };
    let (dsts, srcs, shift) = operands(opcode, word, pc).ok_or(undecodable)?;
    let mut instr = Instruction::build(opcode, &dsts, &srcs)
        .with_cond(cond)
        .with_flags(flags_of(opcode, word));
    instr.set_shift(shift);
    instr.set_raw_bits(&word.to_le_bytes());
    log::trace!("decoded {:#010x} at {:#x} as {}", word, pc, opcode);
    Ok(instr.with_translation(pc))
}

fn flags_of(opcode: Opcode, word: u32) -> InstrFlags {
    let table = [
        (opcode.has_p_flag(), P_BIT, InstrFlags::P),
        (opcode.has_u_flag(), U_BIT, InstrFlags::U),
        (opcode.has_d_flag(), D_BIT, InstrFlags::D),
        (opcode.has_w_flag(), W_BIT, InstrFlags::W),
        (opcode.has_s_flag(), S_BIT, InstrFlags::S),
        (opcode.has_m_flag(), M_BIT, InstrFlags::M),
        (opcode.has_r_flag(), R_BIT, InstrFlags::R),
    ];
    table
        .iter()
        .filter(|(applies, bit, _)| *applies && word & bit != 0)
        .fold(InstrFlags::empty(), |acc, (_, _, flag)| acc | *flag)
}

// ── Field extraction ─────────────────────────────────────────────────────

fn field(word: u32, lo: u32, width: u32) -> u32 {
    (word >> lo) & ((1 << width) - 1)
}

fn gpr(word: u32, lo: u32) -> Reg {
    Reg::gpr(field(word, lo, 4))
}

fn reg(word: u32, lo: u32) -> Operand {
    Operand::reg(gpr(word, lo))
}

fn creg(word: u32, lo: u32) -> Operand {
    Operand::reg(Reg::from_bank(RegBank::Coproc, field(word, lo, 4)))
}

fn imm(value: u32, size: OpndSize) -> Operand {
    Operand::immed(i64::from(value), size)
}

fn status(word: u32) -> Operand {
    Operand::reg(if word & (1 << 22) != 0 {
        Reg::Spsr
    } else {
        Reg::Cpsr
    })
}

/// VFP register from a 4-bit field and its extra bit.
///
/// Single registers put the extra bit at the bottom (`Vd:D`), doubles at
/// the top (`D:Vd`).
fn vfp_reg(word: u32, lo: u32, extra: u32, bank: RegBank) -> Operand {
    let low = field(word, lo, 4);
    let high = field(word, extra, 1);
    let index = match bank {
        RegBank::Single => (low << 1) | high,
        _ => (high << 4) | low,
    };
    Operand::reg(Reg::from_bank(bank, index))
}

/// Magnitude signed by the U bit.
fn signed(word: u32, magnitude: u32) -> i32 {
    if word & U_BIT != 0 {
        magnitude as i32
    } else {
        -(magnitude as i32)
    }
}

fn access_size(opcode: Opcode) -> OpndSize {
    opcode.access_size().unwrap_or(OpndSize::Na)
}

/// `[Rn, #±disp]` with the opcode's access size.
fn mem_imm(opcode: Opcode, word: u32, magnitude: u32) -> Operand {
    Operand::BaseDisp(BaseDisp::new(
        gpr(word, 16),
        signed(word, magnitude),
        access_size(opcode),
    ))
}

/// `[Rn, ±Rm, lsl #scale]` with the opcode's access size.
fn mem_index(opcode: Opcode, word: u32, scale: u32) -> Operand {
    Operand::BaseDisp(BaseDisp::indexed(
        gpr(word, 16),
        gpr(word, 0),
        scale,
        word & U_BIT == 0,
        access_size(opcode),
    ))
}

fn split_imm8(word: u32) -> u32 {
    (field(word, 8, 4) << 4) | field(word, 0, 4)
}

/// Loads carry `(transferred, mem)`, stores `(mem, transferred)`.
fn transfer(opcode: Opcode, regs: &[Operand], mem: Operand) -> (Vec<Operand>, Vec<Operand>) {
    if opcode.is_load() {
        (regs.to_vec(), alloc::vec![mem])
    } else {
        (alloc::vec![mem], regs.to_vec())
    }
}

type Decoded = (Vec<Operand>, Vec<Operand>, Option<ShiftType>);

fn plain(dsts: &[Operand], srcs: &[Operand]) -> Option<Decoded> {
    Some((dsts.to_vec(), srcs.to_vec(), None))
}

/// Operands of a data-processing register form: the register shift amount
/// is omitted for a plain `lsl #0`.
fn dp_reg(family: Family, word: u32) -> Decoded {
    let amount = field(word, 7, 5);
    let ty = field(word, 5, 2);
    let mut srcs = Vec::with_capacity(3);
    if family != Family::DpRegMove {
        srcs.push(reg(word, 16));
    }
    srcs.push(reg(word, 0));
    let shift = if amount == 0 && ty == 0 {
        None
    } else {
        srcs.push(imm(amount, OpndSize::UBits5));
        Some(ShiftType::from_bits(ty))
    };
    let dsts = if family == Family::DpRegTest {
        Vec::new()
    } else {
        alloc::vec![reg(word, 12)]
    };
    (dsts, srcs, shift)
}

fn dp_rsr(family: Family, word: u32) -> Decoded {
    let mut srcs = Vec::with_capacity(3);
    if family != Family::DpRsrMove {
        srcs.push(reg(word, 16));
    }
    srcs.push(reg(word, 0));
    srcs.push(reg(word, 8));
    let dsts = if family == Family::DpRsrTest {
        Vec::new()
    } else {
        alloc::vec![reg(word, 12)]
    };
    (dsts, srcs, Some(ShiftType::from_bits(field(word, 5, 2))))
}

fn dp_imm(family: Family, word: u32) -> Decoded {
    let value = Operand::immed(
        i64::from(decode_rotated_imm(word & 0xFFF)),
        OpndSize::RotImm12,
    );
    let (dsts, srcs) = match family {
        Family::DpImmMove => (alloc::vec![reg(word, 12)], alloc::vec![value]),
        Family::DpImmTest => (Vec::new(), alloc::vec![reg(word, 16), value]),
        _ => (alloc::vec![reg(word, 12)], alloc::vec![reg(word, 16), value]),
    };
    (dsts, srcs, None)
}

/// Registers `Rt` and `Rt + 1` of a dual transfer; `Rt` must be even and
/// not `lr`.
fn dual_pair(word: u32) -> Option<[Operand; 2]> {
    let rt = field(word, 12, 4);
    if rt % 2 != 0 || rt == 14 {
        return None;
    }
    Some([Operand::reg(Reg::gpr(rt)), Operand::reg(Reg::gpr(rt + 1))])
}

fn reg_list(word: u32) -> Option<Operand> {
    let list = (word & 0xFFFF) as u16;
    (list != 0).then_some(Operand::RegList(list))
}

fn coproc(word: u32) -> Operand {
    imm(field(word, 8, 4), OpndSize::UBits4)
}

fn operands(opcode: Opcode, word: u32, pc: u32) -> Option<Decoded> {
    use Opcode::*;
    let family = opcode.family()?;
    let sp = Operand::reg(Reg::SP);
    let lr = Operand::reg(Reg::LR);
    match family {
        Family::DpReg | Family::DpRegMove | Family::DpRegTest => Some(dp_reg(family, word)),
        Family::DpRsr | Family::DpRsrMove | Family::DpRsrTest => Some(dp_rsr(family, word)),
        Family::Multiply => plain(&[reg(word, 16)], &[reg(word, 0), reg(word, 8)]),
        Family::MultiplyAccumulate => plain(
            &[reg(word, 16)],
            &[reg(word, 0), reg(word, 8), reg(word, 12)],
        ),
        Family::MultiplyLong => {
            let (lo, hi) = (reg(word, 12), reg(word, 16));
            let (rn, rm) = (reg(word, 0), reg(word, 8));
            if matches!(opcode, Umlal | Smlal) {
                plain(&[lo, hi], &[lo, hi, rn, rm])
            } else {
                plain(&[lo, hi], &[rn, rm])
            }
        }
        Family::BranchExchange => {
            if opcode == BlxReg {
                plain(&[lr], &[reg(word, 0)])
            } else {
                plain(&[], &[reg(word, 0)])
            }
        }
        Family::CountLeadingZeros | Family::Reverse => plain(&[reg(word, 12)], &[reg(word, 0)]),
        Family::StatusRegRead => plain(&[reg(word, 12)], &[status(word)]),
        Family::StatusRegWriteReg => plain(
            &[status(word)],
            &[Operand::Mask(field(word, 16, 4)), reg(word, 0)],
        ),
        Family::Breakpoint => plain(
            &[],
            &[imm((field(word, 8, 12) << 4) | field(word, 0, 4), OpndSize::UBits16)],
        ),
        Family::SaturatingArith => plain(&[reg(word, 12)], &[reg(word, 0), reg(word, 16)]),
        Family::ExtraLoadStoreImm => {
            let mem = mem_imm(opcode, word, split_imm8(word));
            let (dsts, srcs) = transfer(opcode, &[reg(word, 12)], mem);
            Some((dsts, srcs, None))
        }
        Family::ExtraLoadStoreReg => {
            let mem = mem_index(opcode, word, 1);
            let (dsts, srcs) = transfer(opcode, &[reg(word, 12)], mem);
            Some((dsts, srcs, None))
        }
        Family::ExtraLoadStoreLit => {
            let mem = mem_imm(opcode, word, split_imm8(word));
            if opcode == LdrdLit {
                plain(&dual_pair(word)?, &[mem])
            } else {
                plain(&[reg(word, 12)], &[mem])
            }
        }
        Family::DualLoadStoreImm | Family::DualLoadStoreReg => {
            let mem = if family == Family::DualLoadStoreImm {
                mem_imm(opcode, word, split_imm8(word))
            } else {
                mem_index(opcode, word, 1)
            };
            let (dsts, srcs) = transfer(opcode, &dual_pair(word)?, mem);
            Some((dsts, srcs, None))
        }
        Family::LoadExclusive => plain(&[reg(word, 12)], &[Operand::MemReg(gpr(word, 16))]),
        Family::StoreExclusive => plain(
            &[reg(word, 12), Operand::MemReg(gpr(word, 16))],
            &[reg(word, 0)],
        ),
        Family::DpImm | Family::DpImmMove | Family::DpImmTest => Some(dp_imm(family, word)),
        Family::MoveWide => {
            let value = imm((field(word, 16, 4) << 12) | (word & 0xFFF), OpndSize::UBits16);
            if opcode == Movt {
                plain(&[reg(word, 12)], &[reg(word, 12), value])
            } else {
                plain(&[reg(word, 12)], &[value])
            }
        }
        Family::StatusRegWriteImm => plain(
            &[status(word)],
            &[
                Operand::Mask(field(word, 16, 4)),
                Operand::immed(i64::from(decode_rotated_imm(word & 0xFFF)), OpndSize::RotImm12),
            ],
        ),
        Family::Hint | Family::ClearExclusive => plain(&[], &[]),
        Family::AddressOfPc => plain(
            &[reg(word, 12)],
            &[Operand::immed(
                i64::from(decode_rotated_imm(word & 0xFFF)),
                OpndSize::RotImm12,
            )],
        ),
        Family::LoadStoreImm => {
            let mem = mem_imm(opcode, word, word & 0xFFF);
            let (dsts, srcs) = transfer(opcode, &[reg(word, 12)], mem);
            Some((dsts, srcs, None))
        }
        Family::LoadLiteral => plain(&[reg(word, 12)], &[mem_imm(opcode, word, word & 0xFFF)]),
        Family::PreloadImm => plain(&[], &[mem_imm(opcode, word, word & 0xFFF)]),
        Family::Barrier => plain(&[], &[imm(word & 0xF, OpndSize::UBits4)]),
        Family::LoadStoreReg => {
            let mem = mem_index(opcode, word, 1 << field(word, 7, 5));
            let (dsts, srcs) = transfer(opcode, &[reg(word, 12)], mem);
            Some((dsts, srcs, None))
        }
        Family::Extend => {
            let rotation = field(word, 10, 2) * 8;
            if rotation == 0 {
                plain(&[reg(word, 12)], &[reg(word, 0)])
            } else {
                plain(
                    &[reg(word, 12)],
                    &[reg(word, 0), imm(rotation, OpndSize::UBits5)],
                )
            }
        }
        Family::BitfieldExtract => {
            let lsb = field(word, 7, 5);
            let width = field(word, 16, 5) + 1;
            if lsb + width > 32 {
                return None;
            }
            plain(
                &[reg(word, 12)],
                &[
                    reg(word, 0),
                    imm(lsb, OpndSize::UBits5),
                    imm(width, OpndSize::UBits6),
                ],
            )
        }
        Family::BitfieldInsert | Family::BitfieldClear => {
            let lsb = field(word, 7, 5);
            let msb = field(word, 16, 5);
            if msb < lsb {
                return None;
            }
            let bounds = [
                imm(lsb, OpndSize::UBits5),
                imm(msb - lsb + 1, OpndSize::UBits6),
            ];
            let rd = reg(word, 12);
            if family == Family::BitfieldInsert {
                plain(&[rd], &[rd, reg(word, 0), bounds[0], bounds[1]])
            } else {
                plain(&[rd], &[rd, bounds[0], bounds[1]])
            }
        }
        Family::DualMultiply | Family::MostSignificantMultiply => {
            if matches!(opcode, Smlad | Smlsd | Smmla) {
                plain(
                    &[reg(word, 16)],
                    &[reg(word, 0), reg(word, 8), reg(word, 12)],
                )
            } else {
                plain(&[reg(word, 16)], &[reg(word, 0), reg(word, 8)])
            }
        }
        Family::LoadStoreMultiple => {
            let list = reg_list(word)?;
            let (dsts, srcs) = transfer(opcode, &[list], Operand::MemReg(gpr(word, 16)));
            Some((dsts, srcs, None))
        }
        Family::PushPop => {
            let list = reg_list(word)?;
            if opcode == Push {
                plain(&[sp], &[list, sp])
            } else {
                plain(&[list, sp], &[sp])
            }
        }
        Family::Branch | Family::BranchLinkExchangeImm => {
            let target = (i64::from(pc) + 8 + unpack_offset(opcode, word)) as u32;
            let target = Operand::Pc(target);
            if opcode == B {
                plain(&[], &[target])
            } else {
                plain(&[lr], &[target])
            }
        }
        Family::CoprocLoadStore => {
            if word & (P_BIT | W_BIT) == 0 {
                return None;
            }
            let mem = mem_imm(opcode, word, (word & 0xFF) * 4);
            let crd = creg(word, 12);
            if opcode == Ldc {
                plain(&[crd], &[coproc(word), mem])
            } else {
                plain(&[mem], &[coproc(word), crd])
            }
        }
        Family::CoprocTwoReg => {
            let opc1 = imm(field(word, 4, 4), OpndSize::UBits4);
            let (rt, rt2, crm) = (reg(word, 12), reg(word, 16), creg(word, 0));
            if opcode == Mcrr {
                plain(&[crm], &[coproc(word), opc1, rt, rt2])
            } else {
                plain(&[rt, rt2], &[coproc(word), opc1, crm])
            }
        }
        Family::VfpLoadStore => {
            let bank = vfp_bank(opcode);
            let mem = mem_imm(opcode, word, (word & 0xFF) * 4);
            let (dsts, srcs) = transfer(opcode, &[vfp_reg(word, 12, 22, bank)], mem);
            Some((dsts, srcs, None))
        }
        Family::SupervisorCall => plain(&[], &[imm(word & 0x00FF_FFFF, OpndSize::UBits24)]),
        Family::CoprocDataOp => plain(
            &[creg(word, 12)],
            &[
                coproc(word),
                imm(field(word, 20, 4), OpndSize::UBits4),
                creg(word, 16),
                creg(word, 0),
                imm(field(word, 5, 3), OpndSize::UBits3),
            ],
        ),
        Family::CoprocRegTransfer => {
            let opc1 = imm(field(word, 21, 3), OpndSize::UBits3);
            let opc2 = imm(field(word, 5, 3), OpndSize::UBits3);
            if opcode == Mcr {
                plain(
                    &[creg(word, 16)],
                    &[coproc(word), opc1, reg(word, 12), creg(word, 0), opc2],
                )
            } else {
                plain(
                    &[reg(word, 12)],
                    &[coproc(word), opc1, creg(word, 16), creg(word, 0), opc2],
                )
            }
        }
        Family::VfpDataOp => {
            let bank = vfp_bank(opcode);
            plain(
                &[vfp_reg(word, 12, 22, bank)],
                &[vfp_reg(word, 16, 7, bank), vfp_reg(word, 0, 5, bank)],
            )
        }
        Family::VfpCoreTransfer => {
            let sn = vfp_reg(word, 16, 7, RegBank::Single);
            if opcode == VmovSr {
                plain(&[sn], &[reg(word, 12)])
            } else {
                plain(&[reg(word, 12)], &[sn])
            }
        }
        Family::VfpStatusTransfer => {
            let fpscr = Operand::reg(Reg::Fpscr);
            if opcode == Vmrs {
                plain(&[reg(word, 12)], &[fpscr])
            } else {
                plain(&[fpscr], &[reg(word, 12)])
            }
        }
    }
}

/// Register bank of a VFP opcode: bit 8 of the fixed bits selects doubles.
fn vfp_bank(opcode: Opcode) -> RegBank {
    match opcode.info() {
        Some(info) if info.fixed & (1 << 8) != 0 => RegBank::Double,
        _ => RegBank::Single,
    }
}
