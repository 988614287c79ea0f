//! Typed instruction constructors.
//!
//! Every constructor returns an unconditional (`al`) instruction whose
//! operand layout is the one the encoder's template table expects. Adjust the
//! condition and the encoding flags with [`Instruction::with_cond`] and
//! [`Instruction::with_flags`]:
//!
//! ```
//! use arm_ir::{create, Cond, InstrFlags, Opcode, Reg};
//!
//! let subs = create::dp_reg(Opcode::SubReg, Reg::R3, Reg::R4, Reg::R5)
//!     .with_flags(InstrFlags::S)
//!     .with_cond(Cond::Ne);
//! assert_eq!(subs.cond(), Cond::Ne);
//! ```
//!
//! Constructors that take a displacement set the `U` flag from its sign and
//! derive `P`/`W` from an [`AddrMode`].

use crate::instr::{AddrMode, InstrFlags, Instruction, ShiftType};
use crate::instrlist::InstrId;
use crate::opcode::Opcode;
use crate::opnd::{BaseDisp, Operand};
use crate::reg::{Reg, RegBank};
use crate::size::OpndSize;

fn r(reg: Reg) -> Operand {
    Operand::reg(reg)
}

fn uimm(value: u32, size: OpndSize) -> Operand {
    Operand::immed(i64::from(value), size)
}

fn up_if(nonnegative: bool) -> InstrFlags {
    if nonnegative {
        InstrFlags::U
    } else {
        InstrFlags::empty()
    }
}

fn access_size(op: Opcode) -> OpndSize {
    op.access_size().unwrap_or(OpndSize::Na)
}

/// The register after `rt` in a dual transfer, or [`Reg::Null`] past `pc`.
fn next_gpr(rt: Reg) -> Reg {
    match rt.gpr_number() {
        n if n < 15 => Reg::gpr(n + 1),
        _ => Reg::Null,
    }
}

fn transfer(op: Opcode, regs: &[Operand], mem: Operand) -> Instruction {
    if op.is_load() {
        Instruction::build(op, regs, &[mem])
    } else {
        Instruction::build(op, &[mem], regs)
    }
}

fn with_shift(mut instr: Instruction, shift: ShiftType) -> Instruction {
    instr.set_shift(Some(shift));
    instr
}

// ── Pseudo instructions and hints ───────────────────────────────────────

/// A zero-length branch target.
pub fn label() -> Instruction {
    Instruction::label()
}

pub fn nop() -> Instruction {
    hint(Opcode::Nop)
}

/// `nop`, `yield`, `wfe`, `wfi` or `sev`.
pub fn hint(op: Opcode) -> Instruction {
    Instruction::build(op, &[], &[])
}

// ── Data processing ─────────────────────────────────────────────────────

/// `op rd, rn, rm`.
pub fn dp_reg(op: Opcode, rd: Reg, rn: Reg, rm: Reg) -> Instruction {
    Instruction::build(op, &[r(rd)], &[r(rn), r(rm)])
}

/// `op rd, rm` for `mov` and `mvn`.
pub fn dp_move_reg(op: Opcode, rd: Reg, rm: Reg) -> Instruction {
    Instruction::build(op, &[r(rd)], &[r(rm)])
}

/// `op rn, rm` for `tst`, `teq`, `cmp` and `cmn`.
pub fn dp_test_reg(op: Opcode, rn: Reg, rm: Reg) -> Instruction {
    Instruction::build(op, &[], &[r(rn), r(rm)])
}

/// `op rd, rn, rm, <shift> #amount`.
pub fn dp_reg_shifted(
    op: Opcode,
    rd: Reg,
    rn: Reg,
    rm: Reg,
    shift: ShiftType,
    amount: u32,
) -> Instruction {
    let instr = Instruction::build(
        op,
        &[r(rd)],
        &[r(rn), r(rm), uimm(amount, OpndSize::UBits5)],
    );
    with_shift(instr, shift)
}

/// `op rd, rm, <shift> #amount`.
pub fn dp_move_shifted(op: Opcode, rd: Reg, rm: Reg, shift: ShiftType, amount: u32) -> Instruction {
    let instr = Instruction::build(op, &[r(rd)], &[r(rm), uimm(amount, OpndSize::UBits5)]);
    with_shift(instr, shift)
}

/// `op rn, rm, <shift> #amount`.
pub fn dp_test_shifted(op: Opcode, rn: Reg, rm: Reg, shift: ShiftType, amount: u32) -> Instruction {
    let instr = Instruction::build(op, &[], &[r(rn), r(rm), uimm(amount, OpndSize::UBits5)]);
    with_shift(instr, shift)
}

/// `op rd, rn, rm, <shift> rs`.
pub fn dp_rsr(op: Opcode, rd: Reg, rn: Reg, rm: Reg, shift: ShiftType, rs: Reg) -> Instruction {
    with_shift(Instruction::build(op, &[r(rd)], &[r(rn), r(rm), r(rs)]), shift)
}

/// `op rd, rm, <shift> rs`.
pub fn dp_rsr_move(op: Opcode, rd: Reg, rm: Reg, shift: ShiftType, rs: Reg) -> Instruction {
    with_shift(Instruction::build(op, &[r(rd)], &[r(rm), r(rs)]), shift)
}

/// `op rn, rm, <shift> rs`.
pub fn dp_rsr_test(op: Opcode, rn: Reg, rm: Reg, shift: ShiftType, rs: Reg) -> Instruction {
    with_shift(Instruction::build(op, &[], &[r(rn), r(rm), r(rs)]), shift)
}

/// `op rd, rn, #value`. The value must be an 8-bit constant rotated right by
/// an even amount.
pub fn dp_imm(op: Opcode, rd: Reg, rn: Reg, value: i64) -> Instruction {
    Instruction::build(
        op,
        &[r(rd)],
        &[r(rn), Operand::immed(value, OpndSize::RotImm12)],
    )
}

/// `op rd, #value`.
pub fn dp_move_imm(op: Opcode, rd: Reg, value: i64) -> Instruction {
    Instruction::build(op, &[r(rd)], &[Operand::immed(value, OpndSize::RotImm12)])
}

/// `op rn, #value`.
pub fn dp_test_imm(op: Opcode, rn: Reg, value: i64) -> Instruction {
    Instruction::build(op, &[], &[r(rn), Operand::immed(value, OpndSize::RotImm12)])
}

/// `movw rd, #imm16`.
pub fn movw(rd: Reg, value: u32) -> Instruction {
    Instruction::build(Opcode::Movw, &[r(rd)], &[uimm(value, OpndSize::UBits16)])
}

/// `movt rd, #imm16`. The low half of `rd` is read and kept.
pub fn movt(rd: Reg, value: u32) -> Instruction {
    Instruction::build(
        Opcode::Movt,
        &[r(rd)],
        &[r(rd), uimm(value, OpndSize::UBits16)],
    )
}

/// `adr rd, #offset`, the read-ahead PC plus `offset`.
pub fn adr(rd: Reg, offset: i64) -> Instruction {
    Instruction::build(Opcode::Adr, &[r(rd)], &[Operand::immed(offset, OpndSize::RotImm12)])
}

// ── Multiplies ──────────────────────────────────────────────────────────

pub fn mul(rd: Reg, rn: Reg, rm: Reg) -> Instruction {
    Instruction::build(Opcode::Mul, &[r(rd)], &[r(rn), r(rm)])
}

/// `mla` or `mls`: `rd = ra ± rn * rm`.
pub fn mla(op: Opcode, rd: Reg, rn: Reg, rm: Reg, ra: Reg) -> Instruction {
    Instruction::build(op, &[r(rd)], &[r(rn), r(rm), r(ra)])
}

/// `umull`/`smull lo, hi, rn, rm`.
pub fn mul_long(op: Opcode, lo: Reg, hi: Reg, rn: Reg, rm: Reg) -> Instruction {
    Instruction::build(op, &[r(lo), r(hi)], &[r(rn), r(rm)])
}

/// `umlal`/`smlal lo, hi, rn, rm`; the accumulator pair is read too.
pub fn mul_long_acc(op: Opcode, lo: Reg, hi: Reg, rn: Reg, rm: Reg) -> Instruction {
    Instruction::build(op, &[r(lo), r(hi)], &[r(lo), r(hi), r(rn), r(rm)])
}

// ── Miscellaneous ───────────────────────────────────────────────────────

pub fn bx(rm: Reg) -> Instruction {
    Instruction::build(Opcode::Bx, &[], &[r(rm)])
}

pub fn blx_reg(rm: Reg) -> Instruction {
    Instruction::build(Opcode::BlxReg, &[r(Reg::LR)], &[r(rm)])
}

pub fn clz(rd: Reg, rm: Reg) -> Instruction {
    Instruction::build(Opcode::Clz, &[r(rd)], &[r(rm)])
}

pub fn bkpt(imm: u32) -> Instruction {
    Instruction::build(Opcode::Bkpt, &[], &[uimm(imm, OpndSize::UBits16)])
}

/// `qadd`, `qsub`, `qdadd` or `qdsub rd, rm, rn`.
pub fn saturating(op: Opcode, rd: Reg, rm: Reg, rn: Reg) -> Instruction {
    Instruction::build(op, &[r(rd)], &[r(rm), r(rn)])
}

/// `mrs rd, cpsr|spsr`.
pub fn mrs(rd: Reg, status: Reg) -> Instruction {
    Instruction::build(Opcode::Mrs, &[r(rd)], &[r(status)])
}

/// `msr cpsr|spsr_<mask>, rn`. See [`MASK_NZCVQ`](crate::opnd::MASK_NZCVQ)
/// for the application-level masks.
pub fn msr_reg(status: Reg, mask: u32, rn: Reg) -> Instruction {
    Instruction::build(Opcode::MsrReg, &[r(status)], &[Operand::Mask(mask), r(rn)])
}

/// `msr cpsr|spsr_<mask>, #value`.
pub fn msr_imm(status: Reg, mask: u32, value: i64) -> Instruction {
    Instruction::build(
        Opcode::MsrImm,
        &[r(status)],
        &[Operand::Mask(mask), Operand::immed(value, OpndSize::RotImm12)],
    )
}

// ── Loads and stores ────────────────────────────────────────────────────

/// Single load or store with an immediate offset:
/// `ldr rt, [base, #disp]`, `[base, #disp]!` or `[base], #disp`.
///
/// Covers the word/byte forms and the halfword/signed-byte forms.
pub fn load_store_imm(op: Opcode, rt: Reg, base: Reg, disp: i32, mode: AddrMode) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::new(base, disp, access_size(op)));
    transfer(op, &[r(rt)], mem).with_flags(mode.flags() | up_if(disp >= 0))
}

/// Single load or store with a register offset:
/// `ldr rt, [base, ±index, lsl #log2(scale)]`.
///
/// Halfword and signed-byte forms take no shift; pass a scale of 1.
pub fn load_store_reg(
    op: Opcode,
    rt: Reg,
    base: Reg,
    index: Reg,
    scale: u32,
    subtract: bool,
    mode: AddrMode,
) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::indexed(base, index, scale, subtract, access_size(op)));
    transfer(op, &[r(rt)], mem).with_flags(mode.flags() | up_if(!subtract))
}

/// `ldrd`/`strd rt, rt+1, [base, #disp]`.
pub fn load_store_dual_imm(
    op: Opcode,
    rt: Reg,
    base: Reg,
    disp: i32,
    mode: AddrMode,
) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::new(base, disp, access_size(op)));
    transfer(op, &[r(rt), r(next_gpr(rt))], mem).with_flags(mode.flags() | up_if(disp >= 0))
}

/// `ldrd`/`strd rt, rt+1, [base, ±index]`.
pub fn load_store_dual_reg(
    op: Opcode,
    rt: Reg,
    base: Reg,
    index: Reg,
    subtract: bool,
    mode: AddrMode,
) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::indexed(base, index, 1, subtract, access_size(op)));
    transfer(op, &[r(rt), r(next_gpr(rt))], mem).with_flags(mode.flags() | up_if(!subtract))
}

pub fn ldrex(rt: Reg, base: Reg) -> Instruction {
    Instruction::build(Opcode::Ldrex, &[r(rt)], &[Operand::MemReg(base)])
}

/// `strex rd, rt, [base]`; `rd` receives the status.
pub fn strex(rd: Reg, rt: Reg, base: Reg) -> Instruction {
    Instruction::build(Opcode::Strex, &[r(rd), Operand::MemReg(base)], &[r(rt)])
}

/// PC-relative literal load `ldr rt, [pc, #disp]`.
///
/// `ldrd` loads `rt` and the register after it.
pub fn load_literal(op: Opcode, rt: Reg, disp: i32) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::new(Reg::PC, disp, access_size(op)));
    literal(op, rt, mem).with_flags(up_if(disp >= 0))
}

/// Literal load of the data `disp` bytes past instruction `anchor` of the
/// same list. The offset is computed when the list is encoded.
pub fn load_literal_at(op: Opcode, rt: Reg, anchor: InstrId, disp: i32) -> Instruction {
    let mem = Operand::MemInstr {
        instr: anchor,
        disp,
        size: access_size(op),
    };
    literal(op, rt, mem)
}

fn literal(op: Opcode, rt: Reg, mem: Operand) -> Instruction {
    if op == Opcode::LdrdLit {
        Instruction::build(op, &[r(rt), r(next_gpr(rt))], &[mem])
    } else {
        Instruction::build(op, &[r(rt)], &[mem])
    }
}

/// `pld [base, #disp]`.
pub fn pld(base: Reg, disp: i32) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::new(base, disp, OpndSize::Bytes1));
    Instruction::build(Opcode::Pld, &[], &[mem]).with_flags(up_if(disp >= 0))
}

/// `dmb <option>`; `0xF` is `sy`.
pub fn dmb(option: u32) -> Instruction {
    barrier(Opcode::Dmb, option)
}

/// `dmb`, `dsb` or `isb` with a 4-bit option.
pub fn barrier(op: Opcode, option: u32) -> Instruction {
    Instruction::build(op, &[], &[uimm(option, OpndSize::UBits4)])
}

pub fn clrex() -> Instruction {
    Instruction::build(Opcode::Clrex, &[], &[])
}

// ── Media ───────────────────────────────────────────────────────────────

/// `sxtb`, `sxth`, `uxtb` or `uxth rd, rm, ror #rotation`. A zero rotation
/// is omitted.
pub fn extend(op: Opcode, rd: Reg, rm: Reg, rotation: u32) -> Instruction {
    if rotation == 0 {
        Instruction::build(op, &[r(rd)], &[r(rm)])
    } else {
        Instruction::build(op, &[r(rd)], &[r(rm), uimm(rotation, OpndSize::UBits5)])
    }
}

/// `rev`, `rev16`, `rbit` or `revsh rd, rm`.
pub fn reverse(op: Opcode, rd: Reg, rm: Reg) -> Instruction {
    Instruction::build(op, &[r(rd)], &[r(rm)])
}

/// `sbfx`/`ubfx rd, rn, #lsb, #width`.
pub fn bitfield_extract(op: Opcode, rd: Reg, rn: Reg, lsb: u32, width: u32) -> Instruction {
    Instruction::build(
        op,
        &[r(rd)],
        &[r(rn), uimm(lsb, OpndSize::UBits5), uimm(width, OpndSize::UBits6)],
    )
}

/// `bfi rd, rn, #lsb, #width`.
pub fn bfi(rd: Reg, rn: Reg, lsb: u32, width: u32) -> Instruction {
    Instruction::build(
        Opcode::Bfi,
        &[r(rd)],
        &[
            r(rd),
            r(rn),
            uimm(lsb, OpndSize::UBits5),
            uimm(width, OpndSize::UBits6),
        ],
    )
}

/// `bfc rd, #lsb, #width`.
pub fn bfc(rd: Reg, lsb: u32, width: u32) -> Instruction {
    Instruction::build(
        Opcode::Bfc,
        &[r(rd)],
        &[r(rd), uimm(lsb, OpndSize::UBits5), uimm(width, OpndSize::UBits6)],
    )
}

/// `smuad`, `smusd` or `smmul rd, rn, rm`.
pub fn media_mul(op: Opcode, rd: Reg, rn: Reg, rm: Reg) -> Instruction {
    Instruction::build(op, &[r(rd)], &[r(rn), r(rm)])
}

/// `smlad`, `smlsd` or `smmla rd, rn, rm, ra`.
pub fn media_mul_acc(op: Opcode, rd: Reg, rn: Reg, rm: Reg, ra: Reg) -> Instruction {
    Instruction::build(op, &[r(rd)], &[r(rn), r(rm), r(ra)])
}

// ── Block transfers ─────────────────────────────────────────────────────

pub fn push(regs: &[Reg]) -> Instruction {
    let sp = r(Reg::SP);
    Instruction::build(Opcode::Push, &[sp], &[Operand::reg_list(regs), sp])
}

pub fn pop(regs: &[Reg]) -> Instruction {
    let sp = r(Reg::SP);
    Instruction::build(Opcode::Pop, &[Operand::reg_list(regs), sp], &[sp])
}

/// `ldm`, `ldmda`, `ldmdb` or `ldmib base, {regs}`. Add
/// [`InstrFlags::W`] for writeback.
pub fn load_multiple(op: Opcode, base: Reg, regs: &[Reg]) -> Instruction {
    Instruction::build(op, &[Operand::reg_list(regs)], &[Operand::MemReg(base)])
}

/// `stm`, `stmda`, `stmdb` or `stmib base, {regs}`.
pub fn store_multiple(op: Opcode, base: Reg, regs: &[Reg]) -> Instruction {
    Instruction::build(op, &[Operand::MemReg(base)], &[Operand::reg_list(regs)])
}

// ── Branches ────────────────────────────────────────────────────────────

/// `b target`, where the target is an [`Operand::Pc`] address or an
/// [`Operand::Instr`] in the same list.
pub fn b(target: Operand) -> Instruction {
    Instruction::build(Opcode::B, &[], &[target])
}

pub fn bl(target: Operand) -> Instruction {
    Instruction::build(Opcode::Bl, &[r(Reg::LR)], &[target])
}

/// `blx target`, switching to Thumb; the target may be halfword aligned.
pub fn blx_imm(target: Operand) -> Instruction {
    Instruction::build(Opcode::BlxImm, &[r(Reg::LR)], &[target])
}

// ── Coprocessor ─────────────────────────────────────────────────────────

fn coproc_num(coproc: u32) -> Operand {
    uimm(coproc, OpndSize::UBits4)
}

/// Coprocessor addressing: post-indexed transfers set only `W`.
fn coproc_mode(mode: AddrMode, disp: i32) -> InstrFlags {
    let index = match mode {
        AddrMode::PostIndex => InstrFlags::W,
        other => other.flags(),
    };
    index | up_if(disp >= 0)
}

/// `ldc p<coproc>, crd, [base, #disp]`.
pub fn ldc(coproc: u32, crd: Reg, base: Reg, disp: i32, mode: AddrMode) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::new(base, disp, OpndSize::Bytes4));
    Instruction::build(Opcode::Ldc, &[r(crd)], &[coproc_num(coproc), mem])
        .with_flags(coproc_mode(mode, disp))
}

/// `stc p<coproc>, crd, [base, #disp]`.
pub fn stc(coproc: u32, crd: Reg, base: Reg, disp: i32, mode: AddrMode) -> Instruction {
    let mem = Operand::BaseDisp(BaseDisp::new(base, disp, OpndSize::Bytes4));
    Instruction::build(Opcode::Stc, &[mem], &[coproc_num(coproc), r(crd)])
        .with_flags(coproc_mode(mode, disp))
}

/// `mcrr p<coproc>, #opc1, rt, rt2, crm`.
pub fn mcrr(coproc: u32, opc1: u32, rt: Reg, rt2: Reg, crm: Reg) -> Instruction {
    Instruction::build(
        Opcode::Mcrr,
        &[r(crm)],
        &[coproc_num(coproc), uimm(opc1, OpndSize::UBits4), r(rt), r(rt2)],
    )
}

/// `mrrc p<coproc>, #opc1, rt, rt2, crm`.
pub fn mrrc(coproc: u32, opc1: u32, rt: Reg, rt2: Reg, crm: Reg) -> Instruction {
    Instruction::build(
        Opcode::Mrrc,
        &[r(rt), r(rt2)],
        &[coproc_num(coproc), uimm(opc1, OpndSize::UBits4), r(crm)],
    )
}

/// `cdp p<coproc>, #opc1, crd, crn, crm, #opc2`.
pub fn cdp(coproc: u32, opc1: u32, crd: Reg, crn: Reg, crm: Reg, opc2: u32) -> Instruction {
    Instruction::build(
        Opcode::Cdp,
        &[r(crd)],
        &[
            coproc_num(coproc),
            uimm(opc1, OpndSize::UBits4),
            r(crn),
            r(crm),
            uimm(opc2, OpndSize::UBits3),
        ],
    )
}

/// `mcr p<coproc>, #opc1, rt, crn, crm, #opc2`.
pub fn mcr(coproc: u32, opc1: u32, rt: Reg, crn: Reg, crm: Reg, opc2: u32) -> Instruction {
    Instruction::build(
        Opcode::Mcr,
        &[r(crn)],
        &[
            coproc_num(coproc),
            uimm(opc1, OpndSize::UBits3),
            r(rt),
            r(crm),
            uimm(opc2, OpndSize::UBits3),
        ],
    )
}

/// `mrc p<coproc>, #opc1, rt, crn, crm, #opc2`.
pub fn mrc(coproc: u32, opc1: u32, rt: Reg, crn: Reg, crm: Reg, opc2: u32) -> Instruction {
    Instruction::build(
        Opcode::Mrc,
        &[r(rt)],
        &[
            coproc_num(coproc),
            uimm(opc1, OpndSize::UBits3),
            r(crn),
            r(crm),
            uimm(opc2, OpndSize::UBits3),
        ],
    )
}

// ── VFP and supervisor call ─────────────────────────────────────────────

fn vfp_transfer_opcode(reg: Reg, single: Opcode, double: Opcode) -> Opcode {
    if reg.bank() == Some(RegBank::Double) {
        double
    } else {
        single
    }
}

/// `vldr reg, [base, #disp]`; single or double by the register's bank.
pub fn vldr(reg: Reg, base: Reg, disp: i32) -> Instruction {
    let op = vfp_transfer_opcode(reg, Opcode::VldrS, Opcode::VldrD);
    let mem = Operand::BaseDisp(BaseDisp::new(base, disp, access_size(op)));
    Instruction::build(op, &[r(reg)], &[mem]).with_flags(up_if(disp >= 0))
}

/// `vstr reg, [base, #disp]`.
pub fn vstr(reg: Reg, base: Reg, disp: i32) -> Instruction {
    let op = vfp_transfer_opcode(reg, Opcode::VstrS, Opcode::VstrD);
    let mem = Operand::BaseDisp(BaseDisp::new(base, disp, access_size(op)));
    Instruction::build(op, &[mem], &[r(reg)]).with_flags(up_if(disp >= 0))
}

pub fn svc(imm: u32) -> Instruction {
    Instruction::build(Opcode::Svc, &[], &[uimm(imm, OpndSize::UBits24)])
}

/// Three-register VFP arithmetic `op d, n, m`.
pub fn vfp_arith(op: Opcode, d: Reg, n: Reg, m: Reg) -> Instruction {
    Instruction::build(op, &[r(d)], &[r(n), r(m)])
}

/// `vmov sn, rt`.
pub fn vmov_sr(sn: Reg, rt: Reg) -> Instruction {
    Instruction::build(Opcode::VmovSr, &[r(sn)], &[r(rt)])
}

/// `vmov rt, sn`.
pub fn vmov_rs(rt: Reg, sn: Reg) -> Instruction {
    Instruction::build(Opcode::VmovRs, &[r(rt)], &[r(sn)])
}

/// `vmrs rt, fpscr`; `pc` as `rt` copies the flags to `APSR_nzcv`.
pub fn vmrs(rt: Reg) -> Instruction {
    Instruction::build(Opcode::Vmrs, &[r(rt)], &[r(Reg::Fpscr)])
}

pub fn vmsr(rt: Reg) -> Instruction {
    Instruction::build(Opcode::Vmsr, &[r(Reg::Fpscr)], &[r(rt)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::Cond;

    #[test]
    fn defaults() {
        let add = dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2);
        assert_eq!(add.cond(), Cond::Al);
        assert_eq!(add.flags(), InstrFlags::empty());
        assert_eq!(add.shift(), None);
        assert_eq!(add.num_dsts(), 1);
        assert_eq!(add.num_srcs(), 2);
    }

    #[test]
    fn displacement_sign_sets_up() {
        let fwd = load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, 4, AddrMode::Offset);
        assert_eq!(fwd.flags(), InstrFlags::P | InstrFlags::U);
        let back = load_store_imm(Opcode::StrImm, Reg::R0, Reg::SP, -8, AddrMode::PreIndex);
        assert_eq!(back.flags(), InstrFlags::P | InstrFlags::W);
        let sub = load_store_reg(Opcode::StrReg, Reg::R0, Reg::R1, Reg::R2, 1, true, AddrMode::Offset);
        assert_eq!(sub.flags(), InstrFlags::P);
        assert_eq!(load_literal(Opcode::LdrLit, Reg::R0, -4).flags(), InstrFlags::empty());
    }

    #[test]
    fn coprocessor_post_index_sets_only_w() {
        let stc = stc(14, Reg::Cr5, Reg::R0, -8, AddrMode::PostIndex);
        assert_eq!(stc.flags(), InstrFlags::W);
    }

    #[test]
    fn dual_forms_name_the_pair() {
        let ldrd = load_store_dual_imm(Opcode::LdrdImm, Reg::R4, Reg::R0, 8, AddrMode::Offset);
        assert_eq!(ldrd.dsts(), [Operand::reg(Reg::R4), Operand::reg(Reg::R5)]);
        let lit = load_literal(Opcode::LdrdLit, Reg::R2, 16);
        assert_eq!(lit.dst(1), Operand::reg(Reg::R3));
        let pc = load_store_dual_imm(Opcode::LdrdImm, Reg::PC, Reg::R0, 0, AddrMode::Offset);
        assert_eq!(pc.dst(1), Operand::reg(Reg::Null));
    }

    #[test]
    fn vfp_bank_picks_the_opcode() {
        assert_eq!(vldr(Reg::D3, Reg::R0, 0).opcode(), Opcode::VldrD);
        assert_eq!(vldr(Reg::S3, Reg::R0, 0).opcode(), Opcode::VldrS);
        assert_eq!(vstr(Reg::D3, Reg::R0, 0).opcode(), Opcode::VstrD);
    }

    #[test]
    fn extend_without_rotation() {
        assert_eq!(extend(Opcode::Uxtb, Reg::R0, Reg::R1, 0).num_srcs(), 1);
        assert_eq!(extend(Opcode::Uxtb, Reg::R0, Reg::R1, 8).num_srcs(), 2);
    }
}
