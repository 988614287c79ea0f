//! Operand templates.
//!
//! Each opcode owns a chain of alternative templates, tried in order by the
//! matcher in [`crate::encode`]. A template lists the expected type and size
//! of every destination and source slot, the bit field a register slot
//! occupies, and the flags that must be set or clear for the form it
//! describes (offset, pre-indexed or post-indexed addressing).
//!
//! Two slots naming the same [`BitGroup`] share one encoding field; the
//! operands placed there must be identical.

use crate::instr::{InstrFlags, MAX_DSTS, MAX_SRCS};
use crate::opcode::{Family, Opcode};
use crate::reg::{Reg, RegBank};
use crate::size::OpndSize;

/// Addressing shape accepted by a memory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemForm {
    /// `[Rn, #±imm12]`
    Imm12,
    /// `[Rn, #±imm8]`
    Imm8,
    /// `[Rn, #±imm8*4]`
    Imm8x4,
    /// `[Rn, ±Rm, lsl #imm5]`
    Reg,
    /// `[Rn, ±Rm]`
    RegNoShift,
    /// `[pc, #±imm12]` or an instruction-relative literal.
    PcRel12,
    /// `[pc, #±imm8]` or an instruction-relative literal.
    PcRel8,
}

/// Expected kind of an operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpndType {
    /// The instruction has no operand in this slot.
    None,
    /// A register of the bank.
    Reg(RegBank),
    /// A general-purpose register other than `pc`, for fields where `1111`
    /// selects a different instruction.
    GprNotPc,
    /// Exactly this register; an implicit operand.
    FixedReg(Reg),
    /// `cpsr` or `spsr`.
    StatusReg,
    /// Memory addressed by a general-purpose register, `[Rn]`.
    IndirReg,
    /// Integer memory reference.
    Mem(MemForm),
    /// Floating-point memory reference.
    FloatMem(MemForm),
    /// Immediate.
    Imm,
    /// Near branch target.
    J,
    /// Status-register field mask in `1..=15`.
    Mask,
    /// One of the application-level masks `nzcvq`, `g`, `nzcvqg`.
    MaskApsr,
    /// Non-empty register list.
    RegList,
}

/// Encoding field a register slot occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitGroup {
    /// Bits 19..16.
    Field16,
    /// Bits 15..12.
    Field12,
    /// Bits 11..8.
    Field8,
    /// Bits 3..0.
    Field0,
}

impl BitGroup {
    /// Number of groups.
    pub const COUNT: usize = 4;

    /// Slot of the group in a claim map.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One operand slot of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperandTemplate {
    pub ty: OpndType,
    /// Expected size class; [`OpndSize::Na`] accepts any.
    pub size: OpndSize,
    /// Field shared with other slots, if any.
    pub bits: Option<BitGroup>,
}

impl OperandTemplate {
    /// Whether the slot expects an operand.
    pub fn is_present(&self) -> bool {
        self.ty != OpndType::None
    }
}

/// One alternative encoding of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrTemplate {
    pub dsts: [OperandTemplate; MAX_DSTS],
    pub srcs: [OperandTemplate; MAX_SRCS],
    /// Flags the instruction must carry.
    pub required: InstrFlags,
    /// Flags the instruction must not carry.
    pub cleared: InstrFlags,
}

impl InstrTemplate {
    /// Number of destination slots in use.
    pub fn num_dsts(&self) -> usize {
        self.dsts.iter().take_while(|t| t.is_present()).count()
    }

    /// Number of source slots in use.
    pub fn num_srcs(&self) -> usize {
        self.srcs.iter().take_while(|t| t.is_present()).count()
    }
}

// ── Builders ─────────────────────────────────────────────────────────────

const NONE: OperandTemplate = OperandTemplate {
    ty: OpndType::None,
    size: OpndSize::Na,
    bits: None,
};

const fn slot(ty: OpndType, size: OpndSize, bits: Option<BitGroup>) -> OperandTemplate {
    OperandTemplate { ty, size, bits }
}

const fn gpr(bits: BitGroup) -> OperandTemplate {
    slot(OpndType::Reg(RegBank::Gpr), OpndSize::Bytes4, Some(bits))
}

const fn gpr_not_pc(bits: BitGroup) -> OperandTemplate {
    slot(OpndType::GprNotPc, OpndSize::Bytes4, Some(bits))
}

/// A general-purpose register whose field is implied by another slot.
const GPR_PAIR: OperandTemplate = slot(OpndType::Reg(RegBank::Gpr), OpndSize::Bytes4, None);

const fn sreg(bits: BitGroup) -> OperandTemplate {
    slot(OpndType::Reg(RegBank::Single), OpndSize::Bytes4, Some(bits))
}

const fn dreg(bits: BitGroup) -> OperandTemplate {
    slot(OpndType::Reg(RegBank::Double), OpndSize::Bytes8, Some(bits))
}

const fn creg(bits: BitGroup) -> OperandTemplate {
    slot(OpndType::Reg(RegBank::Coproc), OpndSize::Bytes4, Some(bits))
}

const fn imm(size: OpndSize) -> OperandTemplate {
    slot(OpndType::Imm, size, None)
}

const fn fixed(reg: Reg) -> OperandTemplate {
    slot(OpndType::FixedReg(reg), OpndSize::Na, None)
}

const fn mem(form: MemForm) -> OperandTemplate {
    slot(OpndType::Mem(form), OpndSize::Na, Some(BitGroup::Field16))
}

const fn fmem(form: MemForm) -> OperandTemplate {
    slot(OpndType::FloatMem(form), OpndSize::Na, Some(BitGroup::Field16))
}

const fn lit(form: MemForm) -> OperandTemplate {
    slot(OpndType::Mem(form), OpndSize::Na, None)
}

const INDIR: OperandTemplate = slot(OpndType::IndirReg, OpndSize::Na, Some(BitGroup::Field16));
const STATUS: OperandTemplate = slot(OpndType::StatusReg, OpndSize::Na, None);
const MASK: OperandTemplate = slot(OpndType::Mask, OpndSize::UBits4, None);
const MASK_APSR: OperandTemplate = slot(OpndType::MaskApsr, OpndSize::UBits4, None);
const LIST: OperandTemplate = slot(OpndType::RegList, OpndSize::RegList, None);
const TARGET: OperandTemplate = slot(OpndType::J, OpndSize::Na, None);

const fn t(dsts: &[OperandTemplate], srcs: &[OperandTemplate]) -> InstrTemplate {
    let mut out = InstrTemplate {
        dsts: [NONE; MAX_DSTS],
        srcs: [NONE; MAX_SRCS],
        required: InstrFlags::empty(),
        cleared: InstrFlags::empty(),
    };
    let mut i = 0;
    while i < dsts.len() {
        out.dsts[i] = dsts[i];
        i += 1;
    }
    let mut i = 0;
    while i < srcs.len() {
        out.srcs[i] = srcs[i];
        i += 1;
    }
    out
}

impl InstrTemplate {
    const fn flags(mut self, required: InstrFlags, cleared: InstrFlags) -> Self {
        self.required = required;
        self.cleared = cleared;
        self
    }

    const fn offset(self) -> Self {
        self.flags(InstrFlags::P, InstrFlags::W)
    }

    const fn pre_indexed(self) -> Self {
        self.flags(InstrFlags::P.union(InstrFlags::W), InstrFlags::empty())
    }

    const fn post_indexed(self) -> Self {
        self.flags(InstrFlags::empty(), InstrFlags::P.union(InstrFlags::W))
    }

    /// Coprocessor transfers encode post-indexing as P clear, W set.
    const fn coproc_post_indexed(self) -> Self {
        self.flags(InstrFlags::W, InstrFlags::P)
    }
}

use BitGroup::{Field0 as F0, Field12 as F12, Field16 as F16, Field8 as F8};

// ── Data processing ──────────────────────────────────────────────────────

static DP_REG: [InstrTemplate; 2] = [
    t(&[gpr(F12)], &[gpr(F16), gpr(F0)]),
    t(&[gpr(F12)], &[gpr(F16), gpr(F0), imm(OpndSize::UBits5)]),
];
static DP_REG_MOVE: [InstrTemplate; 2] = [
    t(&[gpr(F12)], &[gpr(F0)]),
    t(&[gpr(F12)], &[gpr(F0), imm(OpndSize::UBits5)]),
];
static DP_REG_TEST: [InstrTemplate; 2] = [
    t(&[], &[gpr(F16), gpr(F0)]),
    t(&[], &[gpr(F16), gpr(F0), imm(OpndSize::UBits5)]),
];
static DP_RSR: [InstrTemplate; 1] = [t(&[gpr(F12)], &[gpr(F16), gpr(F0), gpr(F8)])];
static DP_RSR_MOVE: [InstrTemplate; 1] = [t(&[gpr(F12)], &[gpr(F0), gpr(F8)])];
static DP_RSR_TEST: [InstrTemplate; 1] = [t(&[], &[gpr(F16), gpr(F0), gpr(F8)])];
static DP_IMM: [InstrTemplate; 1] = [t(&[gpr(F12)], &[gpr(F16), imm(OpndSize::RotImm12)])];
static DP_IMM_MOVE: [InstrTemplate; 1] = [t(&[gpr(F12)], &[imm(OpndSize::RotImm12)])];
static DP_IMM_TEST: [InstrTemplate; 1] = [t(&[], &[gpr(F16), imm(OpndSize::RotImm12)])];

// ── Multiply ─────────────────────────────────────────────────────────────

static MUL: [InstrTemplate; 1] = [t(&[gpr(F16)], &[gpr(F0), gpr(F8)])];
static MUL_ACC: [InstrTemplate; 1] = [t(&[gpr(F16)], &[gpr(F0), gpr(F8), gpr(F12)])];
static MUL_LONG: [InstrTemplate; 1] = [t(&[gpr(F12), gpr(F16)], &[gpr(F0), gpr(F8)])];
static MUL_LONG_ACC: [InstrTemplate; 1] = [t(
    &[gpr(F12), gpr(F16)],
    &[gpr(F12), gpr(F16), gpr(F0), gpr(F8)],
)];

// ── Miscellaneous ────────────────────────────────────────────────────────

static BX: [InstrTemplate; 1] = [t(&[], &[gpr(F0)])];
static BLX_REG: [InstrTemplate; 1] = [t(&[fixed(Reg::LR)], &[gpr(F0)])];
static CLZ: [InstrTemplate; 1] = [t(&[gpr(F12)], &[gpr(F0)])];
static MRS: [InstrTemplate; 1] = [t(&[gpr(F12)], &[STATUS])];
static MSR_REG: [InstrTemplate; 2] = [
    t(&[fixed(Reg::Cpsr)], &[MASK_APSR, gpr(F0)]),
    t(&[STATUS], &[MASK, gpr(F0)]),
];
static MSR_IMM: [InstrTemplate; 2] = [
    t(&[fixed(Reg::Cpsr)], &[MASK_APSR, imm(OpndSize::RotImm12)]),
    t(&[STATUS], &[MASK, imm(OpndSize::RotImm12)]),
];
static BKPT: [InstrTemplate; 1] = [t(&[], &[imm(OpndSize::UBits16)])];
static SATURATING: [InstrTemplate; 1] = [t(&[gpr(F12)], &[gpr(F0), gpr(F16)])];
static NO_OPERANDS: [InstrTemplate; 1] = [t(&[], &[])];
static MOVW: [InstrTemplate; 1] = [t(&[gpr(F12)], &[imm(OpndSize::UBits16)])];
static MOVT: [InstrTemplate; 1] = [t(&[gpr(F12)], &[gpr(F12), imm(OpndSize::UBits16)])];
static ADR: [InstrTemplate; 1] = [t(&[gpr(F12)], &[imm(OpndSize::RotImm12)])];

// ── Loads and stores ─────────────────────────────────────────────────────

macro_rules! indexed_forms {
    ($name:ident, $dsts:expr, $srcs:expr) => {
        static $name: [InstrTemplate; 3] = [
            t($dsts, $srcs).offset(),
            t($dsts, $srcs).pre_indexed(),
            t($dsts, $srcs).post_indexed(),
        ];
    };
}

indexed_forms!(LOAD_IMM12, &[gpr(F12)], &[mem(MemForm::Imm12)]);
indexed_forms!(STORE_IMM12, &[mem(MemForm::Imm12)], &[gpr(F12)]);
indexed_forms!(LOAD_REG, &[gpr(F12)], &[mem(MemForm::Reg)]);
indexed_forms!(STORE_REG, &[mem(MemForm::Reg)], &[gpr(F12)]);
indexed_forms!(LOAD_IMM8, &[gpr(F12)], &[mem(MemForm::Imm8)]);
indexed_forms!(STORE_IMM8, &[mem(MemForm::Imm8)], &[gpr(F12)]);
indexed_forms!(LOAD_REG_NO_SHIFT, &[gpr(F12)], &[mem(MemForm::RegNoShift)]);
indexed_forms!(STORE_REG_NO_SHIFT, &[mem(MemForm::RegNoShift)], &[gpr(F12)]);
indexed_forms!(LOAD_DUAL_IMM8, &[gpr(F12), GPR_PAIR], &[mem(MemForm::Imm8)]);
indexed_forms!(STORE_DUAL_IMM8, &[mem(MemForm::Imm8)], &[gpr(F12), GPR_PAIR]);
indexed_forms!(LOAD_DUAL_REG, &[gpr(F12), GPR_PAIR], &[mem(MemForm::RegNoShift)]);
indexed_forms!(STORE_DUAL_REG, &[mem(MemForm::RegNoShift)], &[gpr(F12), GPR_PAIR]);

static LOAD_LIT12: [InstrTemplate; 1] = [t(&[gpr(F12)], &[lit(MemForm::PcRel12)])];
static LOAD_LIT8: [InstrTemplate; 1] = [t(&[gpr(F12)], &[lit(MemForm::PcRel8)])];
static LOAD_DUAL_LIT8: [InstrTemplate; 1] = [t(&[gpr(F12), GPR_PAIR], &[lit(MemForm::PcRel8)])];
static LDREX: [InstrTemplate; 1] = [t(&[gpr(F12)], &[INDIR])];
static STREX: [InstrTemplate; 1] = [t(&[gpr(F12), INDIR], &[gpr(F0)])];
static PLD: [InstrTemplate; 1] = [t(&[], &[mem(MemForm::Imm12)])];
static BARRIER: [InstrTemplate; 1] = [t(&[], &[imm(OpndSize::UBits4)])];

// ── Media ────────────────────────────────────────────────────────────────

static EXTEND: [InstrTemplate; 2] = [
    t(&[gpr(F12)], &[gpr(F0)]),
    t(&[gpr(F12)], &[gpr(F0), imm(OpndSize::UBits5)]),
];
static REVERSE: [InstrTemplate; 1] = [t(&[gpr(F12)], &[gpr(F0)])];
static BITFIELD_EXTRACT: [InstrTemplate; 1] = [t(
    &[gpr(F12)],
    &[gpr(F0), imm(OpndSize::UBits5), imm(OpndSize::UBits6)],
)];
static BITFIELD_INSERT: [InstrTemplate; 1] = [t(
    &[gpr(F12)],
    &[gpr(F12), gpr_not_pc(F0), imm(OpndSize::UBits5), imm(OpndSize::UBits6)],
)];
static BITFIELD_CLEAR: [InstrTemplate; 1] = [t(
    &[gpr(F12)],
    &[gpr(F12), imm(OpndSize::UBits5), imm(OpndSize::UBits6)],
)];
static MEDIA_MUL: [InstrTemplate; 1] = [t(&[gpr(F16)], &[gpr(F0), gpr(F8)])];
static MEDIA_MUL_ACC: [InstrTemplate; 1] =
    [t(&[gpr(F16)], &[gpr(F0), gpr(F8), gpr_not_pc(F12)])];

// ── Load/store multiple and branches ─────────────────────────────────────

static LOAD_MULTIPLE: [InstrTemplate; 1] = [t(&[LIST], &[INDIR])];
static STORE_MULTIPLE: [InstrTemplate; 1] = [t(&[INDIR], &[LIST])];
static PUSH: [InstrTemplate; 1] = [t(&[fixed(Reg::SP)], &[LIST, fixed(Reg::SP)])];
static POP: [InstrTemplate; 1] = [t(&[LIST, fixed(Reg::SP)], &[fixed(Reg::SP)])];
static BRANCH: [InstrTemplate; 1] = [t(&[], &[TARGET])];
static BRANCH_LINK: [InstrTemplate; 1] = [t(&[fixed(Reg::LR)], &[TARGET])];

// ── Coprocessor and VFP ──────────────────────────────────────────────────

static LDC: [InstrTemplate; 3] = [
    t(&[creg(F12)], &[imm(OpndSize::UBits4), mem(MemForm::Imm8x4)]).offset(),
    t(&[creg(F12)], &[imm(OpndSize::UBits4), mem(MemForm::Imm8x4)]).pre_indexed(),
    t(&[creg(F12)], &[imm(OpndSize::UBits4), mem(MemForm::Imm8x4)]).coproc_post_indexed(),
];
static STC: [InstrTemplate; 3] = [
    t(&[mem(MemForm::Imm8x4)], &[imm(OpndSize::UBits4), creg(F12)]).offset(),
    t(&[mem(MemForm::Imm8x4)], &[imm(OpndSize::UBits4), creg(F12)]).pre_indexed(),
    t(&[mem(MemForm::Imm8x4)], &[imm(OpndSize::UBits4), creg(F12)]).coproc_post_indexed(),
];
static MCRR: [InstrTemplate; 1] = [t(
    &[creg(F0)],
    &[imm(OpndSize::UBits4), imm(OpndSize::UBits4), gpr(F12), gpr(F16)],
)];
static MRRC: [InstrTemplate; 1] = [t(
    &[gpr(F12), gpr(F16)],
    &[imm(OpndSize::UBits4), imm(OpndSize::UBits4), creg(F0)],
)];
static VLDR_S: [InstrTemplate; 1] = [t(&[sreg(F12)], &[fmem(MemForm::Imm8x4)])];
static VSTR_S: [InstrTemplate; 1] = [t(&[fmem(MemForm::Imm8x4)], &[sreg(F12)])];
static VLDR_D: [InstrTemplate; 1] = [t(&[dreg(F12)], &[fmem(MemForm::Imm8x4)])];
static VSTR_D: [InstrTemplate; 1] = [t(&[fmem(MemForm::Imm8x4)], &[dreg(F12)])];
static SVC: [InstrTemplate; 1] = [t(&[], &[imm(OpndSize::UBits24)])];
static CDP: [InstrTemplate; 1] = [t(
    &[creg(F12)],
    &[
        imm(OpndSize::UBits4),
        imm(OpndSize::UBits4),
        creg(F16),
        creg(F0),
        imm(OpndSize::UBits3),
    ],
)];
static MCR: [InstrTemplate; 1] = [t(
    &[creg(F16)],
    &[
        imm(OpndSize::UBits4),
        imm(OpndSize::UBits3),
        gpr(F12),
        creg(F0),
        imm(OpndSize::UBits3),
    ],
)];
static MRC: [InstrTemplate; 1] = [t(
    &[gpr(F12)],
    &[
        imm(OpndSize::UBits4),
        imm(OpndSize::UBits3),
        creg(F16),
        creg(F0),
        imm(OpndSize::UBits3),
    ],
)];
static VFP_OP_S: [InstrTemplate; 1] = [t(&[sreg(F12)], &[sreg(F16), sreg(F0)])];
static VFP_OP_D: [InstrTemplate; 1] = [t(&[dreg(F12)], &[dreg(F16), dreg(F0)])];
static VMOV_SR: [InstrTemplate; 1] = [t(&[sreg(F16)], &[gpr(F12)])];
static VMOV_RS: [InstrTemplate; 1] = [t(&[gpr(F12)], &[sreg(F16)])];
static VMRS: [InstrTemplate; 1] = [t(&[gpr(F12)], &[fixed(Reg::Fpscr)])];
static VMSR: [InstrTemplate; 1] = [t(&[fixed(Reg::Fpscr)], &[gpr(F12)])];

/// Template chain of `op`, tried in order. Empty for the pseudo opcodes.
pub fn templates_for(op: Opcode) -> &'static [InstrTemplate] {
    use Opcode::*;
    let Some(family) = op.family() else {
        return &[];
    };
    match family {
        Family::DpReg => &DP_REG,
        Family::DpRegMove => &DP_REG_MOVE,
        Family::DpRegTest => &DP_REG_TEST,
        Family::DpRsr => &DP_RSR,
        Family::DpRsrMove => &DP_RSR_MOVE,
        Family::DpRsrTest => &DP_RSR_TEST,
        Family::DpImm => &DP_IMM,
        Family::DpImmMove => &DP_IMM_MOVE,
        Family::DpImmTest => &DP_IMM_TEST,
        Family::Multiply => &MUL,
        Family::MultiplyAccumulate => &MUL_ACC,
        Family::MultiplyLong => match op {
            Umlal | Smlal => &MUL_LONG_ACC,
            _ => &MUL_LONG,
        },
        Family::BranchExchange => match op {
            BlxReg => &BLX_REG,
            _ => &BX,
        },
        Family::CountLeadingZeros => &CLZ,
        Family::StatusRegRead => &MRS,
        Family::StatusRegWriteReg => &MSR_REG,
        Family::StatusRegWriteImm => &MSR_IMM,
        Family::Breakpoint => &BKPT,
        Family::SaturatingArith => &SATURATING,
        Family::ExtraLoadStoreImm if op.is_load() => &LOAD_IMM8,
        Family::ExtraLoadStoreImm => &STORE_IMM8,
        Family::ExtraLoadStoreReg if op.is_load() => &LOAD_REG_NO_SHIFT,
        Family::ExtraLoadStoreReg => &STORE_REG_NO_SHIFT,
        Family::DualLoadStoreImm if op.is_load() => &LOAD_DUAL_IMM8,
        Family::DualLoadStoreImm => &STORE_DUAL_IMM8,
        Family::DualLoadStoreReg if op.is_load() => &LOAD_DUAL_REG,
        Family::DualLoadStoreReg => &STORE_DUAL_REG,
        Family::ExtraLoadStoreLit => match op {
            LdrdLit => &LOAD_DUAL_LIT8,
            _ => &LOAD_LIT8,
        },
        Family::LoadExclusive => &LDREX,
        Family::StoreExclusive => &STREX,
        Family::MoveWide => match op {
            Movt => &MOVT,
            _ => &MOVW,
        },
        Family::Hint | Family::ClearExclusive => &NO_OPERANDS,
        Family::AddressOfPc => &ADR,
        Family::LoadStoreImm if op.is_load() => &LOAD_IMM12,
        Family::LoadStoreImm => &STORE_IMM12,
        Family::LoadLiteral => &LOAD_LIT12,
        Family::PreloadImm => &PLD,
        Family::Barrier => &BARRIER,
        Family::LoadStoreReg if op.is_load() => &LOAD_REG,
        Family::LoadStoreReg => &STORE_REG,
        Family::Extend => &EXTEND,
        Family::Reverse => &REVERSE,
        Family::BitfieldExtract => &BITFIELD_EXTRACT,
        Family::BitfieldInsert => &BITFIELD_INSERT,
        Family::BitfieldClear => &BITFIELD_CLEAR,
        Family::DualMultiply => match op {
            Smlad | Smlsd => &MEDIA_MUL_ACC,
            _ => &MEDIA_MUL,
        },
        Family::MostSignificantMultiply => match op {
            Smmla => &MEDIA_MUL_ACC,
            _ => &MEDIA_MUL,
        },
        Family::LoadStoreMultiple if op.is_load() => &LOAD_MULTIPLE,
        Family::LoadStoreMultiple => &STORE_MULTIPLE,
        Family::PushPop => match op {
            Push => &PUSH,
            _ => &POP,
        },
        Family::Branch => match op {
            Bl => &BRANCH_LINK,
            _ => &BRANCH,
        },
        Family::BranchLinkExchangeImm => &BRANCH_LINK,
        Family::CoprocLoadStore if op.is_load() => &LDC,
        Family::CoprocLoadStore => &STC,
        Family::CoprocTwoReg => match op {
            Mrrc => &MRRC,
            _ => &MCRR,
        },
        Family::VfpLoadStore => match op {
            VldrS => &VLDR_S,
            VstrS => &VSTR_S,
            VldrD => &VLDR_D,
            _ => &VSTR_D,
        },
        Family::SupervisorCall => &SVC,
        Family::CoprocDataOp => &CDP,
        Family::CoprocRegTransfer => match op {
            Mrc => &MRC,
            _ => &MCR,
        },
        Family::VfpDataOp => match op {
            VaddD | VsubD | VmulD | VdivD => &VFP_OP_D,
            _ => &VFP_OP_S,
        },
        Family::VfpCoreTransfer => match op {
            VmovRs => &VMOV_RS,
            _ => &VMOV_SR,
        },
        Family::VfpStatusTransfer => match op {
            Vmrs => &VMRS,
            _ => &VMSR,
        },
    }
}
