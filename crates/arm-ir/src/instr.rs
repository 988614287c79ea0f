//! Instruction model.

use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use bitflags::bitflags;

use crate::decode;
use crate::encode;
use crate::error::IrError;
use crate::instrlist::InstrId;
use crate::opcode::{Family, Opcode};
use crate::opnd::{Operand, MASK_G, MASK_NZCVQ};
use crate::reg::Reg;

// ── Condition codes ──────────────────────────────────────────────────────

/// Condition code, bits 31..28.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Cond {
    Eq = 0x0,
    Ne = 0x1,
    Cs = 0x2, // HS
    Cc = 0x3, // LO
    Mi = 0x4,
    Pl = 0x5,
    Vs = 0x6,
    Vc = 0x7,
    Hi = 0x8,
    Ls = 0x9,
    Ge = 0xA,
    Lt = 0xB,
    Gt = 0xC,
    Le = 0xD,
    #[default]
    Al = 0xE,
}

impl Cond {
    /// Every condition in encoding order.
    pub const ALL: [Cond; 15] = [
        Cond::Eq,
        Cond::Ne,
        Cond::Cs,
        Cond::Cc,
        Cond::Mi,
        Cond::Pl,
        Cond::Vs,
        Cond::Vc,
        Cond::Hi,
        Cond::Ls,
        Cond::Ge,
        Cond::Lt,
        Cond::Gt,
        Cond::Le,
        Cond::Al,
    ];

    /// Condition of a 4-bit field; `1111` has no condition.
    pub fn from_bits(bits: u32) -> Option<Cond> {
        Cond::ALL.get(bits as usize).copied()
    }

    /// Assembler suffix (empty for `al`).
    pub fn suffix(self) -> &'static str {
        match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Cs => "cs",
            Cond::Cc => "cc",
            Cond::Mi => "mi",
            Cond::Pl => "pl",
            Cond::Vs => "vs",
            Cond::Vc => "vc",
            Cond::Hi => "hi",
            Cond::Ls => "ls",
            Cond::Ge => "ge",
            Cond::Lt => "lt",
            Cond::Gt => "gt",
            Cond::Le => "le",
            Cond::Al => "",
        }
    }

    /// Flags the condition reads.
    pub fn reads(self) -> EflagsUsage {
        match self {
            Cond::Eq | Cond::Ne => EflagsUsage::READ_Z,
            Cond::Cs | Cond::Cc => EflagsUsage::READ_C,
            Cond::Mi | Cond::Pl => EflagsUsage::READ_N,
            Cond::Vs | Cond::Vc => EflagsUsage::READ_V,
            Cond::Hi | Cond::Ls => EflagsUsage::READ_C | EflagsUsage::READ_Z,
            Cond::Ge | Cond::Lt => EflagsUsage::READ_N | EflagsUsage::READ_V,
            Cond::Gt | Cond::Le => {
                EflagsUsage::READ_N | EflagsUsage::READ_Z | EflagsUsage::READ_V
            }
            Cond::Al => EflagsUsage::empty(),
        }
    }
}

/// Barrel-shifter operation, bits 6..5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ShiftType {
    Lsl = 0,
    Lsr = 1,
    Asr = 2,
    Ror = 3,
}

impl ShiftType {
    /// Shift of a 2-bit field.
    pub fn from_bits(bits: u32) -> ShiftType {
        match bits & 3 {
            0 => ShiftType::Lsl,
            1 => ShiftType::Lsr,
            2 => ShiftType::Asr,
            _ => ShiftType::Ror,
        }
    }

    /// Assembler name.
    pub fn name(self) -> &'static str {
        match self {
            ShiftType::Lsl => "lsl",
            ShiftType::Lsr => "lsr",
            ShiftType::Asr => "asr",
            ShiftType::Ror => "ror",
        }
    }
}

bitflags! {
    /// Single-bit encoding flags carried by an instruction.
    ///
    /// Only the flags an opcode declares variable (`Opcode::has_*_flag`)
    /// reach the encoded word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct InstrFlags: u16 {
        /// Pre-indexed addressing.
        const P = 1 << 0;
        /// Add the offset to the base.
        const U = 1 << 1;
        /// Set condition flags.
        const S = 1 << 2;
        /// Write the address back to the base.
        const W = 1 << 3;
        /// Load rather than store.
        const L = 1 << 4;
        /// Byte rather than word.
        const B = 1 << 5;
        /// Long coprocessor transfer.
        const D = 1 << 6;
        /// Halfword-aligned `blx` target.
        const H = 1 << 7;
        /// Swap the halves of the second multiply operand.
        const M = 1 << 8;
        /// Round the most significant multiply result.
        const R = 1 << 9;
    }
}

bitflags! {
    /// Condition-flag reads and writes of an instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EflagsUsage: u16 {
        const READ_N = 1 << 0;
        const READ_Z = 1 << 1;
        const READ_C = 1 << 2;
        const READ_V = 1 << 3;
        const READ_Q = 1 << 4;
        const READ_GE = 1 << 5;
        const WRITE_N = 1 << 6;
        const WRITE_Z = 1 << 7;
        const WRITE_C = 1 << 8;
        const WRITE_V = 1 << 9;
        const WRITE_Q = 1 << 10;
        const WRITE_GE = 1 << 11;

        const READ_NZCV = Self::READ_N.bits() | Self::READ_Z.bits() | Self::READ_C.bits() | Self::READ_V.bits();
        const READ_ALL = Self::READ_NZCV.bits() | Self::READ_Q.bits() | Self::READ_GE.bits();
        const WRITE_NZC = Self::WRITE_N.bits() | Self::WRITE_Z.bits() | Self::WRITE_C.bits();
        const WRITE_NZCV = Self::WRITE_NZC.bits() | Self::WRITE_V.bits();
        const WRITE_NZCVQ = Self::WRITE_NZCV.bits() | Self::WRITE_Q.bits();
    }
}

/// How much of an instruction has been decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeLevel {
    /// Bytes of one or more instructions, boundaries unknown.
    RawBundle = 0,
    /// Raw bits of exactly one instruction.
    RawBits = 1,
    /// Opcode known, operands not decoded.
    Opcode = 2,
    /// Fully decoded; raw bits still valid.
    Operands = 3,
    /// Built or modified; raw bits invalid.
    Synthetic = 4,
}

/// Load/store addressing mode, selected by the P and W flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddrMode {
    /// `[Rn, #off]`
    Offset,
    /// `[Rn, #off]!`
    PreIndex,
    /// `[Rn], #off`
    PostIndex,
}

impl AddrMode {
    /// P and W flags selecting this mode.
    pub fn flags(self) -> InstrFlags {
        match self {
            AddrMode::Offset => InstrFlags::P,
            AddrMode::PreIndex => InstrFlags::P | InstrFlags::W,
            AddrMode::PostIndex => InstrFlags::empty(),
        }
    }

    /// Mode selected by the P and W flags; `None` for the unprivileged
    /// post-indexed forms (P clear, W set).
    pub fn from_flags(flags: InstrFlags) -> Option<AddrMode> {
        match (flags.contains(InstrFlags::P), flags.contains(InstrFlags::W)) {
            (true, false) => Some(AddrMode::Offset),
            (true, true) => Some(AddrMode::PreIndex),
            (false, false) => Some(AddrMode::PostIndex),
            (false, true) => None,
        }
    }
}

// ── Instruction ──────────────────────────────────────────────────────────

/// One A32 instruction.
///
/// Operand counts are fixed by the constructor. Every mutation invalidates
/// the raw-bits cache and the cached flag usage, and clears the
/// `our_mangling` mark.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    id: Option<InstrId>,
    opcode: Opcode,
    cond: Cond,
    flags: InstrFlags,
    shift: Option<ShiftType>,
    dsts: Vec<Operand>,
    srcs: Vec<Operand>,
    raw: Option<Vec<u8>>,
    raw_valid: bool,
    level: DecodeLevel,
    translation: Option<u32>,
    note: i64,
    our_mangling: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    eflags: Cell<Option<EflagsUsage>>,
}

/// Most destinations an instruction can carry.
pub const MAX_DSTS: usize = 2;
/// Most sources an instruction can carry.
pub const MAX_SRCS: usize = 5;

impl Instruction {
    /// An instruction with `num_dsts` and `num_srcs` null operands.
    ///
    /// # Panics
    ///
    /// Panics if a count exceeds [`MAX_DSTS`] or [`MAX_SRCS`].
    pub fn new(opcode: Opcode, num_dsts: usize, num_srcs: usize) -> Self {
        assert!(num_dsts <= MAX_DSTS && num_srcs <= MAX_SRCS);
        Self {
            id: None,
            opcode,
            cond: Cond::Al,
            flags: InstrFlags::empty(),
            shift: None,
            dsts: alloc::vec![Operand::Null; num_dsts],
            srcs: alloc::vec![Operand::Null; num_srcs],
            raw: None,
            raw_valid: false,
            level: DecodeLevel::Synthetic,
            translation: None,
            note: 0,
            our_mangling: false,
            eflags: Cell::new(None),
        }
    }

    /// An instruction with the given operands.
    pub fn build(opcode: Opcode, dsts: &[Operand], srcs: &[Operand]) -> Self {
        let mut instr = Self::new(opcode, dsts.len(), srcs.len());
        instr.dsts.copy_from_slice(dsts);
        instr.srcs.copy_from_slice(srcs);
        instr
    }

    /// Undecoded raw bytes fetched from `pc`.
    pub fn from_raw(bytes: &[u8], pc: u32) -> Self {
        let mut instr = Self::new(Opcode::Undecoded, 0, 0);
        instr.raw = Some(bytes.to_vec());
        instr.raw_valid = true;
        instr.level = DecodeLevel::RawBits;
        instr.translation = Some(pc);
        instr
    }

    /// A zero-length branch target.
    pub fn label() -> Self {
        Self::new(Opcode::Label, 0, 0)
    }

    /// Builder form of [`Instruction::set_cond`].
    pub fn with_cond(mut self, cond: Cond) -> Self {
        self.set_cond(cond);
        self
    }

    /// Builder form adding `flags` to the current flags.
    pub fn with_flags(mut self, flags: InstrFlags) -> Self {
        let merged = self.flags | flags;
        self.set_flags(merged);
        self
    }

    /// Builder form of [`Instruction::set_translation`].
    pub fn with_translation(mut self, pc: u32) -> Self {
        self.translation = Some(pc);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn id(&self) -> Option<InstrId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: InstrId) {
        self.id = Some(id);
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn cond(&self) -> Cond {
        self.cond
    }

    pub fn flags(&self) -> InstrFlags {
        self.flags
    }

    pub fn shift(&self) -> Option<ShiftType> {
        self.shift
    }

    pub fn dsts(&self) -> &[Operand] {
        &self.dsts
    }

    pub fn srcs(&self) -> &[Operand] {
        &self.srcs
    }

    pub fn num_dsts(&self) -> usize {
        self.dsts.len()
    }

    pub fn num_srcs(&self) -> usize {
        self.srcs.len()
    }

    /// Destination `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn dst(&self, i: usize) -> Operand {
        self.dsts[i]
    }

    /// Source `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn src(&self, i: usize) -> Operand {
        self.srcs[i]
    }

    pub fn level(&self) -> DecodeLevel {
        self.level
    }

    /// Original application address, if the instruction came from one.
    pub fn translation(&self) -> Option<u32> {
        self.translation
    }

    /// Provisional byte offset used to resolve instruction references.
    pub fn note(&self) -> i64 {
        self.note
    }

    /// Whether this instruction was inserted by a rewriting pass.
    pub fn our_mangling(&self) -> bool {
        self.our_mangling
    }

    /// Raw bytes, when they are valid.
    pub fn raw_bits(&self) -> Option<&[u8]> {
        match &self.raw {
            Some(raw) if self.raw_valid => Some(raw),
            _ => None,
        }
    }

    /// Whether raw bytes are held, valid or not.
    pub fn has_raw_bits(&self) -> bool {
        self.raw.is_some()
    }

    /// Whether the raw bytes may be copied instead of re-encoding.
    pub fn raw_bits_valid(&self) -> bool {
        self.raw_valid && self.raw.is_some()
    }

    /// Whether the operands are decoded.
    pub fn operands_valid(&self) -> bool {
        self.level >= DecodeLevel::Operands
    }

    // ── Mutators ─────────────────────────────────────────────────────────

    fn modify(&mut self) {
        if self.level < DecodeLevel::Operands && self.raw_bits_valid() {
            // Best effort: an undecodable word keeps its opcode and operands.
            if let Err(err) = self.decode_operands() {
                log::debug!("modifying undecoded instruction: {}", err);
            }
        }
        self.raw_valid = false;
        self.level = DecodeLevel::Synthetic;
        self.our_mangling = false;
        self.eflags.set(None);
    }

    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.modify();
        self.opcode = opcode;
    }

    pub fn set_cond(&mut self, cond: Cond) {
        self.modify();
        self.cond = cond;
    }

    pub fn set_flags(&mut self, flags: InstrFlags) {
        self.modify();
        self.flags = flags;
    }

    pub fn set_shift(&mut self, shift: Option<ShiftType>) {
        self.modify();
        self.shift = shift;
    }

    /// Replace destination `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn set_dst(&mut self, i: usize, op: Operand) {
        self.modify();
        self.dsts[i] = op;
    }

    /// Replace source `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn set_src(&mut self, i: usize, op: Operand) {
        self.modify();
        self.srcs[i] = op;
    }

    pub fn set_translation(&mut self, pc: Option<u32>) {
        self.translation = pc;
    }

    pub fn set_note(&mut self, note: i64) {
        self.note = note;
    }

    pub fn set_our_mangling(&mut self, ours: bool) {
        self.our_mangling = ours;
    }

    /// Store freshly produced raw bytes and mark them valid.
    pub fn set_raw_bits(&mut self, bytes: &[u8]) {
        self.raw = Some(bytes.to_vec());
        self.raw_valid = true;
        if self.level == DecodeLevel::Synthetic {
            self.level = DecodeLevel::Operands;
        }
        self.eflags.set(None);
    }

    /// Mark the held raw bytes valid or stale.
    pub fn set_raw_bits_valid(&mut self, valid: bool) {
        self.raw_valid = valid && self.raw.is_some();
        if !self.raw_valid && self.level >= DecodeLevel::Operands {
            self.level = DecodeLevel::Synthetic;
        } else if self.raw_valid && self.level == DecodeLevel::Synthetic {
            self.level = DecodeLevel::Operands;
        }
        self.eflags.set(None);
    }

    /// Replace every use of `old` with `new` across all operands.
    pub fn replace_reg(&mut self, old: Reg, new: Reg) -> bool {
        if !self.uses_reg(old) {
            return false;
        }
        self.modify();
        let mut changed = false;
        for op in self.dsts.iter_mut().chain(self.srcs.iter_mut()) {
            changed |= op.replace_reg(old, new);
        }
        changed
    }

    // ── Decode-level upgrades ────────────────────────────────────────────

    /// Decode the opcode from the raw bits.
    pub fn decode_opcode(&mut self) -> Result<(), IrError> {
        if self.level >= DecodeLevel::Opcode {
            return Ok(());
        }
        let word = self.raw_word()?;
        self.opcode = decode::decode_opcode(word)?;
        self.level = DecodeLevel::Opcode;
        Ok(())
    }

    /// Decode opcode and operands from the raw bits, keeping them valid.
    pub fn decode_operands(&mut self) -> Result<(), IrError> {
        if self.level >= DecodeLevel::Operands {
            return Ok(());
        }
        let word = self.raw_word()?;
        let decoded = decode::decode_word(word, self.translation.unwrap_or(0))?;
        self.opcode = decoded.opcode;
        self.cond = decoded.cond;
        self.flags = decoded.flags;
        self.shift = decoded.shift;
        self.dsts = decoded.dsts;
        self.srcs = decoded.srcs;
        self.level = DecodeLevel::Operands;
        self.eflags.set(None);
        Ok(())
    }

    fn raw_word(&self) -> Result<u32, IrError> {
        let raw = self.raw.as_deref().ok_or(IrError::OperandsNotDecoded)?;
        match raw {
            [b0, b1, b2, b3, ..] => Ok(u32::from_le_bytes([*b0, *b1, *b2, *b3])),
            _ => Err(IrError::Truncated { len: raw.len() }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Encoded length in bytes.
    pub fn length(&self) -> usize {
        if self.opcode == Opcode::Label {
            return 0;
        }
        match self.raw_bits() {
            Some(raw) => raw.len(),
            None => 4,
        }
    }

    /// Whether the encoding ignores the stored condition.
    pub fn is_unconditional(&self) -> bool {
        self.opcode.is_unconditional()
    }

    /// Whether the instruction may transfer control.
    pub fn is_cti(&self) -> bool {
        self.opcode.is_branch() || self.writes_reg(Reg::PC)
    }

    /// Conditional direct branch.
    pub fn is_cbr(&self) -> bool {
        self.opcode == Opcode::B && self.cond != Cond::Al
    }

    /// Unconditional direct branch.
    pub fn is_ubr(&self) -> bool {
        self.opcode == Opcode::B && self.cond == Cond::Al
    }

    /// Call (branch with link).
    pub fn is_call(&self) -> bool {
        matches!(self.opcode, Opcode::Bl | Opcode::BlxImm | Opcode::BlxReg)
    }

    /// Indirect branch.
    pub fn is_mbr(&self) -> bool {
        match self.opcode {
            Opcode::Bx | Opcode::BlxReg => true,
            op if op.is_branch() => false,
            _ => self.writes_reg(Reg::PC),
        }
    }

    /// Function return (`bx lr` or a load of `pc` from the stack).
    pub fn is_return(&self) -> bool {
        match self.opcode {
            Opcode::Bx => self.srcs.first() == Some(&Operand::Reg(Reg::LR)),
            Opcode::Pop => self.writes_reg(Reg::PC),
            _ => false,
        }
    }

    pub fn reads_memory(&self) -> bool {
        self.opcode.is_load()
    }

    pub fn writes_memory(&self) -> bool {
        self.opcode.is_store()
    }

    /// Whether the base register of a memory operand is written back.
    pub fn writes_back(&self) -> bool {
        let op = self.opcode;
        if op.family() == Some(Family::CoprocLoadStore) {
            return self.flags.contains(InstrFlags::W);
        }
        if op.has_p_flag() {
            return !self.flags.contains(InstrFlags::P) || self.flags.contains(InstrFlags::W);
        }
        if op.family() == Some(Family::LoadStoreMultiple) {
            return self.flags.contains(InstrFlags::W);
        }
        false
    }

    /// Whether `reg` is read, including address registers of memory destinations.
    pub fn reads_reg(&self, reg: Reg) -> bool {
        self.srcs.iter().any(|op| op.uses_reg(reg))
            || self
                .dsts
                .iter()
                .any(|op| op.is_memory_reference() && op.uses_reg(reg))
    }

    /// Whether `reg` is written, including base writeback.
    pub fn writes_reg(&self, reg: Reg) -> bool {
        let direct = self
            .dsts
            .iter()
            .any(|op| matches!(op, Operand::Reg(_) | Operand::RegList(_)) && op.uses_reg(reg));
        direct
            || (self.writes_back()
                && self
                    .dsts
                    .iter()
                    .chain(self.srcs.iter())
                    .any(|op| op.is_memory_reference() && op.base() == reg))
    }

    /// Whether any operand names `reg`.
    pub fn uses_reg(&self, reg: Reg) -> bool {
        self.dsts
            .iter()
            .chain(self.srcs.iter())
            .any(|op| op.uses_reg(reg))
    }

    /// Target operand of a direct branch.
    pub fn branch_target(&self) -> Option<Operand> {
        match self.opcode {
            Opcode::B | Opcode::Bl | Opcode::BlxImm => self.srcs.first().copied(),
            _ => None,
        }
    }

    /// Retarget a direct branch.
    ///
    /// # Panics
    ///
    /// Panics if the instruction is not a direct branch.
    pub fn set_branch_target(&mut self, target: Operand) {
        assert!(
            self.branch_target().is_some(),
            "{} is not a direct branch",
            self.opcode
        );
        self.set_src(0, target);
    }

    /// Condition-flag usage, computed from the encoding and cached.
    ///
    /// The instruction is encoded into a scratch word (or its raw bits are
    /// used) and the word is decoded again, so the answer reflects what the
    /// hardware will execute. Falls back to the IR when no encoding exists.
    pub fn eflags(&self) -> EflagsUsage {
        if let Some(cached) = self.eflags.get() {
            return cached;
        }
        let usage = self.eflags_from_encoding().unwrap_or_else(|| eflags_of(self));
        self.eflags.set(Some(usage));
        usage
    }

    fn eflags_from_encoding(&self) -> Option<EflagsUsage> {
        if self.opcode == Opcode::Label {
            return None;
        }
        let pc = self.translation.unwrap_or(0);
        let word = match self.raw_word() {
            Ok(word) if self.raw_valid => word,
            _ => {
                let mut scratch = [0u8; 4];
                match encode::encode(self, &mut scratch, pc) {
                    Ok(4) => u32::from_le_bytes(scratch),
                    _ => return None,
                }
            }
        };
        decode::decode_word(word, pc).ok().map(|d| eflags_of(&d))
    }
}

/// Flag usage implied by opcode, condition and operands.
fn eflags_of(instr: &Instruction) -> EflagsUsage {
    use Opcode::*;
    let op = instr.opcode;
    let mut usage = if op.is_unconditional() {
        EflagsUsage::empty()
    } else {
        instr.cond.reads()
    };
    let s = op.has_s_flag() && instr.flags.contains(InstrFlags::S);
    match op {
        AndReg | EorReg | OrrReg | BicReg | MovReg | MvnReg | AndRsr | EorRsr | OrrRsr
        | BicRsr | MovRsr | MvnRsr | AndImm | EorImm | OrrImm | BicImm | MovImm | MvnImm
            if s =>
        {
            usage |= EflagsUsage::WRITE_NZC;
        }
        TstReg | TeqReg | TstRsr | TeqRsr | TstImm | TeqImm => usage |= EflagsUsage::WRITE_NZC,
        CmpReg | CmnReg | CmpRsr | CmnRsr | CmpImm | CmnImm => usage |= EflagsUsage::WRITE_NZCV,
        AdcReg | SbcReg | RscReg | AdcRsr | SbcRsr | RscRsr | AdcImm | SbcImm | RscImm => {
            usage |= EflagsUsage::READ_C;
            if s {
                usage |= EflagsUsage::WRITE_NZCV;
            }
        }
        SubReg | RsbReg | AddReg | SubRsr | RsbRsr | AddRsr | SubImm | RsbImm | AddImm if s => {
            usage |= EflagsUsage::WRITE_NZCV;
        }
        Mul | Mla | Umull | Umlal | Smull | Smlal if s => {
            usage |= EflagsUsage::WRITE_N | EflagsUsage::WRITE_Z;
        }
        Qadd | Qsub | Qdadd | Qdsub | Smuad | Smusd | Smlad | Smlsd => {
            usage |= EflagsUsage::WRITE_Q;
        }
        Mrs => usage |= EflagsUsage::READ_ALL,
        MsrReg | MsrImm => {
            if let Some(Operand::Mask(mask)) = instr.srcs.first() {
                if mask & MASK_NZCVQ != 0 {
                    usage |= EflagsUsage::WRITE_NZCVQ;
                }
                if mask & MASK_G != 0 {
                    usage |= EflagsUsage::WRITE_GE;
                }
            }
        }
        Vmrs if instr.dsts.first() == Some(&Operand::Reg(Reg::PC)) => {
            usage |= EflagsUsage::WRITE_NZCV;
        }
        _ => {}
    }
    usage
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        if self.opcode == Opcode::Undecoded || other.opcode == Opcode::Undecoded {
            return self.opcode == other.opcode && self.raw == other.raw;
        }
        self.opcode == other.opcode
            && self.cond == other.cond
            && self.flags == other.flags
            && self.shift == other.shift
            && self.dsts == other.dsts
            && self.srcs == other.srcs
    }
}

impl Eq for Instruction {}

// ── Display ──────────────────────────────────────────────────────────────

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode;
        if op == Opcode::Undecoded {
            f.write_str(".word")?;
            if let Ok(word) = self.raw_word() {
                write!(f, " {:#010x}", word)?;
            }
            return Ok(());
        }
        if op == Opcode::Label {
            return write!(f, "label:");
        }
        let (base, suffix) = match op.name().split_once('.') {
            Some((base, suffix)) => (base, suffix),
            None => (op.name(), ""),
        };
        f.write_str(base)?;
        if op.has_s_flag() && self.flags.contains(InstrFlags::S) {
            f.write_str("s")?;
        }
        if !op.is_unconditional() {
            f.write_str(self.cond.suffix())?;
        }
        if !suffix.is_empty() {
            write!(f, ".{}", suffix)?;
        }

        let family = op.family();
        let mut ops: Vec<Operand> = Vec::new();
        match family {
            Some(Family::LoadStoreMultiple) => {
                ops.push(self.dsts[0]);
                ops.extend_from_slice(&self.srcs);
                if op.is_load() {
                    ops.swap(0, 1);
                }
            }
            Some(Family::PushPop) => {
                let list = if op == Opcode::Push {
                    self.srcs[0]
                } else {
                    self.dsts[0]
                };
                ops.push(list);
            }
            Some(Family::Branch | Family::BranchLinkExchangeImm) => ops.push(self.srcs[0]),
            _ if op == Opcode::BlxReg => ops.push(self.srcs[0]),
            _ if op.is_store() => {
                ops.extend(self.dsts.iter().filter(|o| !o.is_memory_reference()));
                ops.extend_from_slice(&self.srcs);
                ops.extend(self.dsts.iter().filter(|o| o.is_memory_reference()));
            }
            _ => {
                ops.extend_from_slice(&self.dsts);
                ops.extend_from_slice(&self.srcs);
            }
        }

        let shifted = op.has_shift();
        let last = ops.len().saturating_sub(1);
        let mut first = true;
        for (i, operand) in ops.iter().enumerate() {
            if operand.is_null() {
                continue;
            }
            f.write_str(if first { " " } else { ", " })?;
            first = false;
            if shifted && i == last && i >= 2 && (self.shift.is_some() || operand.is_immed()) {
                let shift = self.shift.unwrap_or(ShiftType::Lsl);
                write!(f, "{} ", shift.name())?;
            }
            if operand.is_memory_reference() && self.writes_back() {
                if let Operand::BaseDisp(bd) = operand {
                    if self.flags.contains(InstrFlags::P) {
                        write!(f, "{}!", operand)?;
                    } else if bd.has_index() {
                        let sign = if bd.subtract_index { "-" } else { "" };
                        write!(f, "[{}], {}{}", bd.base, sign, bd.index)?;
                    } else {
                        write!(f, "[{}], #{}", bd.base, bd.disp)?;
                    }
                    continue;
                }
                if family == Some(Family::LoadStoreMultiple) {
                    write!(f, "{}!", operand.base())?;
                    continue;
                }
            }
            if family == Some(Family::LoadStoreMultiple) && operand.is_memory_reference() {
                write!(f, "{}", operand.base())?;
                continue;
            }
            write!(f, "{}", operand)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use alloc::format;

    #[test]
    fn mutation_invalidates_raw_bits() {
        let mut instr = create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2);
        instr.set_raw_bits(&0xE081_0002u32.to_le_bytes());
        instr.set_our_mangling(true);
        assert!(instr.raw_bits_valid());
        assert_eq!(instr.level(), DecodeLevel::Operands);

        instr.set_src(1, Operand::reg(Reg::R3));
        assert!(!instr.raw_bits_valid());
        assert!(!instr.our_mangling());
        assert_eq!(instr.level(), DecodeLevel::Synthetic);
    }

    #[test]
    fn raw_instruction_upgrades() {
        let mut instr = Instruction::from_raw(&0xE081_0002u32.to_le_bytes(), 0x8000);
        assert_eq!(instr.level(), DecodeLevel::RawBits);
        assert_eq!(instr.opcode(), Opcode::Undecoded);
        instr.decode_opcode().unwrap();
        assert_eq!(instr.opcode(), Opcode::AddReg);
        assert_eq!(instr.level(), DecodeLevel::Opcode);
        instr.decode_operands().unwrap();
        assert_eq!(instr.dst(0), Operand::reg(Reg::R0));
        assert_eq!(instr.src(1), Operand::reg(Reg::R2));
        assert!(instr.raw_bits_valid());
    }

    #[test]
    fn modifying_raw_instruction_decodes_first() {
        let mut instr = Instruction::from_raw(&0xE081_0002u32.to_le_bytes(), 0);
        instr.set_cond(Cond::Ne);
        assert_eq!(instr.opcode(), Opcode::AddReg);
        assert_eq!(instr.num_srcs(), 2);
        assert!(!instr.raw_bits_valid());
    }

    #[test]
    fn lengths() {
        assert_eq!(Instruction::label().length(), 0);
        assert_eq!(create::nop().length(), 4);
        assert_eq!(Instruction::from_raw(&[1, 2, 3, 4], 0).length(), 4);
    }

    #[test]
    fn eflags_from_encoding() {
        let adds = create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2)
            .with_flags(InstrFlags::S)
            .with_cond(Cond::Eq);
        assert_eq!(
            adds.eflags(),
            EflagsUsage::READ_Z | EflagsUsage::WRITE_NZCV
        );
        let adc = create::dp_reg(Opcode::AdcReg, Reg::R0, Reg::R1, Reg::R2);
        assert_eq!(adc.eflags(), EflagsUsage::READ_C);
        let cmp = create::dp_test_imm(Opcode::CmpImm, Reg::R0, 1);
        assert_eq!(cmp.eflags(), EflagsUsage::WRITE_NZCV);
        assert_eq!(create::dmb(0xF).eflags(), EflagsUsage::empty());
    }

    #[test]
    fn eflags_cache_is_invalidated() {
        let mut mov = create::dp_move_imm(Opcode::MovImm, Reg::R0, 1);
        assert_eq!(mov.eflags(), EflagsUsage::empty());
        mov.set_flags(InstrFlags::S);
        assert_eq!(mov.eflags(), EflagsUsage::WRITE_NZC);
    }

    #[test]
    fn register_queries() {
        let ldr = create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, 4, AddrMode::PreIndex);
        assert!(ldr.writes_reg(Reg::R0));
        assert!(ldr.writes_reg(Reg::R1));
        assert!(ldr.reads_reg(Reg::R1));
        assert!(!ldr.reads_reg(Reg::R0));
        let str_ = create::load_store_imm(Opcode::StrImm, Reg::R0, Reg::R1, 4, AddrMode::Offset);
        assert!(str_.reads_reg(Reg::R0));
        assert!(str_.reads_reg(Reg::R1));
        assert!(!str_.writes_reg(Reg::R1));
        let pop = create::pop(&[Reg::R4, Reg::PC]);
        assert!(pop.is_return());
        assert!(pop.is_cti());
        assert!(pop.writes_reg(Reg::SP));
    }

    #[test]
    fn branch_classification() {
        let b = create::b(Operand::Pc(0x1000));
        assert!(b.is_ubr() && b.is_cti() && !b.is_call());
        let bne = create::b(Operand::Pc(0x1000)).with_cond(Cond::Ne);
        assert!(bne.is_cbr());
        assert!(create::bl(Operand::Pc(0)).is_call());
        assert!(create::bx(Reg::LR).is_return());
        assert!(create::bx(Reg::R3).is_mbr());
        let mov_pc = create::dp_move_reg(Opcode::MovReg, Reg::PC, Reg::R0);
        assert!(mov_pc.is_mbr());
    }

    #[test]
    fn equality_ignores_provenance() {
        let a = create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2).with_translation(4);
        let mut b = create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2);
        b.set_note(12);
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_cond(Cond::Ne));
    }

    #[test]
    fn display() {
        let adds = create::dp_reg(Opcode::AddReg, Reg::R3, Reg::R3, Reg::R4)
            .with_flags(InstrFlags::S)
            .with_cond(Cond::Ne);
        assert_eq!(format!("{}", adds), "addsne r3, r3, r4");
        let shifted =
            create::dp_reg_shifted(Opcode::SubReg, Reg::R0, Reg::R1, Reg::R2, ShiftType::Asr, 8);
        assert_eq!(format!("{}", shifted), "sub r0, r1, r2, asr #8");
        let ldr = create::load_store_imm(Opcode::LdrImm, Reg::R0, Reg::R1, 4, AddrMode::PostIndex);
        assert_eq!(format!("{}", ldr), "ldr r0, [r1], #4");
        let str_ = create::load_store_imm(Opcode::StrImm, Reg::R0, Reg::SP, -8, AddrMode::PreIndex);
        assert_eq!(format!("{}", str_), "str r0, [sp, #-8]!");
        assert_eq!(format!("{}", create::push(&[Reg::R4, Reg::LR])), "push {r4, lr}");
        assert_eq!(
            format!("{}", create::vfp_arith(Opcode::VaddD, Reg::D0, Reg::D1, Reg::D2)),
            "vadd.f64 d0, d1, d2"
        );
        assert_eq!(format!("{}", Instruction::from_raw(&[0; 4], 0)), ".word 0x00000000");
    }

    #[test]
    fn addr_mode_flags() {
        for mode in [AddrMode::Offset, AddrMode::PreIndex, AddrMode::PostIndex] {
            assert_eq!(AddrMode::from_flags(mode.flags()), Some(mode));
        }
        assert_eq!(AddrMode::from_flags(InstrFlags::W), None);
    }
}
