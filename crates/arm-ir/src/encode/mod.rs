//! Instruction encoding.
//!
//! The driver picks the first template in the opcode's chain that accepts
//! the instruction, builds the bits every layout shares, and hands the word
//! to the switch for the opcode's instruction type. That switch dispatches
//! on the opcode's [`Family`](crate::opcode::Family), whose encoder packs
//! the operands. Words are written least-significant byte first.
//!
//! Instructions with valid raw bits skip all of this and are copied
//! verbatim, with PC-relative branch and literal offsets re-aimed when the
//! copy lands at a different address than the original.

pub mod check;
pub(crate) mod common;

mod branch;
mod coprocessor;
mod data_processing;
mod load_store;
mod multiple;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::decode;
use crate::error::IrError;
use crate::instr::Instruction;
use crate::instrlist::{InstrId, InstrList};
use crate::opcode::{InstrType, Opcode, S_BIT};
use crate::opnd::Operand;

pub use check::{encoding_possible, get_encoding_info, instr_is_encoding_possible, opnd_type_ok};

pub(crate) use branch::unpack_offset;

// ── Options ──────────────────────────────────────────────────────────────

/// Instruction set an [`EncodeContext`] encodes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IsaMode {
    /// 32-bit A32.
    #[default]
    Arm,
    /// T32; no encoder is registered for it.
    Thumb,
}

impl IsaMode {
    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            IsaMode::Arm => "arm",
            IsaMode::Thumb => "thumb",
        }
    }
}

/// Encoder configuration.
///
/// # Examples
///
/// ```
/// use arm_ir::EncodeOptions;
///
/// let opts = EncodeOptions::default().check_reachable(false);
/// assert!(!opts.checks_reachability());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodeOptions {
    check_reachable: bool,
    verify_length: bool,
    isa: IsaMode,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            check_reachable: true,
            verify_length: true,
            isa: IsaMode::Arm,
        }
    }
}

impl EncodeOptions {
    /// Report out-of-range targets instead of truncating them.
    /// Default: `true`.
    pub fn check_reachable(mut self, check: bool) -> Self {
        self.check_reachable = check;
        self
    }

    /// Assert that every encoded word decodes to the length written.
    /// Default: `true`.
    pub fn verify_length(mut self, verify: bool) -> Self {
        self.verify_length = verify;
        self
    }

    /// Instruction set to encode for. Default: [`IsaMode::Arm`].
    pub fn isa(mut self, isa: IsaMode) -> Self {
        self.isa = isa;
        self
    }

    /// Whether out-of-range targets are errors.
    pub fn checks_reachability(&self) -> bool {
        self.check_reachable
    }

    /// Whether encoded lengths are asserted.
    pub fn verifies_length(&self) -> bool {
        self.verify_length
    }

    /// Instruction set to encode for.
    pub fn isa_mode(&self) -> IsaMode {
        self.isa
    }
}

/// Counters accumulated by an [`EncodeContext`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodeStats {
    /// Instructions encoded from operands.
    pub encoded: usize,
    /// Instructions copied from valid raw bits.
    pub copied: usize,
    /// Copied instructions whose PC-relative offset was re-aimed.
    pub retargeted: usize,
    /// Bytes written.
    pub bytes: usize,
}

/// Per-caller encoding state. Not shared between threads.
#[derive(Debug, Clone, Default)]
pub struct EncodeContext {
    options: EncodeOptions,
    stats: EncodeStats,
}

impl EncodeContext {
    /// A context with `options` and zeroed statistics.
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            options,
            stats: EncodeStats::default(),
        }
    }

    /// Options this context encodes with.
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Counters accumulated since the context was created.
    pub fn stats(&self) -> &EncodeStats {
        &self.stats
    }

    /// Encoder registered for the configured instruction set.
    pub fn encoder(&self) -> Result<&'static dyn IsaEncoder, IrError> {
        match self.options.isa {
            IsaMode::Arm => Ok(&A32Encoder),
            isa => Err(IrError::UnsupportedIsa { isa }),
        }
    }
}

// ── Encode site ──────────────────────────────────────────────────────────

/// Where an instruction is being encoded.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSite<'a> {
    /// Address the word will execute at.
    pub final_pc: u32,
    /// Note of the instruction being encoded.
    pub note: i64,
    /// Report out-of-range targets instead of truncating.
    pub check_reachable: bool,
    list: Option<&'a InstrList>,
}

impl<'a> EncodeSite<'a> {
    pub fn new(final_pc: u32, note: i64, check_reachable: bool, list: Option<&'a InstrList>) -> Self {
        Self {
            final_pc,
            note,
            check_reachable,
            list,
        }
    }

    /// Absolute address of a code target or instruction-relative literal.
    ///
    /// An instruction reference resolves to
    /// `final_pc + (target.note - note)`.
    pub fn target_address(&self, op: &Operand) -> Result<u32, IrError> {
        match op {
            Operand::Pc(pc) => Ok(*pc),
            Operand::Instr(id) => self.instr_address(*id),
            Operand::MemInstr { instr, disp, .. } => {
                Ok(self.instr_address(*instr)?.wrapping_add(*disp as u32))
            }
            other => unreachable!("{:?} is not a code target", other),
        }
    }

    fn instr_address(&self, id: InstrId) -> Result<u32, IrError> {
        let target = self
            .list
            .and_then(|list| list.get(id))
            .ok_or(IrError::UnresolvedTarget { target: id })?;
        Ok((i64::from(self.final_pc) + target.note() - self.note) as u32)
    }

    /// Offset of `target` from the PC read-ahead address (`final_pc + 8`).
    pub fn pc_offset(&self, target: u32) -> i64 {
        pc_relative_offset(self.final_pc, target)
    }
}

/// Offset of `target` from the read-ahead PC of an instruction at `pc`.
pub(crate) fn pc_relative_offset(pc: u32, target: u32) -> i64 {
    i64::from(target) - (i64::from(pc) + 8)
}

/// Fit a signed offset into a field of magnitude `max`.
///
/// Out of range is an error when reachability is checked; otherwise the
/// caller has vouched for the target and the field is truncated.
pub(crate) fn check_range(
    opcode: Opcode,
    offset: i64,
    min: i64,
    max: i64,
    check_reachable: bool,
) -> Result<(), IrError> {
    if check_reachable && !(min..=max).contains(&offset) {
        return Err(IrError::TargetUnreachable {
            opcode,
            offset,
            max,
        });
    }
    Ok(())
}

/// A value constraint the template table cannot express.
pub(crate) fn invalid(opcode: Opcode, detail: impl Into<String>) -> IrError {
    IrError::InvalidOperand {
        opcode,
        detail: detail.into(),
    }
}

// ── ISA encoders ─────────────────────────────────────────────────────────

/// An instruction-set encoder.
pub trait IsaEncoder {
    /// Instruction set this encoder produces.
    fn isa(&self) -> IsaMode;

    /// Encode one instruction to a machine word.
    fn encode_word(&self, instr: &Instruction, site: &EncodeSite<'_>) -> Result<u32, IrError>;
}

/// The A32 encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct A32Encoder;

impl IsaEncoder for A32Encoder {
    fn isa(&self) -> IsaMode {
        IsaMode::Arm
    }

    fn encode_word(&self, instr: &Instruction, site: &EncodeSite<'_>) -> Result<u32, IrError> {
        let opcode = instr.opcode();
        let Some(info) = opcode.info() else {
            return Err(IrError::NoEncoding { opcode });
        };
        if get_encoding_info(instr).is_none() {
            return Err(IrError::NoEncoding { opcode });
        }
        let word = common::encode_common_bits(instr, &info) | common::encode_bits_7_to_0(instr, &info);
        match info.ty {
            InstrType::DataProcessingAndEls => {
                data_processing::encode_data_processing_and_els(word, instr, &info, site)
            }
            InstrType::DataProcessingImmediate => {
                data_processing::encode_data_processing_immediate(word, instr, &info, site)
            }
            InstrType::LoadStore1 => load_store::encode_load_store_1(word, instr, &info, site),
            InstrType::LoadStore2AndMedia => {
                load_store::encode_load_store_2_and_media(word, instr, &info, site)
            }
            InstrType::LoadStoreMultiple => {
                multiple::encode_load_store_multiple(word, instr, &info, site)
            }
            InstrType::Branch => branch::encode_branch(word, instr, &info, site),
            InstrType::CoprocessorDataMovement => {
                coprocessor::encode_coprocessor_data_movement(word, instr, &info, site)
            }
            InstrType::AdvancedCoprocessorAndSyscall => {
                coprocessor::encode_advanced_coprocessor_and_syscall(word, instr, &info, site)
            }
        }
    }
}

// ── Driver ───────────────────────────────────────────────────────────────

/// Encode `instr` into `dest` as if it executes at `dest_pc`.
///
/// Returns the number of bytes written. Instruction references cannot be
/// resolved without a list and fail with [`IrError::UnresolvedTarget`].
///
/// # Examples
///
/// ```
/// use arm_ir::{create, encode, Opcode, Reg};
///
/// let add = create::dp_reg(Opcode::AddReg, Reg::R0, Reg::R1, Reg::R2);
/// let mut buf = [0u8; 4];
/// assert_eq!(encode(&add, &mut buf, 0x8000)?, 4);
/// assert_eq!(u32::from_le_bytes(buf), 0xE081_0002);
/// # Ok::<(), arm_ir::IrError>(())
/// ```
pub fn encode(instr: &Instruction, dest: &mut [u8], dest_pc: u32) -> Result<usize, IrError> {
    let mut ctx = EncodeContext::default();
    encode_to_copy(&mut ctx, instr, None, dest, dest_pc)
}

/// Encode `instr` into `copy`, where it will execute at `final_pc`.
///
/// `list` resolves instruction references; their notes must be laid out
/// (see [`InstrList::assign_notes`]).
pub fn encode_to_copy(
    ctx: &mut EncodeContext,
    instr: &Instruction,
    list: Option<&InstrList>,
    copy: &mut [u8],
    final_pc: u32,
) -> Result<usize, IrError> {
    if instr.opcode() == Opcode::Label {
        return Ok(0);
    }

    if let Some(raw) = instr.raw_bits() {
        let len = raw.len();
        if copy.len() < len {
            return Err(IrError::BufferTooSmall {
                needed: len,
                available: copy.len(),
            });
        }
        copy[..len].copy_from_slice(raw);
        if let (Some(from), [b0, b1, b2, b3]) = (instr.translation(), raw) {
            if from != final_pc {
                let word = u32::from_le_bytes([*b0, *b1, *b2, *b3]);
                let check = ctx.options.check_reachable;
                if let Some(patched) = retarget_raw_word(word, from, final_pc, check)? {
                    copy[..4].copy_from_slice(&patched.to_le_bytes());
                    ctx.stats.retargeted += 1;
                }
            }
        }
        ctx.stats.copied += 1;
        ctx.stats.bytes += len;
        return Ok(len);
    }

    if !instr.operands_valid() {
        return Err(IrError::OperandsNotDecoded);
    }
    if copy.len() < 4 {
        return Err(IrError::BufferTooSmall {
            needed: 4,
            available: copy.len(),
        });
    }

    let site = EncodeSite::new(final_pc, instr.note(), ctx.options.check_reachable, list);
    let word = ctx.encoder()?.encode_word(instr, &site)?;
    let bytes = word.to_le_bytes();
    if ctx.options.verify_length {
        let decoded = decode::decode_sizeof(&bytes);
        assert_eq!(
            decoded,
            Some(bytes.len()),
            "encoded {} as {:#010x}, which does not decode to one instruction",
            instr,
            word
        );
    }
    copy[..4].copy_from_slice(&bytes);
    log::trace!("{:#010x}: {:#010x}  {}", final_pc, word, instr);
    ctx.stats.encoded += 1;
    ctx.stats.bytes += 4;
    Ok(4)
}

/// Re-aim the PC-relative offset of a copied word. `None` if the word has
/// no PC-relative offset.
fn retarget_raw_word(word: u32, from: u32, to: u32, check: bool) -> Result<Option<u32>, IrError> {
    let Ok(opcode) = decode::decode_opcode(word) else {
        return Ok(None);
    };
    match opcode {
        Opcode::B | Opcode::Bl | Opcode::BlxImm => {
            branch::retarget_branch_word(opcode, word, from, to, check).map(Some)
        }
        Opcode::LdrLit
        | Opcode::LdrbLit
        | Opcode::LdrhLit
        | Opcode::LdrsbLit
        | Opcode::LdrshLit
        | Opcode::LdrdLit => {
            load_store::retarget_literal_word(opcode, word, from, to, check).map(Some)
        }
        Opcode::Adr => data_processing::retarget_adr_word(opcode, word, from, to).map(Some),
        // sub rd, pc, #imm decodes as a plain subtraction
        Opcode::SubImm if word & ((0xF << 16) | S_BIT) == 0xF << 16 => {
            data_processing::retarget_adr_word(opcode, word, from, to).map(Some)
        }
        _ => Ok(None),
    }
}

// ── Lists ────────────────────────────────────────────────────────────────

impl InstrList {
    /// Lay out and encode the whole list into `copy`, where its first byte
    /// will execute at `final_pc`.
    ///
    /// Notes are reassigned to byte offsets first. The layout must fit
    /// `max_len` (when given) and the buffer. The first failing instruction
    /// aborts the batch.
    pub fn encode_to_copy(
        &mut self,
        ctx: &mut EncodeContext,
        copy: &mut [u8],
        final_pc: u32,
        max_len: Option<usize>,
    ) -> Result<usize, IrError> {
        let total = self.assign_notes();
        if let Some(max) = max_len {
            if total > max {
                return Err(IrError::ExceedsMaxLength { length: total, max });
            }
        }
        if total > copy.len() {
            return Err(IrError::BufferTooSmall {
                needed: total,
                available: copy.len(),
            });
        }

        let list: &InstrList = self;
        let mut offset = 0usize;
        for instr in list.iter() {
            let pc = final_pc.wrapping_add(offset as u32);
            offset += encode_to_copy(ctx, instr, Some(list), &mut copy[offset..], pc)?;
        }
        log::debug!(
            "encoded {} instructions ({} bytes) at {:#010x}",
            list.len(),
            offset,
            final_pc
        );
        Ok(offset)
    }

    /// Encode the list into `buf` at `pc`.
    pub fn encode(
        &mut self,
        ctx: &mut EncodeContext,
        buf: &mut [u8],
        pc: u32,
    ) -> Result<usize, IrError> {
        self.encode_to_copy(ctx, buf, pc, None)
    }

    /// Encode the list into a fresh buffer at `pc`.
    pub fn encode_to_vec(&mut self, ctx: &mut EncodeContext, pc: u32) -> Result<Vec<u8>, IrError> {
        let mut buf = vec![0u8; self.assign_notes()];
        let len = self.encode(ctx, &mut buf, pc)?;
        buf.truncate(len);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create;
    use crate::instr::Cond;
    use crate::reg::Reg;

    fn word(instr: &Instruction) -> u32 {
        let mut buf = [0u8; 4];
        assert_eq!(encode(instr, &mut buf, 0).unwrap(), 4);
        u32::from_le_bytes(buf)
    }

    #[test]
    fn add_with_one_based_registers() {
        // add r2, r2, r3: IR ids 3, 3, 4 pack as 0010, 0010, 0011.
        let add = create::dp_reg(
            Opcode::AddReg,
            Reg::from_id(3).unwrap(),
            Reg::from_id(3).unwrap(),
            Reg::from_id(4).unwrap(),
        );
        let mut buf = [0u8; 4];
        encode(&add, &mut buf, 0).unwrap();
        assert_eq!(buf, [0x03, 0x20, 0x82, 0xE0]);
        assert_eq!(u32::from_be_bytes([buf[3], buf[2], buf[1], buf[0]]), 0xE082_2003);
    }

    #[test]
    fn label_encodes_to_nothing() {
        let mut buf = [0u8; 0];
        assert_eq!(encode(&create::label(), &mut buf, 0).unwrap(), 0);
    }

    #[test]
    fn buffer_too_small() {
        let mut buf = [0u8; 2];
        let err = encode(&create::nop(), &mut buf, 0).unwrap_err();
        assert_eq!(
            err,
            IrError::BufferTooSmall {
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn no_template_is_an_error() {
        let bad = Instruction::build(Opcode::AddReg, &[Operand::reg(Reg::R0)], &[]);
        assert_eq!(
            encode(&bad, &mut [0u8; 4], 0).unwrap_err(),
            IrError::NoEncoding {
                opcode: Opcode::AddReg
            }
        );
    }

    #[test]
    fn raw_bits_pass_through() {
        let raw = Instruction::from_raw(&0xE7F0_00F0u32.to_le_bytes(), 0x1000);
        let mut ctx = EncodeContext::default();
        let mut buf = [0u8; 4];
        assert_eq!(encode_to_copy(&mut ctx, &raw, None, &mut buf, 0x2000).unwrap(), 4);
        assert_eq!(u32::from_le_bytes(buf), 0xE7F0_00F0);
        assert_eq!(ctx.stats().copied, 1);
        assert_eq!(ctx.stats().retargeted, 0);
    }

    #[test]
    fn copied_branch_is_retargeted() {
        // b 0x1100 at 0x1000 → offset 0xF8 → imm24 0x3E.
        let raw = Instruction::from_raw(&0xEA00_003Eu32.to_le_bytes(), 0x1000);
        let mut ctx = EncodeContext::default();
        let mut buf = [0u8; 4];
        encode_to_copy(&mut ctx, &raw, None, &mut buf, 0x1080).unwrap();
        // From 0x1080 the same target is 0x78 ahead of pc+8 → imm24 0x1E.
        assert_eq!(u32::from_le_bytes(buf), 0xEA00_001E);
        assert_eq!(ctx.stats().retargeted, 1);
    }

    #[test]
    fn copied_literal_load_is_retargeted() {
        // ldr r0, [pc, #8] at 0x1000 reads 0x1010.
        let raw = Instruction::from_raw(&0xE59F_0008u32.to_le_bytes(), 0x1000);
        let mut buf = [0u8; 4];
        let mut ctx = EncodeContext::default();
        encode_to_copy(&mut ctx, &raw, None, &mut buf, 0x1020).unwrap();
        // From 0x1020, 0x1010 is 0x18 behind pc+8: U clear, imm12 0x18.
        assert_eq!(u32::from_le_bytes(buf), 0xE51F_0018);
    }

    #[test]
    fn undecoded_without_raw_bits() {
        let mut raw = Instruction::from_raw(&[0, 0, 0, 0], 0);
        raw.set_raw_bits_valid(false);
        assert_eq!(
            encode(&raw, &mut [0u8; 4], 0).unwrap_err(),
            IrError::OperandsNotDecoded
        );
    }

    #[test]
    fn thumb_has_no_encoder() {
        let mut ctx = EncodeContext::new(EncodeOptions::default().isa(IsaMode::Thumb));
        let err = encode_to_copy(&mut ctx, &create::nop(), None, &mut [0u8; 4], 0).unwrap_err();
        assert_eq!(err, IrError::UnsupportedIsa { isa: IsaMode::Thumb });
    }

    #[test]
    fn list_resolves_instruction_references() {
        let mut list = InstrList::new();
        let top = list.append(create::label());
        list.append(create::nop());
        list.append(create::b(Operand::Instr(top)).with_cond(Cond::Ne));
        let mut ctx = EncodeContext::default();
        let bytes = list.encode_to_vec(&mut ctx, 0x4000).unwrap();
        assert_eq!(bytes.len(), 8);
        // bne back to 0x4000 from 0x4004: offset -12 → imm24 0xFFFFFD.
        let bne = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(bne, 0x1AFF_FFFD);
        assert_eq!(ctx.stats().encoded, 2);
    }

    #[test]
    fn dangling_reference() {
        let mut list = InstrList::new();
        let gone = list.append(create::nop());
        list.append(create::b(Operand::Instr(gone)));
        list.remove(gone);
        let err = list.encode_to_vec(&mut EncodeContext::default(), 0).unwrap_err();
        assert_eq!(err, IrError::UnresolvedTarget { target: gone });
    }

    #[test]
    fn batch_respects_max_length() {
        let mut list: InstrList = [create::nop(), create::nop()].into_iter().collect();
        let mut buf = [0u8; 16];
        let err = list
            .encode_to_copy(&mut EncodeContext::default(), &mut buf, 0, Some(4))
            .unwrap_err();
        assert_eq!(err, IrError::ExceedsMaxLength { length: 8, max: 4 });
    }

    #[test]
    fn unconditional_opcode_ignores_cond() {
        assert_eq!(word(&create::dmb(0xF).with_cond(Cond::Eq)), 0xF57F_F05F);
    }
}
