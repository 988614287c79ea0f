//! PC-relative to absolute rewriting.
//!
//! An instruction that reads `pc` observes the address it executes at. Once
//! a list is copied elsewhere that value changes, so this pass replaces the
//! PC reads it understands with constants built in a scratch register from
//! the instruction's original address (its translation).
//!
//! ## Rewrites
//!
//! - **Literal loads** (`ldr rt, [pc, #disp]` and its byte, halfword,
//!   signed and dual forms): the literal's absolute address is built in the
//!   scratch register and the load becomes its immediate-offset form
//!   `[scratch, #0]`.
//! - **`adr rd, #imm`**: replaced by `add rd, scratch, #0` with the computed
//!   address in the scratch register.
//! - **`add`/`sub` reading `pc`**: the `pc` operand is replaced by the
//!   scratch register holding the instruction address plus 8.
//!
//! The constant is built one byte at a time (`mov`, then three `orr`s), and
//! the whole sequence is bracketed by `push`/`pop` of a scratch register
//! pair. No liveness analysis is done: both registers are always saved.
//!
//! Other instructions that read `pc` and are not control transfers are left
//! to be copied verbatim with a warning. Their meaning changes if the copy
//! runs at a different address.

use crate::create;
use crate::error::IrError;
use crate::instr::{InstrFlags, Instruction};
use crate::instrlist::{InstrId, InstrList};
use crate::opcode::Opcode;
use crate::opnd::Operand;
use crate::reg::Reg;
use crate::size::OpndSize;

/// Read-ahead distance of the A32 PC.
const PC_READ_AHEAD: u32 = 8;

/// Scratch registers used by [`InstrList::rewrite_relative_to_absolute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewriteOptions {
    /// Preferred pair; the first register receives the constant.
    pub scratch: (Reg, Reg),
    /// Pair used when the instruction itself names a preferred register.
    pub fallback: (Reg, Reg),
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            scratch: (Reg::R10, Reg::R11),
            fallback: (Reg::R8, Reg::R9),
        }
    }
}

impl RewriteOptions {
    /// Set the preferred scratch pair.
    pub fn scratch(mut self, first: Reg, second: Reg) -> Self {
        self.scratch = (first, second);
        self
    }

    /// Set the fallback scratch pair.
    pub fn fallback(mut self, first: Reg, second: Reg) -> Self {
        self.fallback = (first, second);
        self
    }

    fn pair_for(&self, instr: &Instruction) -> Option<(Reg, Reg)> {
        [self.scratch, self.fallback]
            .into_iter()
            .find(|&(a, b)| !instr.uses_reg(a) && !instr.uses_reg(b))
    }
}

/// What a rewrite pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewriteStats {
    /// Literal loads redirected through a scratch register.
    pub literal_loads: usize,
    /// `adr` instructions replaced by an `add`.
    pub address_computations: usize,
    /// `add`/`sub` instructions whose `pc` operand was replaced.
    pub pc_arithmetic: usize,
    /// PC readers left to be copied verbatim.
    pub copied_verbatim: usize,
    /// Instructions the pass could not handle.
    pub skipped: usize,
    /// Instructions inserted around the rewritten ones.
    pub inserted: usize,
}

impl RewriteStats {
    /// Number of rewritten instructions.
    pub fn rewritten(&self) -> usize {
        self.literal_loads + self.address_computations + self.pc_arithmetic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Literal,
    Address,
    Arithmetic,
}

enum Action {
    Keep,
    Verbatim,
    Skip(&'static str),
    Rewrite(Kind),
}

fn classify(instr: &Instruction) -> Action {
    if !instr.reads_reg(Reg::PC) {
        return Action::Keep;
    }
    let opcode = instr.opcode();
    let kind = if opcode.is_load_literal() {
        Kind::Literal
    } else if opcode == Opcode::Adr {
        Kind::Address
    } else if matches!(
        opcode,
        Opcode::AddReg | Opcode::SubReg | Opcode::AddImm | Opcode::SubImm
    ) {
        Kind::Arithmetic
    } else if instr.is_cti() {
        return Action::Keep;
    } else {
        return Action::Verbatim;
    };
    if instr.writes_reg(Reg::PC) {
        Action::Skip("writes pc")
    } else if instr.uses_reg(Reg::SP) {
        // The inserted push moves sp under the instruction.
        Action::Skip("uses sp")
    } else {
        Action::Rewrite(kind)
    }
}

/// `mov s, #b3 << 24` followed by `orr`s of the lower bytes.
fn materialize(reg: Reg, value: u32) -> [Instruction; 4] {
    let [b0, b1, b2, b3] = value.to_le_bytes();
    let byte = |b: u8, shift: u32| i64::from(u32::from(b) << shift);
    [
        create::dp_move_imm(Opcode::MovImm, reg, byte(b3, 24)),
        create::dp_imm(Opcode::OrrImm, reg, reg, byte(b2, 16)),
        create::dp_imm(Opcode::OrrImm, reg, reg, byte(b1, 8)),
        create::dp_imm(Opcode::OrrImm, reg, reg, byte(b0, 0)),
    ]
}

fn mangled(mut instr: Instruction, translation: u32) -> Instruction {
    instr.set_our_mangling(true);
    instr.with_translation(translation)
}

/// Scratch setup for one rewritten instruction.
struct Plan {
    pair: (Reg, Reg),
    value: u32,
    translation: u32,
    replacement: Option<Instruction>,
}

/// Rewrite `instr` in place and describe what must surround it.
fn plan(
    id: InstrId,
    instr: &mut Instruction,
    options: &RewriteOptions,
    stats: &mut RewriteStats,
) -> Result<Option<Plan>, IrError> {
    let kind = match classify(instr) {
        Action::Keep => return Ok(None),
        Action::Verbatim => {
            log::warn!(
                "{} '{}' reads pc and is copied unchanged",
                id,
                instr.opcode()
            );
            instr.set_raw_bits_valid(true);
            stats.copied_verbatim += 1;
            return Ok(None);
        }
        Action::Skip(reason) => {
            log::warn!("{} '{}' not rewritten: {}", id, instr.opcode(), reason);
            stats.skipped += 1;
            return Ok(None);
        }
        Action::Rewrite(kind) => kind,
    };
    let opcode = instr.opcode();
    let translation = instr
        .translation()
        .ok_or(IrError::MissingTranslation { opcode })?;
    let Some(pair) = options.pair_for(instr) else {
        log::warn!("{} '{}' not rewritten: scratch registers in use", id, opcode);
        stats.skipped += 1;
        return Ok(None);
    };
    let (scratch, _) = pair;
    let read_pc = translation.wrapping_add(PC_READ_AHEAD);

    let plan = match kind {
        Kind::Literal => {
            let Some(immediate) = opcode.immediate_form_of_literal() else {
                return Ok(None);
            };
            let value = read_pc.wrapping_add(instr.src(0).disp() as u32);
            let size = opcode.access_size().unwrap_or(OpndSize::Na);
            instr.set_opcode(immediate);
            instr.set_src(0, Operand::base_disp(scratch, 0, size));
            instr.set_flags(InstrFlags::P | InstrFlags::U);
            instr.set_our_mangling(true);
            stats.literal_loads += 1;
            Plan {
                pair,
                value,
                translation,
                replacement: None,
            }
        }
        Kind::Address => {
            let (Some(rd), Some(offset)) = (instr.dst(0).as_reg(), instr.src(0).immed_value())
            else {
                return Ok(None);
            };
            let add = create::dp_imm(Opcode::AddImm, rd, scratch, 0).with_cond(instr.cond());
            stats.address_computations += 1;
            Plan {
                pair,
                value: read_pc.wrapping_add(offset as u32),
                translation,
                replacement: Some(mangled(add, translation)),
            }
        }
        Kind::Arithmetic => {
            instr.replace_reg(Reg::PC, scratch);
            instr.set_our_mangling(true);
            stats.pc_arithmetic += 1;
            Plan {
                pair,
                value: read_pc,
                translation,
                replacement: None,
            }
        }
    };
    log::debug!(
        "{} '{}' rewritten through {} = {:#010x}",
        id,
        opcode,
        scratch,
        plan.value
    );
    Ok(Some(plan))
}

impl InstrList {
    /// Rewrite every understood PC read into a PC-independent sequence.
    ///
    /// Raw instructions are decoded first; words that do not decode are
    /// left alone. Labels and control transfers are never touched.
    ///
    /// # Errors
    ///
    /// [`IrError::MissingTranslation`] if an instruction to rewrite has no
    /// original address. Instructions before it have already been
    /// rewritten.
    pub fn rewrite_relative_to_absolute(
        &mut self,
        options: &RewriteOptions,
    ) -> Result<RewriteStats, IrError> {
        let mut stats = RewriteStats::default();
        for id in self.ids() {
            let plan = {
                let Some(instr) = self.get_mut(id) else {
                    continue;
                };
                if instr.opcode() == Opcode::Label {
                    continue;
                }
                if let Err(err) = instr.decode_operands() {
                    log::warn!("{} left as is: {}", id, err);
                    stats.skipped += 1;
                    continue;
                }
                plan(id, instr, options, &mut stats)?
            };
            if let Some(plan) = plan {
                self.surround(id, plan, &mut stats);
            }
        }
        log::debug!("rewrite: {:?}", stats);
        Ok(stats)
    }

    fn surround(&mut self, id: InstrId, plan: Plan, stats: &mut RewriteStats) {
        let (first, second) = plan.pair;
        let mut before = alloc::vec![create::push(&[first, second])];
        before.extend(materialize(first, plan.value));
        for instr in before {
            if self.insert_before(id, mangled(instr, plan.translation)).is_some() {
                stats.inserted += 1;
            }
        }
        let restore = mangled(create::pop(&[first, second]), plan.translation);
        if self.insert_after(id, restore).is_some() {
            stats.inserted += 1;
        }
        if let Some(replacement) = plan.replacement {
            self.replace(id, replacement);
        }
    }
}
