//! # arm-ir — A32 Instruction IR
//!
//! `arm-ir` models 32-bit ARM (A32) instructions as opcodes with explicit
//! destination and source operands, encodes them through per-opcode operand
//! templates, decodes raw words back into the same form, and rewrites
//! PC-relative instructions so code can be copied to a new address.
//!
//! ## Quick Start
//!
//! ```rust
//! use arm_ir::{create, encode, Opcode, Reg};
//!
//! let add = create::dp_reg(Opcode::AddReg, Reg::R2, Reg::R2, Reg::R3);
//! let mut buf = [0u8; 4];
//! encode(&add, &mut buf, 0).unwrap();
//! assert_eq!(u32::from_le_bytes(buf), 0xE082_2003);
//! ```
//!
//! ## Features
//!
//! - **Template matching**: every opcode lists the operand shapes it
//!   accepts; the encoder picks the first one the instruction fits.
//! - **Lazy decoding**: raw bytes are kept until an operand is needed, and
//!   unmodified instructions are copied verbatim.
//! - **Relocation**: branch and literal offsets are recomputed for the
//!   address an instruction is encoded at.
//! - **`no_std` + `alloc`**: embeddable in loaders and instrumentation
//!   runtimes.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// Encoders narrow and reinterpret integers between field widths constantly
// and spell bit patterns as dense hex literals.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::redundant_closure_for_method_calls,
    clippy::bool_to_int_with_if,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::too_many_arguments,
    clippy::single_match_else,
    clippy::manual_let_else,
    clippy::unnecessary_wraps,
    clippy::many_single_char_names,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_continue
)]

extern crate alloc;

/// Instruction constructors with the operand layout each opcode expects.
pub mod create;
/// Raw A32 words to instructions.
pub mod decode;
/// Template matching and the per-family bit encoders.
pub mod encode;
/// Error type.
pub mod error;
/// Instructions, condition codes, flags and decode levels.
pub mod instr;
/// Ordered instruction lists with stable handles.
pub mod instrlist;
/// Opcode table: families, flags and classification.
pub mod opcode;
/// Operands.
pub mod opnd;
/// Register identifiers.
pub mod reg;
/// PC-relative to absolute rewriting.
pub mod rewrite;
/// Operand sizes and immediate field checks.
pub mod size;
/// Per-opcode operand templates.
pub mod template;

// Re-exports
pub use decode::{decode, decode_opcode, decode_sizeof, decode_word};
pub use encode::{encode, encode_to_copy, EncodeContext, EncodeOptions, EncodeStats, IsaMode};
pub use error::IrError;
pub use instr::{AddrMode, Cond, DecodeLevel, EflagsUsage, InstrFlags, Instruction, ShiftType};
pub use instrlist::{InstrId, InstrList};
pub use opcode::Opcode;
pub use opnd::{BaseDisp, Operand};
pub use reg::{Reg, RegBank};
pub use rewrite::{RewriteOptions, RewriteStats};
pub use size::OpndSize;
