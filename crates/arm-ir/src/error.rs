//! Error types for encoding, decoding and list rewriting.

use alloc::string::String;
use core::fmt;

use crate::encode::IsaMode;
use crate::instrlist::InstrId;
use crate::opcode::Opcode;

/// Failure raised by the encoder, the decoder or the rewrite pass.
///
/// Only conditions a correct caller can legitimately run into are reported
/// here. Malformed IR (an operand slot out of range, an opcode routed to the
/// wrong family) is a programming error and panics instead.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IrError {
    /// No template in the opcode's chain accepts the instruction's operands.
    NoEncoding {
        /// The opcode whose template chain was exhausted.
        opcode: Opcode,
    },

    /// A PC-relative target lies outside the signed offset field.
    TargetUnreachable {
        /// The opcode being encoded.
        opcode: Opcode,
        /// Byte offset from the PC read-ahead address to the target.
        offset: i64,
        /// Largest representable magnitude.
        max: i64,
    },

    /// An instruction reference names an instruction that is not in the list.
    UnresolvedTarget {
        /// The dangling handle.
        target: InstrId,
    },

    /// The operands matched a template but violate a value constraint that
    /// the template cannot express (register pairing, alignment, field overlap).
    InvalidOperand {
        /// The opcode being encoded.
        opcode: Opcode,
        /// Description of the violated constraint.
        detail: String,
    },

    /// The destination buffer cannot hold the encoded bytes.
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// The laid-out list is larger than the caller's size bound.
    ExceedsMaxLength {
        /// Total size of the list in bytes.
        length: usize,
        /// The configured bound.
        max: usize,
    },

    /// The encode context selects an instruction set with no registered encoder.
    UnsupportedIsa {
        /// The requested instruction set.
        isa: IsaMode,
    },

    /// The instruction has neither valid raw bits nor decoded operands.
    OperandsNotDecoded,

    /// The word does not match any in-scope encoding.
    Undecodable {
        /// The little-endian machine word.
        word: u32,
    },

    /// Fewer bytes than one instruction word were supplied.
    Truncated {
        /// Number of bytes available.
        len: usize,
    },

    /// A PC-dependent instruction has no original application address.
    MissingTranslation {
        /// The opcode of the instruction being rewritten.
        opcode: Opcode,
    },
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrError::NoEncoding { opcode } => {
                write!(f, "no encoding of '{}' accepts these operands", opcode)
            }
            IrError::TargetUnreachable {
                opcode,
                offset,
                max,
            } => {
                write!(
                    f,
                    "'{}' target out of range (offset={}, max=±{})",
                    opcode, offset, max
                )
            }
            IrError::UnresolvedTarget { target } => {
                write!(f, "instruction reference {} is not in the list", target)
            }
            IrError::InvalidOperand { opcode, detail } => {
                write!(f, "invalid operand for '{}': {}", opcode, detail)
            }
            IrError::BufferTooSmall { needed, available } => {
                write!(
                    f,
                    "buffer too small: need {} bytes, have {}",
                    needed, available
                )
            }
            IrError::ExceedsMaxLength { length, max } => {
                write!(
                    f,
                    "encoded length {} exceeds the limit of {} bytes",
                    length, max
                )
            }
            IrError::UnsupportedIsa { isa } => {
                write!(f, "no encoder registered for {}", isa.name())
            }
            IrError::OperandsNotDecoded => {
                write!(f, "instruction has neither raw bits nor operands")
            }
            IrError::Undecodable { word } => {
                write!(f, "undecodable instruction word {:#010x}", word)
            }
            IrError::Truncated { len } => {
                write!(f, "truncated instruction: {} bytes available", len)
            }
            IrError::MissingTranslation { opcode } => {
                write!(
                    f,
                    "cannot rewrite '{}' without its application address",
                    opcode
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IrError {}
