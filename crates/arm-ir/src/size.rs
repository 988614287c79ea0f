//! Operand size classes.
//!
//! A size class describes both the storage an operand occupies and, for
//! immediates, the range of values a field can hold. Classes narrower than a
//! byte still occupy a whole byte when stored; the rotated-immediate class
//! lives in a 4-byte container but is validated against its 12-bit field.

use core::fmt;

/// Size class of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpndSize {
    /// Unsized. Immediates default to [`OpndSize::Bits32`].
    #[default]
    Na,
    /// 1 byte.
    Bytes1,
    /// 2 bytes.
    Bytes2,
    /// 4 bytes.
    Bytes4,
    /// 8 bytes.
    Bytes8,
    /// 16 bytes.
    Bytes16,
    /// A single bit, 0 or 1.
    Bits1,
    /// Signed 2-bit field.
    Bits2,
    /// Signed 3-bit field.
    Bits3,
    /// Signed 4-bit field.
    Bits4,
    /// Signed 5-bit field.
    Bits5,
    /// Signed 6-bit field.
    Bits6,
    /// Signed 8-bit field.
    Bits8,
    /// Signed 10-bit field.
    Bits10,
    /// Signed 12-bit field.
    Bits12,
    /// Signed 16-bit field.
    Bits16,
    /// Signed 24-bit field.
    Bits24,
    /// Signed 32-bit field.
    Bits32,
    /// Unsigned 3-bit field.
    UBits3,
    /// Unsigned 4-bit field.
    UBits4,
    /// Unsigned 5-bit field.
    UBits5,
    /// Unsigned 6-bit field.
    UBits6,
    /// Unsigned 8-bit field.
    UBits8,
    /// Unsigned 16-bit field.
    UBits16,
    /// Unsigned 24-bit field.
    UBits24,
    /// Modified immediate: an 8-bit value rotated right by an even amount,
    /// packed into 12 bits of a 4-byte word.
    RotImm12,
    /// Register list bitmap.
    RegList,
}

impl OpndSize {
    /// Size of the container holding a value of this class, rounded up to
    /// whole bytes.
    pub fn size_in_bytes(self) -> usize {
        match self {
            OpndSize::Na => 0,
            OpndSize::Bytes1 => 1,
            OpndSize::Bytes2 => 2,
            OpndSize::Bytes4 => 4,
            OpndSize::Bytes8 => 8,
            OpndSize::Bytes16 => 16,
            OpndSize::RotImm12 => 4,
            OpndSize::RegList => 2,
            other => (other.size_in_bits() as usize).div_ceil(8),
        }
    }

    /// Width of the field in bits, used for range and shift checks.
    pub fn size_in_bits(self) -> u32 {
        match self {
            OpndSize::Na => 0,
            OpndSize::Bytes1 => 8,
            OpndSize::Bytes2 => 16,
            OpndSize::Bytes4 => 32,
            OpndSize::Bytes8 => 64,
            OpndSize::Bytes16 => 128,
            OpndSize::Bits1 => 1,
            OpndSize::Bits2 => 2,
            OpndSize::Bits3 | OpndSize::UBits3 => 3,
            OpndSize::Bits4 | OpndSize::UBits4 => 4,
            OpndSize::Bits5 | OpndSize::UBits5 => 5,
            OpndSize::Bits6 | OpndSize::UBits6 => 6,
            OpndSize::Bits8 | OpndSize::UBits8 => 8,
            OpndSize::Bits10 => 10,
            OpndSize::Bits12 | OpndSize::RotImm12 => 12,
            OpndSize::Bits16 | OpndSize::UBits16 => 16,
            OpndSize::Bits24 | OpndSize::UBits24 => 24,
            OpndSize::Bits32 => 32,
            OpndSize::RegList => 16,
        }
    }

    /// Inclusive value range of an immediate of this class.
    ///
    /// Byte classes accept both the signed and the unsigned interpretation.
    /// Returns `None` for classes that are not plain ranges.
    pub fn immed_range(self) -> Option<(i64, i64)> {
        let signed = |bits: u32| (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1);
        let unsigned = |bits: u32| (0, (1i64 << bits) - 1);
        Some(match self {
            OpndSize::Na | OpndSize::Bits32 => signed(32),
            OpndSize::Bytes1 => (i64::from(i8::MIN), i64::from(u8::MAX)),
            OpndSize::Bytes2 => (i64::from(i16::MIN), i64::from(u16::MAX)),
            OpndSize::Bytes4 => (i64::from(i32::MIN), i64::from(u32::MAX)),
            OpndSize::Bytes8 | OpndSize::Bytes16 => (i64::MIN, i64::MAX),
            OpndSize::Bits1 => (0, 1),
            OpndSize::Bits2
            | OpndSize::Bits3
            | OpndSize::Bits4
            | OpndSize::Bits5
            | OpndSize::Bits6
            | OpndSize::Bits8
            | OpndSize::Bits10
            | OpndSize::Bits12
            | OpndSize::Bits16
            | OpndSize::Bits24 => signed(self.size_in_bits()),
            OpndSize::UBits3
            | OpndSize::UBits4
            | OpndSize::UBits5
            | OpndSize::UBits6
            | OpndSize::UBits8
            | OpndSize::UBits16
            | OpndSize::UBits24 => unsigned(self.size_in_bits()),
            OpndSize::RotImm12 | OpndSize::RegList => return None,
        })
    }

    /// Byte class for an access of `bytes` bytes.
    pub fn from_bytes(bytes: usize) -> OpndSize {
        match bytes {
            1 => OpndSize::Bytes1,
            2 => OpndSize::Bytes2,
            4 => OpndSize::Bytes4,
            8 => OpndSize::Bytes8,
            16 => OpndSize::Bytes16,
            _ => OpndSize::Na,
        }
    }

    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            OpndSize::Na => "na",
            OpndSize::Bytes1 => "1",
            OpndSize::Bytes2 => "2",
            OpndSize::Bytes4 => "4",
            OpndSize::Bytes8 => "8",
            OpndSize::Bytes16 => "16",
            OpndSize::Bits1 => "1b",
            OpndSize::Bits2 => "2b",
            OpndSize::Bits3 => "3b",
            OpndSize::Bits4 => "4b",
            OpndSize::Bits5 => "5b",
            OpndSize::Bits6 => "6b",
            OpndSize::Bits8 => "8b",
            OpndSize::Bits10 => "10b",
            OpndSize::Bits12 => "12b",
            OpndSize::Bits16 => "16b",
            OpndSize::Bits24 => "24b",
            OpndSize::Bits32 => "32b",
            OpndSize::UBits3 => "u3b",
            OpndSize::UBits4 => "u4b",
            OpndSize::UBits5 => "u5b",
            OpndSize::UBits6 => "u6b",
            OpndSize::UBits8 => "u8b",
            OpndSize::UBits16 => "u16b",
            OpndSize::UBits24 => "u24b",
            OpndSize::RotImm12 => "4_12b",
            OpndSize::RegList => "reglist",
        }
    }
}

impl fmt::Display for OpndSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encode a 32-bit value as an A32 modified immediate.
///
/// Returns `(rotate, imm8)` such that `imm8.rotate_right(2 * rotate) == value`,
/// preferring the smallest rotation.
pub fn encode_rotated_imm(value: u32) -> Option<(u32, u32)> {
    for rot in 0..16u32 {
        let imm = value.rotate_left(rot * 2);
        if imm <= 0xFF {
            return Some((rot, imm));
        }
    }
    None
}

/// Expand a 12-bit modified immediate field back to its value.
pub fn decode_rotated_imm(field: u32) -> u32 {
    let rot = (field >> 8) & 0xF;
    (field & 0xFF).rotate_right(rot * 2)
}

/// Whether `value` fits the immediate class `size`.
pub fn immed_size_ok(value: i64, size: OpndSize) -> bool {
    match size {
        OpndSize::RotImm12 => {
            (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value)
                && encode_rotated_imm(value as u32).is_some()
        }
        _ => match size.immed_range() {
            Some((min, max)) => value >= min && value <= max,
            None => false,
        },
    }
}
