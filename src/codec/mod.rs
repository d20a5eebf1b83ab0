//! Type-directed binary codec
//!
//! Values are laid out exactly as wide as the type catalog says they are:
//!
//! ```text
//! scalar:  ┌──────────────────────────────┐
//!          │ byte_length(tag, 1) bytes    │  little-endian
//!          └──────────────────────────────┘
//!
//! range:   ┌──────────┬──────────┬─────┐
//!          │ left u32 │ right u32│ dir │  9 bytes, dir 1 = downto
//!          └──────────┴──────────┴─────┘
//!
//! array:   ┌──────────────┬──────────────────────────────────┐
//!          │ range header │ byte_length(tag, length) bytes   │
//!          └──────────────┴──────────────────────────────────┘
//! ```
//!
//! Readers take `(&[u8], &mut usize)` and advance the offset; writers append to
//! a `Vec<u8>` and return the number of bytes written.

mod array;
mod range;

pub(crate) use array::write_array;
pub use array::{
    decode_array, decode_array_with, encode_array, encoded_array_len, pack_sub_byte,
    unpack_sub_byte, ArrayValue, DecodeOptions, ElementRef, MIN_BIT_VECTOR_BYTES,
};
pub use range::{decode_range, encode_range, Direction, Range, RANGE_HEADER_LEN};

use crate::types::TypeTag;
use thiserror::Error;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of input: need {needed} bytes at offset {offset}, have {available}")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("{0} is a vector type and has no scalar encoding")]
    NotScalar(TypeTag),
    #[error("{0} is not a vector type")]
    NotVector(TypeTag),
    #[error("{tag} array of length {length} needs {needed} element bytes, got {got}")]
    ShortElements {
        tag: TypeTag,
        length: u32,
        needed: usize,
        got: usize,
    },
    #[error("unknown type code {0}")]
    UnknownType(u8),
}

/// Characters of `ieee.std_logic_1164.std_ulogic` in position order
pub const STD_ULOGIC_CHARS: [char; 9] = ['U', 'X', '0', '1', 'Z', 'W', 'L', 'H', '-'];

/// Position of a std_ulogic literal
pub fn std_ulogic_from_char(c: char) -> Option<u8> {
    let c = c.to_ascii_uppercase();
    STD_ULOGIC_CHARS
        .iter()
        .position(|&l| l == c)
        .map(|p| p as u8)
}

/// Literal for a std_ulogic position; out-of-range positions show as '?'
pub fn std_ulogic_to_char(value: u8) -> char {
    STD_ULOGIC_CHARS
        .get(value as usize)
        .copied()
        .unwrap_or('?')
}

/// A scalar ("fixed") value.
///
/// Each variant maps to exactly one scalar [`TypeTag`]; see [`Fixed::tag`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fixed {
    Null,
    Boolean(bool),
    Bit(bool),
    Character(u8),
    Integer(i32),
    Real(f64),
    /// Simulation time in femtoseconds
    Time(i64),
    SeverityLevel(u8),
    FileOpenKind(u8),
    FileOpenStatus(u8),
    Complex {
        re: f64,
        im: f64,
    },
    ComplexPolar {
        mag: f64,
        arg: f64,
    },
    /// Position in [`STD_ULOGIC_CHARS`]
    StdUlogic(u8),
    Type(TypeTag),
    Range(Range),
    Byte(u8),
    IntegerVectorPtr(i32),
    StringPtr(i32),
}

impl Fixed {
    /// The tag this value is encoded under
    pub fn tag(&self) -> TypeTag {
        match self {
            Fixed::Null => TypeTag::Null,
            Fixed::Boolean(_) => TypeTag::Boolean,
            Fixed::Bit(_) => TypeTag::Bit,
            Fixed::Character(_) => TypeTag::Character,
            Fixed::Integer(_) => TypeTag::Integer,
            Fixed::Real(_) => TypeTag::Real,
            Fixed::Time(_) => TypeTag::Time,
            Fixed::SeverityLevel(_) => TypeTag::SeverityLevel,
            Fixed::FileOpenKind(_) => TypeTag::FileOpenKind,
            Fixed::FileOpenStatus(_) => TypeTag::FileOpenStatus,
            Fixed::Complex { .. } => TypeTag::Complex,
            Fixed::ComplexPolar { .. } => TypeTag::ComplexPolar,
            Fixed::StdUlogic(_) => TypeTag::StdUlogic,
            Fixed::Type(_) => TypeTag::Type,
            Fixed::Range(_) => TypeTag::Range,
            Fixed::Byte(_) => TypeTag::Byte,
            Fixed::IntegerVectorPtr(_) => TypeTag::IntegerVectorPtr,
            Fixed::StringPtr(_) => TypeTag::StringPtr,
        }
    }
}

/// Split `n` bytes off `bytes` at `offset`, advancing the offset
pub(crate) fn take<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
    n: usize,
) -> Result<&'a [u8], CodecError> {
    let start = *offset;
    let slice = start
        .checked_add(n)
        .and_then(|end| bytes.get(start..end))
        .ok_or(CodecError::UnexpectedEof {
            offset: start,
            needed: n,
            available: bytes.len().saturating_sub(start),
        })?;
    *offset += n;
    Ok(slice)
}

pub(crate) fn read_u8(bytes: &[u8], offset: &mut usize) -> Result<u8, CodecError> {
    Ok(take(bytes, offset, 1)?[0])
}

pub(crate) fn read_u32_le(bytes: &[u8], offset: &mut usize) -> Result<u32, CodecError> {
    let b = take(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u64_le(bytes: &[u8], offset: &mut usize) -> Result<u64, CodecError> {
    let b = take(bytes, offset, 8)?;
    let mut word = [0u8; 8];
    word.copy_from_slice(b);
    Ok(u64::from_le_bytes(word))
}

fn read_f64_le(bytes: &[u8], offset: &mut usize) -> Result<f64, CodecError> {
    read_u64_le(bytes, offset).map(f64::from_bits)
}

/// Encode a scalar value, appending exactly `byte_length(value.tag(), 1)` bytes
pub fn encode_scalar(value: &Fixed, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    match *value {
        Fixed::Null => {}
        Fixed::Boolean(b) | Fixed::Bit(b) => out.push(u8::from(b)),
        Fixed::Character(v)
        | Fixed::SeverityLevel(v)
        | Fixed::FileOpenKind(v)
        | Fixed::FileOpenStatus(v)
        | Fixed::StdUlogic(v)
        | Fixed::Byte(v) => out.push(v),
        Fixed::Integer(v) | Fixed::IntegerVectorPtr(v) | Fixed::StringPtr(v) => {
            out.extend_from_slice(&v.to_le_bytes())
        }
        Fixed::Real(v) => out.extend_from_slice(&v.to_le_bytes()),
        Fixed::Time(v) => out.extend_from_slice(&v.to_le_bytes()),
        Fixed::Complex { re: a, im: b } | Fixed::ComplexPolar { mag: a, arg: b } => {
            out.extend_from_slice(&a.to_le_bytes());
            out.extend_from_slice(&b.to_le_bytes());
        }
        Fixed::Type(t) => out.push(t.code()),
        Fixed::Range(r) => {
            encode_range(&r, out);
        }
    }
    debug_assert_eq!(out.len() - start, value.tag().byte_length(1));
    out.len() - start
}

/// Decode a scalar of type `tag` at `offset`
pub fn decode_scalar(bytes: &[u8], offset: &mut usize, tag: TypeTag) -> Result<Fixed, CodecError> {
    let value = match tag {
        TypeTag::NullType | TypeTag::Null => Fixed::Null,
        TypeTag::Boolean => Fixed::Boolean(read_u8(bytes, offset)? != 0),
        TypeTag::Bit => Fixed::Bit(read_u8(bytes, offset)? != 0),
        TypeTag::Character => Fixed::Character(read_u8(bytes, offset)?),
        TypeTag::Integer => Fixed::Integer(read_u32_le(bytes, offset)? as i32),
        TypeTag::Real => Fixed::Real(read_f64_le(bytes, offset)?),
        TypeTag::Time => Fixed::Time(read_u64_le(bytes, offset)? as i64),
        TypeTag::SeverityLevel => Fixed::SeverityLevel(read_u8(bytes, offset)?),
        TypeTag::FileOpenKind => Fixed::FileOpenKind(read_u8(bytes, offset)?),
        TypeTag::FileOpenStatus => Fixed::FileOpenStatus(read_u8(bytes, offset)?),
        TypeTag::Complex => Fixed::Complex {
            re: read_f64_le(bytes, offset)?,
            im: read_f64_le(bytes, offset)?,
        },
        TypeTag::ComplexPolar => Fixed::ComplexPolar {
            mag: read_f64_le(bytes, offset)?,
            arg: read_f64_le(bytes, offset)?,
        },
        TypeTag::StdUlogic => Fixed::StdUlogic(read_u8(bytes, offset)?),
        TypeTag::Type => {
            let code = read_u8(bytes, offset)?;
            Fixed::Type(TypeTag::from_u8(code).ok_or(CodecError::UnknownType(code))?)
        }
        TypeTag::Range => Fixed::Range(decode_range(bytes, offset)?),
        TypeTag::Byte => Fixed::Byte(read_u8(bytes, offset)?),
        TypeTag::IntegerVectorPtr => Fixed::IntegerVectorPtr(read_u32_le(bytes, offset)? as i32),
        TypeTag::StringPtr => Fixed::StringPtr(read_u32_le(bytes, offset)? as i32),
        vector => return Err(CodecError::NotScalar(vector)),
    };
    Ok(value)
}

/// Number of bytes `count` values of `tag` occupy; callers size buffers with this
pub fn byte_length_of(tag: TypeTag, count: usize) -> usize {
    tag.byte_length(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: Fixed) {
        let mut buf = Vec::new();
        let written = encode_scalar(&value, &mut buf);
        assert_eq!(written, value.tag().byte_length(1), "{value:?}");
        let mut off = 0;
        let back = decode_scalar(&buf, &mut off, value.tag()).unwrap();
        assert_eq!(back, value);
        assert_eq!(off, buf.len());
    }

    #[test]
    fn test_scalar_round_trips() {
        round_trip(Fixed::Null);
        round_trip(Fixed::Boolean(true));
        round_trip(Fixed::Bit(false));
        round_trip(Fixed::Character(b'A'));
        round_trip(Fixed::Integer(-123_456));
        round_trip(Fixed::Real(3.25));
        round_trip(Fixed::Time(1_000_000_000));
        round_trip(Fixed::SeverityLevel(3));
        round_trip(Fixed::FileOpenKind(1));
        round_trip(Fixed::FileOpenStatus(2));
        round_trip(Fixed::Complex { re: 1.5, im: -2.0 });
        round_trip(Fixed::ComplexPolar { mag: 2.0, arg: 0.5 });
        round_trip(Fixed::StdUlogic(4));
        round_trip(Fixed::Type(TypeTag::RealVector));
        round_trip(Fixed::Range(Range::downto(7, 0)));
        round_trip(Fixed::Byte(0xFF));
        round_trip(Fixed::IntegerVectorPtr(12));
        round_trip(Fixed::StringPtr(-1));
    }

    #[test]
    fn test_integer_layout() {
        let mut buf = Vec::new();
        encode_scalar(&Fixed::Integer(0x0102_0304), &mut buf);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_decode_short_input() {
        let mut off = 0;
        let err = decode_scalar(&[1, 2], &mut off, TypeTag::Integer).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEof {
                offset: 0,
                needed: 4,
                available: 2
            }
        );
        assert_eq!(off, 0);
    }

    #[test]
    fn test_decode_vector_as_scalar() {
        let mut off = 0;
        assert_eq!(
            decode_scalar(&[0; 16], &mut off, TypeTag::String),
            Err(CodecError::NotScalar(TypeTag::String))
        );
    }

    #[test]
    fn test_decode_unknown_type_value() {
        let mut off = 0;
        assert_eq!(
            decode_scalar(&[99], &mut off, TypeTag::Type),
            Err(CodecError::UnknownType(99))
        );
    }

    #[test]
    fn test_std_ulogic_chars() {
        assert_eq!(std_ulogic_from_char('1'), Some(3));
        assert_eq!(std_ulogic_from_char('z'), Some(4));
        assert_eq!(std_ulogic_from_char('q'), None);
        assert_eq!(std_ulogic_to_char(8), '-');
        assert_eq!(std_ulogic_to_char(9), '?');
    }
}
