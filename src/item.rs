//! Typed Items
//!
//! An item pairs a [`TypeTag`] with the encoded bytes of one value. Scalars are
//! stored in their fixed-width form, arrays as a range header followed by the
//! packed elements. Conversions out of an item are type-checked.

use std::fmt;

use thiserror::Error;

use crate::codec::{
    decode_array_with, decode_range, decode_scalar, encode_array, encode_scalar,
    encoded_array_len, read_u32_le, read_u8, write_array, ArrayValue, CodecError, DecodeOptions,
    Fixed, RANGE_HEADER_LEN,
};
use crate::types::{type_check, TypeMismatch, TypeTag};

/// Item errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("unknown type code {0} in item wire form")]
    UnknownType(u8),
}

/// A type tag and the encoded bytes of a value of that type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    tag: TypeTag,
    code: Vec<u8>,
}

impl Item {
    /// Wrap already-encoded bytes. No validation is done here; a mismatch
    /// surfaces when the item is converted.
    pub fn from_parts(tag: TypeTag, code: Vec<u8>) -> Self {
        Self { tag, code }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// The encoded value, without the tag
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn into_code(self) -> Vec<u8> {
        self.code
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    pub fn from_fixed(value: Fixed) -> Self {
        let tag = value.tag();
        let mut code = Vec::with_capacity(tag.byte_length(1));
        encode_scalar(&value, &mut code);
        Self { tag, code }
    }

    /// Decode the item as a scalar of type `expected`
    pub fn to_fixed(&self, expected: TypeTag) -> Result<Fixed, ItemError> {
        type_check(self.tag, expected)?;
        let mut offset = 0;
        Ok(decode_scalar(&self.code, &mut offset, expected)?)
    }

    pub fn from_char(c: u8) -> Self {
        Self::from_fixed(Fixed::Character(c))
    }

    pub fn to_char(&self) -> Result<u8, ItemError> {
        self.read_scalar(TypeTag::Character, read_u8)
    }

    pub fn from_int(value: i32) -> Self {
        Self::from_fixed(Fixed::Integer(value))
    }

    pub fn to_int(&self) -> Result<i32, ItemError> {
        self.read_scalar(TypeTag::Integer, |bytes, offset| {
            read_u32_le(bytes, offset).map(|v| v as i32)
        })
    }

    fn read_scalar<T>(
        &self,
        expected: TypeTag,
        read: fn(&[u8], &mut usize) -> Result<T, CodecError>,
    ) -> Result<T, ItemError> {
        type_check(self.tag, expected)?;
        let mut offset = 0;
        Ok(read(&self.code, &mut offset)?)
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    /// Encode `array` as an item of vector type `tag`
    pub fn from_array(array: &ArrayValue, tag: TypeTag) -> Result<Self, ItemError> {
        let mut code = Vec::with_capacity(encoded_array_len(tag, array.len()));
        encode_array(array, tag, &mut code)?;
        Ok(Self { tag, code })
    }

    pub fn to_array(&self, expected: TypeTag) -> Result<ArrayValue, ItemError> {
        self.to_array_with(expected, &DecodeOptions::default())
    }

    pub fn to_array_with(
        &self,
        expected: TypeTag,
        options: &DecodeOptions,
    ) -> Result<ArrayValue, ItemError> {
        type_check(self.tag, expected)?;
        let mut offset = 0;
        Ok(decode_array_with(&self.code, &mut offset, expected, options)?)
    }

    /// VHDL string item, bounds `1 to n`
    pub fn from_string(s: &str) -> Self {
        let array = ArrayValue::from_text(s);
        let mut code = Vec::with_capacity(encoded_array_len(TypeTag::String, s.len()));
        write_array(&array, TypeTag::String, &mut code);
        Self {
            tag: TypeTag::String,
            code,
        }
    }

    /// The string value as an array, keeping its bounds
    pub fn to_string_array(&self) -> Result<ArrayValue, ItemError> {
        self.to_array(TypeTag::String)
    }

    /// The string value as text; invalid UTF-8 is replaced
    pub fn to_text(&self) -> Result<String, ItemError> {
        Ok(self.to_string_array()?.text())
    }

    // =========================================================================
    // Wire form
    // =========================================================================

    /// Self-describing form: one tag byte followed by the code
    pub fn encode(&self, out: &mut Vec<u8>) -> usize {
        out.push(self.tag.code());
        out.extend_from_slice(&self.code);
        1 + self.code.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.code.len());
        self.encode(&mut out);
        out
    }

    /// Decode one item at `offset`. The length of the code is derived from the
    /// tag, and for vectors from the range header.
    pub fn decode(bytes: &[u8], offset: &mut usize) -> Result<Self, ItemError> {
        let start = *offset;
        let raw = *bytes.get(start).ok_or(CodecError::UnexpectedEof {
            offset: start,
            needed: 1,
            available: 0,
        })?;
        let tag = TypeTag::from_u8(raw).ok_or(ItemError::UnknownType(raw))?;
        let body = start + 1;

        let code_len = if tag.is_vector() {
            let mut probe = body;
            let bounds = decode_range(bytes, &mut probe)?;
            RANGE_HEADER_LEN + tag.byte_length(bounds.len())
        } else {
            tag.byte_length(1)
        };

        let code = body
            .checked_add(code_len)
            .and_then(|end| bytes.get(body..end))
            .ok_or(CodecError::UnexpectedEof {
                offset: body,
                needed: code_len,
                available: bytes.len().saturating_sub(body),
            })?;

        *offset = body + code_len;
        Ok(Self {
            tag,
            code: code.to_vec(),
        })
    }

    /// Decode an item that fills all of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ItemError> {
        let mut offset = 0;
        Self::decode(bytes, &mut offset)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.tag, self.code.len())
    }
}
