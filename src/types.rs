//! Type Catalog
//!
//! Closed set of type kinds that can be carried across the simulator boundary,
//! together with their bit widths and the byte-length rule the codec relies on.

use std::fmt;

use thiserror::Error;

/// Raised when an item is read back as a different type than it was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid type conversion: got {got}, expected {expected}")]
pub struct TypeMismatch {
    pub got: TypeTag,
    pub expected: TypeTag,
}

/// Type kinds known to the codec.
///
/// The discriminants are the on-wire tag bytes and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    /// Absent type
    NullType = 0,
    /// VHDL `null`
    Null = 1,
    Boolean = 2,
    BooleanVector = 3,
    Bit = 4,
    BitVector = 5,
    Character = 6,
    String = 7,
    Integer = 8,
    IntegerVector = 9,
    Real = 10,
    RealVector = 11,
    Time = 12,
    TimeVector = 13,
    SeverityLevel = 14,
    FileOpenKind = 15,
    FileOpenStatus = 16,
    /// `ieee.math_complex.complex` (re, im)
    Complex = 17,
    /// `ieee.math_complex.complex_polar` (mag, arg)
    ComplexPolar = 18,
    NumericBitUnsigned = 19,
    NumericBitSigned = 20,
    StdUlogic = 21,
    StdUlogicVector = 22,
    NumericStdUnsigned = 23,
    NumericStdSigned = 24,
    Ufixed = 25,
    Sfixed = 26,
    Float = 27,
    /// A type tag carried as a value
    Type = 28,
    /// Bounds descriptor, see [`crate::codec::Range`]
    Range = 29,
    Byte = 30,
    /// Handle to an integer vector held in the storage table
    IntegerVectorPtr = 31,
    /// Handle to a string held in the storage table
    StringPtr = 32,
}

impl TypeTag {
    /// Every tag in code order
    pub const ALL: [TypeTag; 33] = [
        TypeTag::NullType,
        TypeTag::Null,
        TypeTag::Boolean,
        TypeTag::BooleanVector,
        TypeTag::Bit,
        TypeTag::BitVector,
        TypeTag::Character,
        TypeTag::String,
        TypeTag::Integer,
        TypeTag::IntegerVector,
        TypeTag::Real,
        TypeTag::RealVector,
        TypeTag::Time,
        TypeTag::TimeVector,
        TypeTag::SeverityLevel,
        TypeTag::FileOpenKind,
        TypeTag::FileOpenStatus,
        TypeTag::Complex,
        TypeTag::ComplexPolar,
        TypeTag::NumericBitUnsigned,
        TypeTag::NumericBitSigned,
        TypeTag::StdUlogic,
        TypeTag::StdUlogicVector,
        TypeTag::NumericStdUnsigned,
        TypeTag::NumericStdSigned,
        TypeTag::Ufixed,
        TypeTag::Sfixed,
        TypeTag::Float,
        TypeTag::Type,
        TypeTag::Range,
        TypeTag::Byte,
        TypeTag::IntegerVectorPtr,
        TypeTag::StringPtr,
    ];

    /// Convert from a tag byte, returning None for unknown codes
    pub fn from_u8(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// The tag byte
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Element type of a vector tag, or None for scalars.
    ///
    /// The pointer kinds count as scalars: their value is a single integer handle.
    pub fn element(self) -> Option<TypeTag> {
        match self {
            TypeTag::BooleanVector => Some(TypeTag::Boolean),
            TypeTag::BitVector | TypeTag::NumericBitUnsigned | TypeTag::NumericBitSigned => {
                Some(TypeTag::Bit)
            }
            TypeTag::String => Some(TypeTag::Character),
            TypeTag::IntegerVector => Some(TypeTag::Integer),
            TypeTag::RealVector => Some(TypeTag::Real),
            TypeTag::TimeVector => Some(TypeTag::Time),
            TypeTag::StdUlogicVector
            | TypeTag::NumericStdUnsigned
            | TypeTag::NumericStdSigned
            | TypeTag::Ufixed
            | TypeTag::Sfixed
            | TypeTag::Float => Some(TypeTag::StdUlogic),
            _ => None,
        }
    }

    /// Check if values of this tag are encoded as a range header plus elements
    pub fn is_vector(self) -> bool {
        self.element().is_some()
    }

    /// Check if values of this tag are encoded as a single fixed-width value
    pub fn is_scalar(self) -> bool {
        !self.is_vector()
    }

    /// Width of one value (or one element, for vectors) in bits
    pub fn width_bits(self) -> u32 {
        if let Some(element) = self.element() {
            return element.width_bits();
        }
        match self {
            TypeTag::NullType | TypeTag::Null => 0,
            TypeTag::Boolean | TypeTag::Bit => 1,
            TypeTag::StdUlogic => 4,
            TypeTag::Character
            | TypeTag::SeverityLevel
            | TypeTag::FileOpenKind
            | TypeTag::FileOpenStatus
            | TypeTag::Type
            | TypeTag::Byte => 8,
            TypeTag::Integer => 32,
            TypeTag::Real | TypeTag::Time => 64,
            TypeTag::Complex | TypeTag::ComplexPolar => 2 * TypeTag::Real.width_bits(),
            TypeTag::Range => 2 * TypeTag::Integer.width_bits() + TypeTag::Boolean.width_bits(),
            TypeTag::IntegerVectorPtr | TypeTag::StringPtr => TypeTag::Integer.width_bits(),
            // Vector tags returned above.
            _ => 0,
        }
    }

    /// Number of bytes occupied by `count` packed values of this tag.
    ///
    /// Whole bytes of each value are laid out first, then the leftover bits of
    /// all values are packed together and rounded up to a byte.
    pub fn byte_length(self, count: usize) -> usize {
        let width = self.width_bits() as usize;
        let bytes = width / 8;
        let bits = width % 8;
        count * bytes + (count * bits).div_ceil(8)
    }

    /// Catalog name
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::NullType => "null_type",
            TypeTag::Null => "vhdl_null",
            TypeTag::Boolean => "vhdl_boolean",
            TypeTag::BooleanVector => "vhdl_boolean_vector",
            TypeTag::Bit => "vhdl_bit",
            TypeTag::BitVector => "vhdl_bit_vector",
            TypeTag::Character => "vhdl_character",
            TypeTag::String => "vhdl_string",
            TypeTag::Integer => "vhdl_integer",
            TypeTag::IntegerVector => "vhdl_integer_vector",
            TypeTag::Real => "vhdl_real",
            TypeTag::RealVector => "vhdl_real_vector",
            TypeTag::Time => "vhdl_time",
            TypeTag::TimeVector => "vhdl_time_vector",
            TypeTag::SeverityLevel => "vhdl_severity_level",
            TypeTag::FileOpenKind => "vhdl_file_open_kind",
            TypeTag::FileOpenStatus => "vhdl_file_open_status",
            TypeTag::Complex => "ieee_complex",
            TypeTag::ComplexPolar => "ieee_complex_polar",
            TypeTag::NumericBitUnsigned => "ieee_numeric_bit_unsigned",
            TypeTag::NumericBitSigned => "ieee_numeric_bit_signed",
            TypeTag::StdUlogic => "ieee_std_ulogic",
            TypeTag::StdUlogicVector => "ieee_std_ulogic_vector",
            TypeTag::NumericStdUnsigned => "ieee_numeric_std_unsigned",
            TypeTag::NumericStdSigned => "ieee_numeric_std_signed",
            TypeTag::Ufixed => "ieee_ufixed",
            TypeTag::Sfixed => "ieee_sfixed",
            TypeTag::Float => "ieee_float",
            TypeTag::Type => "vunit_type",
            TypeTag::Range => "vunit_range",
            TypeTag::Byte => "vunit_byte",
            TypeTag::IntegerVectorPtr => "vunit_integer_vector_ptr",
            TypeTag::StringPtr => "vunit_string_ptr",
        }
    }

    /// Parse a catalog name or the plain VHDL type name
    pub fn from_name(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        if let Some(tag) = Self::ALL.iter().find(|t| t.name() == lower) {
            return Some(*tag);
        }
        match lower.as_str() {
            "null" => Some(TypeTag::Null),
            "boolean" => Some(TypeTag::Boolean),
            "boolean_vector" => Some(TypeTag::BooleanVector),
            "bit" => Some(TypeTag::Bit),
            "bit_vector" => Some(TypeTag::BitVector),
            "character" | "char" => Some(TypeTag::Character),
            "string" => Some(TypeTag::String),
            "integer" | "int" => Some(TypeTag::Integer),
            "integer_vector" => Some(TypeTag::IntegerVector),
            "real" => Some(TypeTag::Real),
            "real_vector" => Some(TypeTag::RealVector),
            "time" => Some(TypeTag::Time),
            "time_vector" => Some(TypeTag::TimeVector),
            "severity_level" => Some(TypeTag::SeverityLevel),
            "file_open_kind" => Some(TypeTag::FileOpenKind),
            "file_open_status" => Some(TypeTag::FileOpenStatus),
            "complex" => Some(TypeTag::Complex),
            "complex_polar" => Some(TypeTag::ComplexPolar),
            "ieee.numeric_bit.unsigned" => Some(TypeTag::NumericBitUnsigned),
            "ieee.numeric_bit.signed" => Some(TypeTag::NumericBitSigned),
            "std_ulogic" => Some(TypeTag::StdUlogic),
            "std_ulogic_vector" => Some(TypeTag::StdUlogicVector),
            "ieee.numeric_std.unsigned" | "unsigned" => Some(TypeTag::NumericStdUnsigned),
            "ieee.numeric_std.signed" | "signed" => Some(TypeTag::NumericStdSigned),
            "ufixed" => Some(TypeTag::Ufixed),
            "sfixed" => Some(TypeTag::Sfixed),
            "float" => Some(TypeTag::Float),
            "type_t" => Some(TypeTag::Type),
            "range_t" => Some(TypeTag::Range),
            "byte" => Some(TypeTag::Byte),
            "integer_vector_ptr_t" => Some(TypeTag::IntegerVectorPtr),
            "string_ptr_t" => Some(TypeTag::StringPtr),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Width in bits for a raw tag byte; unknown codes have width 0
pub fn raw_width_bits(code: u8) -> u32 {
    TypeTag::from_u8(code).map_or(0, TypeTag::width_bits)
}

/// Byte length for `count` values of a raw tag byte; unknown codes occupy nothing
pub fn raw_byte_length(code: u8, count: usize) -> usize {
    TypeTag::from_u8(code).map_or(0, |t| t.byte_length(count))
}

/// Verify that an item's tag is the one a caller expects to read
pub fn type_check(got: TypeTag, expected: TypeTag) -> Result<(), TypeMismatch> {
    if got == expected {
        Ok(())
    } else {
        Err(TypeMismatch { got, expected })
    }
}
