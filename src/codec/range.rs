//! Range (bounds descriptor) encoding

use std::fmt;

use super::{read_u32_le, read_u8, CodecError};

/// Size of an encoded range: two 32-bit bounds and one direction byte
pub const RANGE_HEADER_LEN: usize = 9;

/// Iteration direction of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Ascending, `left to right`
    #[default]
    To,
    /// Descending, `left downto right`
    Downto,
}

impl Direction {
    /// Wire byte: 0 for `to`, 1 for `downto`
    pub fn to_byte(self) -> u8 {
        match self {
            Direction::To => 0,
            Direction::Downto => 1,
        }
    }

    /// Any non-zero byte reads as `downto`
    pub fn from_byte(b: u8) -> Self {
        if b != 0 {
            Direction::Downto
        } else {
            Direction::To
        }
    }
}

/// Index range of an array.
///
/// `length` is derived from the bounds; use [`Range::new`] (or `to`/`downto`) to
/// keep it consistent. The field is public so a host can describe a buffer
/// whose bounds it already knows, but it is never trusted by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub left: u32,
    pub right: u32,
    pub direction: Direction,
    pub length: u32,
}

impl Range {
    /// Create a range, computing its length
    pub fn new(left: u32, right: u32, direction: Direction) -> Self {
        Self {
            left,
            right,
            direction,
            length: Self::length_of(left, right, direction),
        }
    }

    /// `left to right`
    pub fn to(left: u32, right: u32) -> Self {
        Self::new(left, right, Direction::To)
    }

    /// `left downto right`
    pub fn downto(left: u32, right: u32) -> Self {
        Self::new(left, right, Direction::Downto)
    }

    /// Ascending range of `length` elements starting at `left`.
    ///
    /// A zero length yields the null range `left to left - 1`.
    pub fn ascending(left: u32, length: u32) -> Self {
        Self {
            left,
            right: left.wrapping_add(length).wrapping_sub(1),
            direction: Direction::To,
            length,
        }
    }

    /// Element count of `left to/downto right`.
    ///
    /// Computed with 32-bit wrap-around so that `0 to -1` has length 0.
    pub fn length_of(left: u32, right: u32, direction: Direction) -> u32 {
        let span = match direction {
            Direction::To => right.wrapping_sub(left),
            Direction::Downto => left.wrapping_sub(right),
        };
        span.wrapping_add(1)
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == Direction::To
    }

    pub fn is_null(&self) -> bool {
        self.length == 0
    }

    /// Number of elements as usize
    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.is_null()
    }
}

impl Default for Range {
    /// The null range `0 to -1`
    fn default() -> Self {
        Range::ascending(0, 0)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::To => "to",
            Direction::Downto => "downto",
        };
        write!(f, "{} {} {}", self.left as i32, dir, self.right as i32)
    }
}

/// Encode a range header, returning the number of bytes written
pub fn encode_range(range: &Range, out: &mut Vec<u8>) -> usize {
    out.extend_from_slice(&range.left.to_le_bytes());
    out.extend_from_slice(&range.right.to_le_bytes());
    out.push(range.direction.to_byte());
    RANGE_HEADER_LEN
}

/// Decode a range header; the length is always recomputed from the bounds
pub fn decode_range(bytes: &[u8], offset: &mut usize) -> Result<Range, CodecError> {
    if bytes.len().saturating_sub(*offset) < RANGE_HEADER_LEN {
        return Err(CodecError::UnexpectedEof {
            offset: *offset,
            needed: RANGE_HEADER_LEN,
            available: bytes.len().saturating_sub(*offset),
        });
    }
    let left = read_u32_le(bytes, offset)?;
    let right = read_u32_le(bytes, offset)?;
    let direction = Direction::from_byte(read_u8(bytes, offset)?);
    Ok(Range::new(left, right, direction))
}
