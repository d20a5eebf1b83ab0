//! Array values: a range header followed by packed elements

use super::range::{decode_range, encode_range, Range, RANGE_HEADER_LEN};
use super::{take, CodecError};
use crate::types::TypeTag;

/// Minimum element buffer handed out for short boolean/bit vectors when
/// [`DecodeOptions::pad_short_bit_vectors`] is set
pub const MIN_BIT_VECTOR_BYTES: usize = 8;

/// Decoder knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Zero-pad the element buffer of boolean and bit vectors to at least
    /// [`MIN_BIT_VECTOR_BYTES`]. Hosts that read a full machine word from the
    /// buffer need this; it never applies to other tags.
    pub pad_short_bit_vectors: bool,
}

/// An array value with its bounds and packed element bytes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArrayValue {
    pub bounds: Range,
    pub elements: Vec<u8>,
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl ArrayValue {
    pub fn new(bounds: Range, elements: Vec<u8>) -> Self {
        Self { bounds, elements }
    }

    /// Replace the bounds, e.g. to renumber a vector as `n-1 downto 0`.
    /// The new bounds must describe the same number of elements.
    pub fn with_bounds(mut self, bounds: Range) -> Self {
        self.bounds = bounds;
        self
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Boolean or bit vector, one bit per element, `0 to n-1`
    pub fn from_booleans(values: &[bool]) -> Self {
        let raw: Vec<u8> = values.iter().map(|&b| u8::from(b)).collect();
        Self::new(
            Range::ascending(0, count_u32(values.len())),
            pack_sub_byte(1, &raw),
        )
    }

    /// std_ulogic based vector, four bits per element, `0 to n-1`
    pub fn from_std_ulogic(values: &[u8]) -> Self {
        Self::new(
            Range::ascending(0, count_u32(values.len())),
            pack_sub_byte(4, values),
        )
    }

    /// Byte-per-element vector, `0 to n-1`
    pub fn from_bytes(values: &[u8]) -> Self {
        Self::new(Range::ascending(0, count_u32(values.len())), values.to_vec())
    }

    /// VHDL string, `1 to n`
    pub fn from_text(s: &str) -> Self {
        Self::new(
            Range::ascending(1, count_u32(s.len())),
            s.as_bytes().to_vec(),
        )
    }

    pub fn from_integers(values: &[i32]) -> Self {
        let elements = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(Range::ascending(0, count_u32(values.len())), elements)
    }

    pub fn from_reals(values: &[f64]) -> Self {
        let elements = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(Range::ascending(0, count_u32(values.len())), elements)
    }

    pub fn from_times(values: &[i64]) -> Self {
        let elements = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(Range::ascending(0, count_u32(values.len())), elements)
    }

    pub fn booleans(&self) -> Vec<bool> {
        unpack_sub_byte(1, &self.elements, self.len())
            .into_iter()
            .map(|b| b != 0)
            .collect()
    }

    pub fn std_ulogic(&self) -> Vec<u8> {
        unpack_sub_byte(4, &self.elements, self.len())
    }

    pub fn integers(&self) -> Vec<i32> {
        self.elements
            .chunks_exact(4)
            .take(self.len())
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    pub fn reals(&self) -> Vec<f64> {
        self.words().map(f64::from_bits).collect()
    }

    pub fn times(&self) -> Vec<i64> {
        self.words().map(|w| w as i64).collect()
    }

    /// Characters as text; invalid UTF-8 is replaced
    pub fn text(&self) -> String {
        let n = self.len().min(self.elements.len());
        String::from_utf8_lossy(&self.elements[..n]).into_owned()
    }

    /// Bytes of element `index` for tags whose width is a whole number of bytes
    pub fn element_bytes(&self, tag: TypeTag, index: usize) -> Option<&[u8]> {
        let width = tag.width_bits() as usize;
        if width == 0 || width % 8 != 0 || index >= self.len() {
            return None;
        }
        let size = width / 8;
        self.elements.get(index * size..(index + 1) * size)
    }

    /// Element `index` read at the element width of `tag`, packed or not
    pub fn get(&self, tag: TypeTag, index: usize) -> Option<ElementRef<'_>> {
        match tag.width_bits() {
            w @ (1 | 2 | 4) if index < self.len() => {
                sub_byte_at(w as usize, &self.elements, index).map(ElementRef::Packed)
            }
            _ => self.element_bytes(tag, index).map(ElementRef::Bytes),
        }
    }

    fn words(&self) -> impl Iterator<Item = u64> + '_ {
        self.elements.chunks_exact(8).take(self.len()).map(|c| {
            let mut word = [0u8; 8];
            word.copy_from_slice(c);
            u64::from_le_bytes(word)
        })
    }
}

/// One element of an [`ArrayValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef<'a> {
    /// A 1, 2 or 4 bit value, right-aligned
    Packed(u8),
    /// The little-endian bytes of a byte-multiple element
    Bytes(&'a [u8]),
}

/// Pack sub-byte values LSB-first, `width` bits each (1, 2 or 4).
/// The trailing partial byte is padded with zero bits.
pub fn pack_sub_byte(width: u32, values: &[u8]) -> Vec<u8> {
    debug_assert!(matches!(width, 1 | 2 | 4), "unsupported width {width}");
    let width = width as usize;
    let mask = ((1u16 << width) - 1) as u8;
    let mut out = vec![0u8; (values.len() * width).div_ceil(8)];
    for (i, v) in values.iter().enumerate() {
        let bit = i * width;
        out[bit / 8] |= (v & mask) << (bit % 8);
    }
    out
}

/// Inverse of [`pack_sub_byte`]; stops early if `bytes` runs out
pub fn unpack_sub_byte(width: u32, bytes: &[u8], count: usize) -> Vec<u8> {
    debug_assert!(matches!(width, 1 | 2 | 4), "unsupported width {width}");
    (0..count)
        .map_while(|i| sub_byte_at(width as usize, bytes, i))
        .collect()
}

/// Value `index` of `width`-bit values packed LSB-first
fn sub_byte_at(width: usize, bytes: &[u8], index: usize) -> Option<u8> {
    let mask = ((1u16 << width) - 1) as u8;
    let bit = index * width;
    bytes.get(bit / 8).map(|b| (b >> (bit % 8)) & mask)
}

/// Encoded size of an array of `length` elements of `tag`
pub fn encoded_array_len(tag: TypeTag, length: usize) -> usize {
    RANGE_HEADER_LEN + tag.byte_length(length)
}

/// Encode `array` as a range header followed by its packed elements
pub fn encode_array(array: &ArrayValue, tag: TypeTag, out: &mut Vec<u8>) -> Result<usize, CodecError> {
    if !tag.is_vector() {
        return Err(CodecError::NotVector(tag));
    }
    let b = &array.bounds;
    let length = Range::length_of(b.left, b.right, b.direction);
    let needed = tag.byte_length(length as usize);
    if array.elements.len() < needed {
        return Err(CodecError::ShortElements {
            tag,
            length,
            needed,
            got: array.elements.len(),
        });
    }
    Ok(write_array(array, tag, out))
}

/// Range header then exactly `byte_length(tag, length)` element bytes,
/// zero-filled past the end of `array.elements`
pub(crate) fn write_array(array: &ArrayValue, tag: TypeTag, out: &mut Vec<u8>) -> usize {
    let b = &array.bounds;
    let needed = tag.byte_length(Range::length_of(b.left, b.right, b.direction) as usize);
    let present = needed.min(array.elements.len());
    encode_range(b, out);
    out.extend_from_slice(&array.elements[..present]);
    out.resize(out.len() + needed - present, 0);
    RANGE_HEADER_LEN + needed
}

/// Decode an array of `tag` at `offset`
pub fn decode_array(bytes: &[u8], offset: &mut usize, tag: TypeTag) -> Result<ArrayValue, CodecError> {
    decode_array_with(bytes, offset, tag, &DecodeOptions::default())
}

/// Decode an array of `tag` at `offset` with explicit options
pub fn decode_array_with(
    bytes: &[u8],
    offset: &mut usize,
    tag: TypeTag,
    options: &DecodeOptions,
) -> Result<ArrayValue, CodecError> {
    if !tag.is_vector() {
        return Err(CodecError::NotVector(tag));
    }
    let start = *offset;
    let bounds = decode_range(bytes, offset)?;
    let needed = tag.byte_length(bounds.len());
    let data = take(bytes, offset, needed).inspect_err(|_| *offset = start)?;
    let mut elements = data.to_vec();
    if options.pad_short_bit_vectors
        && matches!(tag, TypeTag::BooleanVector | TypeTag::BitVector)
        && elements.len() < MIN_BIT_VECTOR_BYTES
    {
        elements.resize(MIN_BIT_VECTOR_BYTES, 0);
    }
    Ok(ArrayValue { bounds, elements })
}
