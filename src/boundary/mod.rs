//! Boundary Adapter
//!
//! Presents slot buffers the way the simulator sees arrays: a pointer plus a
//! bounds descriptor. Byte views are numbered `1 to size` like VHDL strings;
//! integer views are numbered `0 to size/4 - 1` like integer vectors. Views
//! borrow the table, so they alias the slot buffer and never own it.

pub mod vhpi;

use std::ffi::CString;
use std::marker::PhantomData;

use crate::codec::{ArrayValue, Direction, Range};
use crate::storage::{Element, Handle, HandleTable, StorageResult};

// =============================================================================
// Host descriptors
// =============================================================================

/// Bounds descriptor in the host's layout
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeDesc {
    pub left: u32,
    pub right: u32,
    /// 0 = to, 1 = downto
    pub dir: u32,
    pub len: u32,
}

impl From<Range> for RangeDesc {
    fn from(r: Range) -> Self {
        Self {
            left: r.left,
            right: r.right,
            dir: u32::from(r.direction.to_byte()),
            len: r.length,
        }
    }
}

impl From<RangeDesc> for Range {
    /// The host's `len` is trusted as-is
    fn from(d: RangeDesc) -> Self {
        Range {
            left: d.left,
            right: d.right,
            direction: if d.dir != 0 {
                Direction::Downto
            } else {
                Direction::To
            },
            length: d.len,
        }
    }
}

/// Unconstrained array in the host's layout: element pointer and bounds
#[repr(C)]
#[derive(Debug)]
pub struct ArrayDesc {
    pub value: *mut u8,
    pub range: *mut RangeDesc,
}

impl ArrayDesc {
    /// Borrow the host's bytes, `range.len * stride` of them.
    ///
    /// Returns `None` when either pointer is null.
    ///
    /// # Safety
    ///
    /// Non-null pointers must be valid for the described length for `'a`.
    pub unsafe fn bytes<'a>(&self, stride: usize) -> Option<&'a [u8]> {
        if self.value.is_null() || self.range.is_null() {
            return None;
        }
        let len = (*self.range).len as usize * stride;
        Some(std::slice::from_raw_parts(self.value, len))
    }
}

// =============================================================================
// Views
// =============================================================================

fn byte_bounds(size: usize) -> Range {
    Range::ascending(1, size as u32)
}

fn int_bounds(size: usize) -> Range {
    Range::ascending(0, (size / i32::WIDTH) as u32)
}

/// Position of VHDL index `index` within `bounds`, if it lies inside them
fn offset_of(bounds: &Range, index: i64) -> Option<usize> {
    let left = i64::from(bounds.left as i32);
    let offset = if bounds.is_ascending() {
        index - left
    } else {
        left - index
    };
    usize::try_from(offset).ok().filter(|&o| o < bounds.len())
}

/// Read-only view of a slot buffer as an array of `E`
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a, E: Element> {
    bounds: Range,
    bytes: &'a [u8],
    _element: PhantomData<E>,
}

impl<'a, E: Element> ArrayView<'a, E> {
    fn new(bounds: Range, bytes: &'a [u8]) -> Self {
        Self {
            bounds,
            bytes,
            _element: PhantomData,
        }
    }

    pub fn bounds(&self) -> Range {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Element at VHDL index `index`
    pub fn get(&self, index: i64) -> Option<E> {
        offset_of(&self.bounds, index).map(|o| E::read(&self.bytes[o * E::WIDTH..]))
    }

    pub fn iter(&self) -> impl Iterator<Item = E> + 'a {
        self.bytes
            .chunks_exact(E::WIDTH)
            .take(self.bounds.len())
            .map(E::read)
    }

    /// The underlying buffer, including any trailing bytes that do not
    /// make up a whole element
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Host descriptor for these bounds
    pub fn range_desc(&self) -> RangeDesc {
        self.bounds.into()
    }
}

/// Mutable view of a slot buffer as an array of `E`
#[derive(Debug)]
pub struct ArrayViewMut<'a, E: Element> {
    bounds: Range,
    bytes: &'a mut [u8],
    _element: PhantomData<E>,
}

impl<'a, E: Element> ArrayViewMut<'a, E> {
    fn new(bounds: Range, bytes: &'a mut [u8]) -> Self {
        Self {
            bounds,
            bytes,
            _element: PhantomData,
        }
    }

    pub fn bounds(&self) -> Range {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn get(&self, index: i64) -> Option<E> {
        offset_of(&self.bounds, index).map(|o| E::read(&self.bytes[o * E::WIDTH..]))
    }

    /// Store `value` at VHDL index `index`; false if it is out of bounds
    pub fn set(&mut self, index: i64, value: E) -> bool {
        match offset_of(&self.bounds, index) {
            Some(o) => {
                value.write(&mut self.bytes[o * E::WIDTH..]);
                true
            }
            None => false,
        }
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes[..]
    }
}

/// `1 to size` byte view of `handle`
pub fn byte_view(table: &HandleTable, handle: Handle) -> StorageResult<ArrayView<'_, u8>> {
    let bytes = table.raw(handle)?;
    Ok(ArrayView::new(byte_bounds(bytes.len()), bytes))
}

pub fn byte_view_mut(
    table: &mut HandleTable,
    handle: Handle,
) -> StorageResult<ArrayViewMut<'_, u8>> {
    let bytes = table.raw_mut(handle)?;
    Ok(ArrayViewMut::new(byte_bounds(bytes.len()), bytes))
}

/// `0 to size/4 - 1` integer view of `handle`; a null range below 4 bytes
pub fn int_view(table: &HandleTable, handle: Handle) -> StorageResult<ArrayView<'_, i32>> {
    let bytes = table.raw(handle)?;
    Ok(ArrayView::new(int_bounds(bytes.len()), bytes))
}

pub fn int_view_mut(
    table: &mut HandleTable,
    handle: Handle,
) -> StorageResult<ArrayViewMut<'_, i32>> {
    let bytes = table.raw_mut(handle)?;
    Ok(ArrayViewMut::new(int_bounds(bytes.len()), bytes))
}

// =============================================================================
// String bridge
// =============================================================================

/// VHDL string (`1 to n`) holding the bytes of `s`
pub fn string_to_array(s: &str) -> ArrayValue {
    ArrayValue::from_text(s)
}

/// Owned text of a character array, honoring its length; invalid UTF-8 is
/// replaced
pub fn array_to_string(array: &ArrayValue) -> String {
    array.text()
}

/// Null-terminated copy of `bytes` for diagnostics. Stops at the first
/// embedded NUL.
pub fn to_c_string(bytes: &[u8]) -> CString {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    CString::new(&bytes[..end]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_view_bounds() {
        let mut table = HandleTable::new();
        let h = table.allocate(3, Some(b"abc"), None).unwrap();
        let view = byte_view(&table, h).unwrap();
        assert_eq!(view.bounds(), Range::to(1, 3));
        assert_eq!(view.get(1), Some(b'a'));
        assert_eq!(view.get(3), Some(b'c'));
        assert_eq!(view.get(0), None);
        assert_eq!(view.get(4), None);
        assert_eq!(
            view.range_desc(),
            RangeDesc {
                left: 1,
                right: 3,
                dir: 0,
                len: 3
            }
        );
    }

    #[test]
    fn test_int_view_bounds() {
        let mut table = HandleTable::new();
        let h = table.allocate(10, None, None).unwrap();
        let view = int_view(&table, h).unwrap();
        assert_eq!(view.bounds(), Range::to(0, 1));
        assert_eq!(view.len(), 2);

        let small = table.allocate(3, None, None).unwrap();
        let view = int_view(&table, small).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.range_desc().right, u32::MAX);
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn test_views_alias() {
        let mut table = HandleTable::new();
        let h = table.allocate(8, None, None).unwrap();
        {
            let mut ints = int_view_mut(&mut table, h).unwrap();
            assert!(ints.set(1, -1));
            assert!(!ints.set(2, 5));
        }
        let bytes: Vec<u8> = byte_view(&table, h).unwrap().iter().collect();
        assert_eq!(bytes, [0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);

        {
            let mut chars = byte_view_mut(&mut table, h).unwrap();
            assert!(chars.set(1, 7));
        }
        assert_eq!(int_view(&table, h).unwrap().get(0), Some(7));
    }

    #[test]
    fn test_string_bridge() {
        let array = string_to_array("hello");
        assert_eq!(array.bounds, Range::to(1, 5));
        assert_eq!(array_to_string(&array), "hello");

        let truncated = ArrayValue::new(Range::to(1, 2), b"hello".to_vec());
        assert_eq!(array_to_string(&truncated), "he");

        assert_eq!(to_c_string(b"abc").as_bytes_with_nul(), b"abc\0");
        assert_eq!(to_c_string(b"ab\0cd").as_bytes(), b"ab");
    }

    #[test]
    fn test_range_desc_conversion() {
        let desc = RangeDesc::from(Range::downto(7, 0));
        assert_eq!(
            desc,
            RangeDesc {
                left: 7,
                right: 0,
                dir: 1,
                len: 8
            }
        );
        assert_eq!(Range::from(desc), Range::downto(7, 0));
    }
}
