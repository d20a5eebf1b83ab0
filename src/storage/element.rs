//! Element strides for typed access to slot buffers

use std::fmt::Debug;

/// A fixed-width value stored little-endian inside a byte buffer.
///
/// Implemented for `u8` (characters, stride 1) and `i32` (integers, stride 4).
pub trait Element: Copy + Debug + PartialEq + 'static {
    /// Stride in bytes
    const WIDTH: usize;

    /// Read from the first `WIDTH` bytes of `bytes`
    fn read(bytes: &[u8]) -> Self;

    /// Write into the first `WIDTH` bytes of `out`
    fn write(self, out: &mut [u8]);
}

impl Element for u8 {
    const WIDTH: usize = 1;

    fn read(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write(self, out: &mut [u8]) {
        out[0] = self;
    }
}

impl Element for i32 {
    const WIDTH: usize = 4;

    fn read(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn write(self, out: &mut [u8]) {
        out[..4].copy_from_slice(&self.to_le_bytes());
    }
}
