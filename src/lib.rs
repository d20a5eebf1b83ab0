//! vunit-ext - External buffers and typed values for VHDL simulations
//!
//! Lets a simulator hand out stable, resizable references to raw byte buffers
//! and exchange typed values with foreign code across a byte-oriented
//! boundary.
//!
//! # Features
//!
//! - **Handle table**: integer handles to named byte buffers, with resize,
//!   rotate/drop shifting and LIFO reuse of freed slots
//! - **Type catalog**: 33 VHDL/IEEE/VUnit type kinds with exact bit widths
//! - **Binary codec**: scalars, bounds headers and packed arrays, little-endian
//! - **Typed items**: tag plus encoded value, with type-checked conversions
//! - **VHPIDIRECT exports**: `vhpi_ptr_*` functions over a process-wide table
//!
//! # Example
//!
//! ```rust
//! use vunit_ext::{HandleTable, Item, TypeTag};
//!
//! let mut table = HandleTable::new();
//! let h = table.allocate(8, Some(&[0u8, 1, 2, 3, 4, 5, 6, 7][..]), Some("fifo")).unwrap();
//! table.resize_with_shift::<u8>(h, 10, 9, 3, 0).unwrap();
//! assert_eq!(table.raw(h).unwrap(), [3, 4, 5, 6, 7, 9, 9, 9, 9, 9]);
//!
//! let item = Item::from_string("hello");
//! assert_eq!(item.tag(), TypeTag::String);
//! assert_eq!(item.to_text().unwrap(), "hello");
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Simulator     │  VHPIDIRECT calls
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   boundary      │  array descriptors, views, vhpi_ptr_*
//! └────────┬────────┘
//!          │
//!     ┌────┴─────┐
//!     ▼          ▼
//! ┌────────┐  ┌────────┐
//! │storage │  │  item  │
//! └────────┘  └───┬────┘
//!                 ▼
//!             ┌────────┐
//!             │ codec  │──▶ types
//!             └────────┘
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod codec;
pub mod config;
pub mod item;
pub mod storage;
pub mod types;

pub use boundary::{
    array_to_string, byte_view, byte_view_mut, int_view, int_view_mut, string_to_array,
    to_c_string, ArrayDesc, ArrayView, ArrayViewMut, RangeDesc,
};
pub use codec::{
    decode_array, decode_array_with, decode_range, decode_scalar, encode_array, encode_range,
    encode_scalar, ArrayValue, CodecError, DecodeOptions, Direction, ElementRef, Fixed, Range,
};
pub use config::{CodecConfig, ConfigError, ExtConfig, StorageConfig};
pub use item::{Item, ItemError};
pub use storage::{
    Element, Handle, HandleFault, HandleTable, SlotInfo, StorageError, StorageResult,
};
pub use types::{type_check, TypeMismatch, TypeTag};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
