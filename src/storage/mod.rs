//! Handle-indexed buffer storage
//!
//! A [`HandleTable`] maps small integer handles to owned byte buffers. Handles
//! stay stable across resizes and are recycled through a LIFO free list once
//! their slot is deallocated.
//!
//! ```text
//!   handle:   0      1      2      3    ...  next        capacity
//!           ┌──────┬──────┬──────┬──────┬───┬──────┬───┬─────┐
//!   slots:  │ buf  │ ---- │ buf  │ buf  │...│      │...│     │
//!           └──────┴──────┴──────┴──────┴───┴──────┴───┴─────┘
//!   free:   [1]            (freed slots are reused before `next` advances)
//! ```

mod element;
mod global;
mod table;


pub use element::Element;
pub use global::{global_config, global_table, with_global_table};
pub use table::{HandleTable, SlotInfo};

use std::fmt;

use thiserror::Error;

/// Opaque reference to a slot. Negative values are null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(pub i32);

impl Handle {
    /// Canonical null handle
    pub const NULL: Handle = Handle(-1);

    pub fn is_null(self) -> bool {
        self.0 < 0
    }

    /// Slot index, or `None` for null handles
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NULL
    }
}

impl From<i32> for Handle {
    fn from(raw: i32) -> Self {
        Handle(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Why a handle failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleFault {
    /// Negative handle
    Null,
    /// Beyond every slot ever handed out
    OutOfRange,
    /// Slot was deallocated
    Freed,
}

impl fmt::Display for HandleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HandleFault::Null => "null",
            HandleFault::OutOfRange => "out of range",
            HandleFault::Freed => "unallocated",
        };
        f.write_str(s)
    }
}

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("attempted to access invalid ext_ptr {handle} ({fault})")]
    InvalidHandle { handle: Handle, fault: HandleFault },

    #[error("failed to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },

    #[error("{op}: {reason}")]
    ContractViolation {
        op: &'static str,
        reason: &'static str,
    },

    #[error("index {index} out of bounds for ext_ptr {handle} with {len} elements")]
    IndexOutOfBounds {
        handle: Handle,
        index: usize,
        len: usize,
    },
}

impl StorageError {
    pub(crate) fn contract(op: &'static str, reason: &'static str) -> Self {
        StorageError::ContractViolation { op, reason }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
