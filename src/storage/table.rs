//! Handle table

use super::{Element, Handle, HandleFault, StorageError, StorageResult};
use crate::config::StorageConfig;

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    buffer: Vec<u8>,
}

/// One occupied slot, as reported by [`HandleTable::iter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo<'a> {
    pub handle: Handle,
    pub name: &'a str,
    pub size: usize,
}

/// Zero-filled buffer of `len` bytes, reporting allocation failure as an error
fn zeroed(len: usize) -> StorageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| StorageError::AllocationFailure { bytes: len })?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Buffer of `len` bytes starting with as much of `init` as fits
fn filled(len: usize, init: Option<&[u8]>) -> StorageResult<Vec<u8>> {
    let mut buffer = zeroed(len)?;
    if let Some(data) = init {
        let n = len.min(data.len());
        buffer[..n].copy_from_slice(&data[..n]);
    }
    Ok(buffer)
}

/// Growable table of named byte buffers addressed by [`Handle`].
///
/// Every index below [`occupied_count`](Self::occupied_count) is either
/// occupied or on the free list exactly once. Freed indices are reused LIFO
/// before the table grows.
#[derive(Debug, Clone, Default)]
pub struct HandleTable {
    slots: Vec<Option<Slot>>,
    next: usize,
    free: Vec<usize>,
    config: StorageConfig,
}

impl HandleTable {
    /// Create an empty table with default settings. No slots are reserved
    /// until the first allocation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Allocate a zeroed buffer of `length` bytes, copying in the front of
    /// `init` if given. An absent or empty name is replaced by the configured
    /// prefix followed by the handle in hex.
    pub fn allocate(
        &mut self,
        length: usize,
        init: Option<&[u8]>,
        name: Option<&str>,
    ) -> StorageResult<Handle> {
        if length == 0 {
            return Err(StorageError::contract("ptr_new", "size must be > 0"));
        }
        let buffer = filled(length, init)?;
        let index = self.take_index()?;
        let handle = Handle(index as i32);

        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("{}{:08x}", self.config.name_prefix, index as u32),
        };
        log::debug!("allocate {} '{}' ({} bytes)", handle, name, length);
        self.slots[index] = Some(Slot { name, buffer });
        Ok(handle)
    }

    /// Replace the buffer of `handle` with a fresh one of `length` bytes.
    /// Old contents are not preserved.
    pub fn reallocate(
        &mut self,
        handle: Handle,
        length: usize,
        init: Option<&[u8]>,
    ) -> StorageResult<()> {
        self.check_valid(handle)?;
        if length == 0 {
            return Err(StorageError::contract("ptr_reallocate", "size must be > 0"));
        }
        let buffer = filled(length, init)?;
        let slot = self.slot_mut(handle)?;
        log::debug!("reallocate {} ({} -> {} bytes)", handle, slot.buffer.len(), length);
        slot.buffer = buffer;
        Ok(())
    }

    /// Free the slot behind `handle` and null the caller's copy.
    /// Deallocating a null handle does nothing.
    pub fn deallocate(&mut self, handle: &mut Handle) -> StorageResult<()> {
        if handle.is_null() {
            return Ok(());
        }
        self.check_valid(*handle)?;
        let index = handle.0 as usize;
        if let Some(slot) = self.slots[index].take() {
            log::debug!("deallocate {} '{}'", handle, slot.name);
        }
        self.free.push(index);
        *handle = Handle::NULL;
        Ok(())
    }

    /// First handle, in ascending order, whose name is `name`; null if none
    pub fn find(&self, name: &str) -> Handle {
        self.slots[..self.next]
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.name == name))
            .map_or(Handle::NULL, |i| Handle(i as i32))
    }

    /// Deep copy of `handle` into a new slot. A null handle copies to null.
    pub fn copy(&mut self, handle: Handle, name: Option<&str>) -> StorageResult<Handle> {
        if handle.is_null() {
            return Ok(Handle::NULL);
        }
        let data = self.raw(handle)?.to_vec();
        self.allocate(data.len(), Some(data.as_slice()), name)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn check_valid(&self, handle: Handle) -> StorageResult<()> {
        self.slot(handle).map(|_| ())
    }

    /// Size in bytes
    pub fn size(&self, handle: Handle) -> StorageResult<usize> {
        Ok(self.slot(handle)?.buffer.len())
    }

    pub fn name(&self, handle: Handle) -> StorageResult<&str> {
        Ok(&self.slot(handle)?.name)
    }

    pub fn raw(&self, handle: Handle) -> StorageResult<&[u8]> {
        Ok(&self.slot(handle)?.buffer)
    }

    pub fn raw_mut(&mut self, handle: Handle) -> StorageResult<&mut [u8]> {
        Ok(&mut self.slot_mut(handle)?.buffer)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.next - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots reserved, occupied or not
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// High-water mark: indices at or above it have never been handed out
    pub fn occupied_count(&self) -> usize {
        self.next
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Occupied slots in ascending handle order
    pub fn iter(&self) -> impl Iterator<Item = SlotInfo<'_>> + '_ {
        self.slots[..self.next]
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.as_ref().map(|s| SlotInfo {
                    handle: Handle(i as i32),
                    name: &s.name,
                    size: s.buffer.len(),
                })
            })
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Resize to `length` bytes, keeping the front and zero-filling the rest
    pub fn resize(&mut self, handle: Handle, length: usize) -> StorageResult<()> {
        self.check_valid(handle)?;
        if length == 0 {
            return Err(StorageError::contract("ptr_resize", "new_size must be > 0"));
        }
        let mut buffer = zeroed(length)?;
        let slot = self.slot_mut(handle)?;
        let keep = slot.buffer.len().min(length);
        buffer[..keep].copy_from_slice(&slot.buffer[..keep]);
        log::trace!("resize {} ({} -> {} bytes)", handle, slot.buffer.len(), length);
        slot.buffer = buffer;
        Ok(())
    }

    /// Resize to `length` elements of `E`.
    ///
    /// The first `min(length, old - drop)` elements are taken from the old
    /// buffer starting at `drop + rotate`, wrapping around its end; the rest
    /// are set to `fill`. `drop` and `rotate` cannot both be non-zero.
    pub fn resize_with_shift<E: Element>(
        &mut self,
        handle: Handle,
        length: usize,
        fill: E,
        drop: usize,
        rotate: usize,
    ) -> StorageResult<()> {
        let op = if E::WIDTH == 1 {
            "ptr_resize_char"
        } else {
            "ptr_resize_int"
        };
        self.check_valid(handle)?;
        if length == 0 {
            return Err(StorageError::contract(op, "new_length must be > 0"));
        }
        if drop > 0 && rotate > 0 {
            return Err(StorageError::contract(
                op,
                "cannot use drop and rotate simultaneously",
            ));
        }
        let bytes = length
            .checked_mul(E::WIDTH)
            .ok_or(StorageError::AllocationFailure { bytes: usize::MAX })?;
        let mut buffer = zeroed(bytes)?;

        let slot = self.slot_mut(handle)?;
        let old = &slot.buffer;
        let old_len = old.len() / E::WIDTH;
        let kept = length.min(old_len.saturating_sub(drop));
        // drop and rotate are exclusive, so at most one term is non-zero
        let start = match old_len {
            0 => 0,
            n => (drop % n + rotate % n) % n,
        };

        for (i, dst) in buffer.chunks_exact_mut(E::WIDTH).enumerate() {
            let value = if i < kept {
                let src = (start + i) % old_len;
                E::read(&old[src * E::WIDTH..])
            } else {
                fill
            };
            value.write(dst);
        }
        log::trace!(
            "{} {}: {} -> {} elements, drop {}, rotate {}",
            op,
            handle,
            old_len,
            length,
            drop,
            rotate
        );
        slot.buffer = buffer;
        Ok(())
    }

    /// Element `index` at stride `E`
    pub fn get<E: Element>(&self, handle: Handle, index: usize) -> StorageResult<E> {
        let buffer = &self.slot(handle)?.buffer;
        let start = Self::element_start::<E>(handle, buffer.len(), index)?;
        Ok(E::read(&buffer[start..]))
    }

    /// Store `value` as element `index` at stride `E`
    pub fn set<E: Element>(&mut self, handle: Handle, index: usize, value: E) -> StorageResult<()> {
        let buffer = &mut self.slot_mut(handle)?.buffer;
        let start = Self::element_start::<E>(handle, buffer.len(), index)?;
        value.write(&mut buffer[start..]);
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn element_start<E: Element>(handle: Handle, size: usize, index: usize) -> StorageResult<usize> {
        let len = size / E::WIDTH;
        if index >= len {
            return Err(StorageError::IndexOutOfBounds { handle, index, len });
        }
        Ok(index * E::WIDTH)
    }

    fn fault(&self, handle: Handle) -> Option<HandleFault> {
        match handle.index() {
            None => Some(HandleFault::Null),
            Some(i) if i >= self.next => Some(HandleFault::OutOfRange),
            Some(i) if self.slots[i].is_none() => Some(HandleFault::Freed),
            Some(_) => None,
        }
    }

    fn slot(&self, handle: Handle) -> StorageResult<&Slot> {
        if let Some(fault) = self.fault(handle) {
            return Err(StorageError::InvalidHandle { handle, fault });
        }
        self.slots[handle.0 as usize]
            .as_ref()
            .ok_or(StorageError::InvalidHandle {
                handle,
                fault: HandleFault::Freed,
            })
    }

    fn slot_mut(&mut self, handle: Handle) -> StorageResult<&mut Slot> {
        if let Some(fault) = self.fault(handle) {
            return Err(StorageError::InvalidHandle { handle, fault });
        }
        self.slots[handle.0 as usize]
            .as_mut()
            .ok_or(StorageError::InvalidHandle {
                handle,
                fault: HandleFault::Freed,
            })
    }

    /// Pop a freed index, or hand out `next`, growing the slot array first
    /// if it is full
    fn take_index(&mut self) -> StorageResult<usize> {
        if let Some(index) = self.free.pop() {
            return Ok(index);
        }
        if self.next >= i32::MAX as usize {
            return Err(StorageError::AllocationFailure {
                bytes: std::mem::size_of::<Option<Slot>>(),
            });
        }
        if self.next >= self.slots.len() {
            self.grow()?;
        }
        let index = self.next;
        self.next += 1;
        Ok(index)
    }

    fn grow(&mut self) -> StorageResult<()> {
        let current = self.slots.len();
        let target = if current == 0 {
            self.config.initial_capacity.max(1)
        } else {
            current.saturating_mul(2)
        };
        let extra = target - current;
        self.slots.try_reserve_exact(extra).map_err(|_| {
            StorageError::AllocationFailure {
                bytes: extra.saturating_mul(std::mem::size_of::<Option<Slot>>()),
            }
        })?;
        self.slots.resize_with(target, || None);
        log::debug!("handle table grown to {} slots", target);
        Ok(())
    }
}
