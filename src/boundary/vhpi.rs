//! VHPIDIRECT entry points
//!
//! Foreign functions the simulator binds to. They all act on the process-wide
//! table. Errors are fatal here: the message is logged, printed to stderr and
//! the process exits with status 1, since the simulator has no way to receive
//! them.
//!
//! Bounds descriptors handed back through `vhpi_ptr_name`, `vhpi_ptr_to_string`
//! and `vhpi_ptr_to_int_vec` are owned by this module. Each one stays valid
//! until the same view of the same handle is requested again or the handle is
//! deallocated.
//!
//! Entry points that touch both the host state and the table hold both locks
//! for the whole call, always taking the host state first.

use std::collections::HashMap;
use std::fmt::Display;

use parking_lot::Mutex;

use super::{ArrayDesc, RangeDesc};
use crate::codec::Range;
use crate::storage::{with_global_table, Handle, HandleTable, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ViewKind {
    Name,
    Bytes,
    Ints,
}

/// Host-visible memory that must outlive the call that produced it
#[derive(Default)]
struct HostState {
    ranges: HashMap<(i32, ViewKind), Box<RangeDesc>>,
    names: HashMap<i32, Box<[u8]>>,
}

lazy_static::lazy_static! {
    static ref HOST_STATE: Mutex<HostState> = Mutex::new(HostState::default());
}

impl HostState {
    fn range(&mut self, handle: i32, kind: ViewKind, range: Range) -> *mut RangeDesc {
        let slot = self
            .ranges
            .entry((handle, kind))
            .or_insert_with(Box::default);
        **slot = range.into();
        &mut **slot
    }

    fn forget(&mut self, handle: i32) {
        self.ranges.retain(|(h, _), _| *h != handle);
        self.names.remove(&handle);
    }
}

fn fatal(op: &str, message: impl Display) -> ! {
    log::error!("{}: {}", op, message);
    eprintln!("{}: {}", op, message);
    std::process::exit(1)
}

/// Unwrap a result or terminate the simulation
fn or_exit<T, E: Display>(op: &str, result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => fatal(op, e),
    }
}

/// Host bytes of an optional array argument
fn host_bytes<'a>(array: *const ArrayDesc) -> Option<&'a [u8]> {
    if array.is_null() {
        return None;
    }
    unsafe { (*array).bytes(1) }
}

/// Host string argument; null or empty arrays give `None`
fn host_name(array: *const ArrayDesc) -> Option<String> {
    host_bytes(array)
        .filter(|b| !b.is_empty())
        .map(|b| super::to_c_string(b).to_string_lossy().into_owned())
}

fn write_array(out: *mut ArrayDesc, value: *mut u8, range: *mut RangeDesc) {
    if out.is_null() {
        fatal("vhpi", "null array descriptor");
    }
    unsafe {
        (*out).value = value;
        (*out).range = range;
    }
}

fn table_op<T, F>(op: &str, f: F) -> T
where
    F: FnOnce(&mut HandleTable) -> StorageResult<T>,
{
    or_exit(op, with_global_table(f))
}

/// Like [`table_op`], with the host state locked around the table operation
fn host_op<T, F>(op: &str, f: F) -> T
where
    F: FnOnce(&mut HandleTable, &mut HostState) -> StorageResult<T>,
{
    let mut state = HOST_STATE.lock();
    or_exit(op, with_global_table(|t| f(t, &mut *state)))
}

// ========== Lifecycle ==========

/// Allocate `size` bytes, initialized from `data` if it is non-null
#[no_mangle]
pub extern "C" fn vhpi_ptr_new(
    size: u32,
    data: *const ArrayDesc,
    name: *const ArrayDesc,
) -> i32 {
    let init = host_bytes(data);
    let name = host_name(name);
    table_op("ptr_new", |t| t.allocate(size as usize, init, name.as_deref())).raw()
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_reallocate(reference: i32, size: u32, data: *const ArrayDesc) {
    let init = host_bytes(data);
    host_op("ptr_reallocate", |t, state| {
        t.reallocate(Handle(reference), size as usize, init)?;
        state.forget(reference);
        Ok(())
    });
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_deallocate(reference: i32) {
    let mut handle = Handle(reference);
    host_op("ptr_deallocate", |t, state| {
        t.deallocate(&mut handle)?;
        state.forget(reference);
        Ok(())
    });
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_find(name: *const ArrayDesc) -> i32 {
    let name = host_name(name).unwrap_or_default();
    with_global_table(|t| t.find(&name)).raw()
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_copy(reference: i32, name: *const ArrayDesc) -> i32 {
    let name = host_name(name);
    table_op("ptr_copy", |t| t.copy(Handle(reference), name.as_deref())).raw()
}

// ========== Introspection ==========

#[no_mangle]
pub extern "C" fn vhpi_ptr_name(name: *mut ArrayDesc, reference: i32) {
    let (value, range) = host_op("ptr_name", |t, state| {
        let bytes: Box<[u8]> = t.name(Handle(reference))?.as_bytes().into();
        let range = state.range(
            reference,
            ViewKind::Name,
            Range::ascending(1, bytes.len() as u32),
        );
        let stored = state.names.entry(reference).or_default();
        *stored = bytes;
        Ok((stored.as_mut_ptr(), range))
    });
    write_array(name, value, range);
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_size(reference: i32) -> u32 {
    table_op("ptr_size", |t| t.size(Handle(reference))) as u32
}

/// Expose the buffer as a `1 to size` string aliasing the slot
#[no_mangle]
pub extern "C" fn vhpi_ptr_to_string(array: *mut ArrayDesc, reference: i32) {
    let (value, range) = host_op("ptr_to_string", |t, state| {
        let mut view = super::byte_view_mut(t, Handle(reference))?;
        let range = state.range(reference, ViewKind::Bytes, view.bounds());
        Ok((view.as_mut_bytes().as_mut_ptr(), range))
    });
    write_array(array, value, range);
}

/// Expose the buffer as a `0 to size/4 - 1` integer vector aliasing the slot
#[no_mangle]
pub extern "C" fn vhpi_ptr_to_int_vec(array: *mut ArrayDesc, reference: i32) {
    let (value, range) = host_op("ptr_to_int_vec", |t, state| {
        let mut view = super::int_view_mut(t, Handle(reference))?;
        let range = state.range(reference, ViewKind::Ints, view.bounds());
        Ok((view.as_mut_bytes().as_mut_ptr(), range))
    });
    write_array(array, value, range);
}

// ========== Mutation ==========

#[no_mangle]
pub extern "C" fn vhpi_ptr_resize(reference: i32, size: u32) {
    table_op("ptr_resize", |t| t.resize(Handle(reference), size as usize));
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_resize_char(
    reference: i32,
    new_length: u32,
    value: u8,
    drop: u32,
    rotate: u32,
) {
    table_op("ptr_resize_char", |t| {
        t.resize_with_shift::<u8>(
            Handle(reference),
            new_length as usize,
            value,
            drop as usize,
            rotate as usize,
        )
    });
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_resize_int(
    reference: i32,
    new_length: u32,
    value: i32,
    drop: u32,
    rotate: u32,
) {
    table_op("ptr_resize_int", |t| {
        t.resize_with_shift::<i32>(
            Handle(reference),
            new_length as usize,
            value,
            drop as usize,
            rotate as usize,
        )
    });
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_get_char(reference: i32, index: u32) -> u8 {
    table_op("ptr_get_char", |t| t.get::<u8>(Handle(reference), index as usize))
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_set_char(reference: i32, index: u32, value: u8) {
    table_op("ptr_set_char", |t| {
        t.set::<u8>(Handle(reference), index as usize, value)
    });
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_get_int(reference: i32, index: u32) -> i32 {
    table_op("ptr_get_int", |t| t.get::<i32>(Handle(reference), index as usize))
}

#[no_mangle]
pub extern "C" fn vhpi_ptr_set_int(reference: i32, index: u32, value: i32) {
    table_op("ptr_set_int", |t| {
        t.set::<i32>(Handle(reference), index as usize, value)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_string(s: &mut Vec<u8>, range: &mut RangeDesc) -> ArrayDesc {
        *range = Range::ascending(1, s.len() as u32).into();
        ArrayDesc {
            value: s.as_mut_ptr(),
            range,
        }
    }

    unsafe fn read_back(array: &ArrayDesc) -> (RangeDesc, Vec<u8>) {
        let range = *array.range;
        let bytes = array.bytes(1).unwrap_or_default().to_vec();
        (range, bytes)
    }

    #[test]
    fn test_vhpi_lifecycle() {
        let mut name = b"vhpi_lifecycle".to_vec();
        let mut name_range = RangeDesc::default();
        let name_desc = host_string(&mut name, &mut name_range);

        let mut data = b"wxyz".to_vec();
        let mut data_range = RangeDesc::default();
        let data_desc = host_string(&mut data, &mut data_range);

        let r = vhpi_ptr_new(8, &data_desc, &name_desc);
        assert!(r >= 0);
        assert_eq!(vhpi_ptr_find(&name_desc), r);
        assert_eq!(vhpi_ptr_size(r), 8);
        assert_eq!(vhpi_ptr_get_char(r, 0), b'w');
        assert_eq!(vhpi_ptr_get_char(r, 5), 0);

        vhpi_ptr_set_int(r, 1, -1);
        assert_eq!(vhpi_ptr_get_char(r, 4), 0xFF);

        let mut out = ArrayDesc {
            value: std::ptr::null_mut(),
            range: std::ptr::null_mut(),
        };
        vhpi_ptr_to_string(&mut out, r);
        let (range, bytes) = unsafe { read_back(&out) };
        assert_eq!((range.left, range.right, range.dir, range.len), (1, 8, 0, 8));
        assert_eq!(&bytes[..4], b"wxyz");

        vhpi_ptr_to_int_vec(&mut out, r);
        let range = unsafe { *out.range };
        assert_eq!((range.left, range.right, range.len), (0, 1, 2));

        vhpi_ptr_name(&mut out, r);
        let (_, bytes) = unsafe { read_back(&out) };
        assert_eq!(bytes, b"vhpi_lifecycle");

        let copy = vhpi_ptr_copy(r, std::ptr::null());
        assert_ne!(copy, r);
        assert_eq!(vhpi_ptr_get_int(copy, 1), -1);

        vhpi_ptr_resize_char(r, 6, b'.', 4, 0);
        assert_eq!(vhpi_ptr_size(r), 6);
        assert_eq!(vhpi_ptr_get_char(r, 3), 0xFF);
        assert_eq!(vhpi_ptr_get_char(r, 4), b'.');

        vhpi_ptr_deallocate(r);
        vhpi_ptr_deallocate(copy);
        assert_eq!(vhpi_ptr_find(&name_desc), -1);
        vhpi_ptr_deallocate(-1);
    }

    #[test]
    fn test_vhpi_names_survive_concurrent_reuse() {
        let workers: Vec<_> = (0..4)
            .map(|w| {
                std::thread::spawn(move || {
                    for round in 0..200 {
                        let mut name = format!("worker{}_{}", w, round).into_bytes();
                        let mut range = RangeDesc::default();
                        let desc = host_string(&mut name, &mut range);
                        let r = vhpi_ptr_new(4, std::ptr::null(), &desc);

                        let mut out = ArrayDesc {
                            value: std::ptr::null_mut(),
                            range: std::ptr::null_mut(),
                        };
                        vhpi_ptr_name(&mut out, r);
                        let (bounds, bytes) = unsafe { read_back(&out) };
                        assert_eq!(bounds.len as usize, name.len());
                        assert_eq!(bytes, name);
                        vhpi_ptr_deallocate(r);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
    }

    #[test]
    fn test_vhpi_resize_int() {
        let r = vhpi_ptr_new(8, std::ptr::null(), std::ptr::null());
        vhpi_ptr_set_int(r, 0, 5);
        vhpi_ptr_set_int(r, 1, 6);
        vhpi_ptr_resize_int(r, 3, 9, 0, 1);
        assert_eq!(vhpi_ptr_size(r), 12);
        assert_eq!(vhpi_ptr_get_int(r, 0), 6);
        assert_eq!(vhpi_ptr_get_int(r, 1), 5);
        assert_eq!(vhpi_ptr_get_int(r, 2), 9);
        vhpi_ptr_resize(r, 2);
        assert_eq!(vhpi_ptr_size(r), 2);
        vhpi_ptr_deallocate(r);
    }
}
