//! Large-allocation path: requests at or above
//! [`config::SMALL_ALLOC_THRESHOLD`] go straight to the system pager.
//!
//! Each mapping is prefixed by one slice unit holding the total mapped
//! length, so free/resize can recover how much to unmap without needing
//! any per-object metadata elsewhere.

use crate::config;
use crate::error::PagerError;
use crate::pager;
use std::ptr::NonNull;

pub(crate) fn allocate(size: usize) -> Option<NonNull<u8>> {
    allocate_detailed(size).ok()
}

/// Same as [`allocate`], but surfaces *why* a failure happened. Used by
/// [`crate::lifecycle`], which needs to log the reason its one-time arena
/// array reservation failed before terminating the process; every other
/// caller goes through [`allocate`] since the public surface never
/// exposes more than `Option`.
pub(crate) fn allocate_detailed(size: usize) -> Result<NonNull<u8>, PagerError> {
    let total = size.checked_add(config::SLICE_UNIT).ok_or(PagerError::Overflow)?;
    let rounded = pager::round_up(total);
    let mem = pager::reserve_detailed(rounded, true)?;
    unsafe { mem.cast::<usize>().as_ptr().write(rounded) };
    NonNull::new(unsafe { mem.as_ptr().add(config::SLICE_UNIT) }).ok_or(PagerError::MapFailed)
}

pub(crate) fn free(ptr: NonNull<u8>) {
    let base = header_of(ptr);
    let len = unsafe { *base.cast::<usize>().as_ptr() };
    pager::release(base, len);
}

pub(crate) fn resize(ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
    let base = header_of(ptr);
    let prev_len = unsafe { *base.cast::<usize>().as_ptr() };
    let total = new_size.checked_add(config::SLICE_UNIT)?;
    let new_len = pager::round_up(total);
    let new_base = pager::resize(base, prev_len, new_len)?;
    unsafe { new_base.cast::<usize>().as_ptr().write(new_len) };
    NonNull::new(unsafe { new_base.as_ptr().add(config::SLICE_UNIT) })
}

fn header_of(ptr: NonNull<u8>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(ptr.as_ptr().sub(config::SLICE_UNIT)) }
}
