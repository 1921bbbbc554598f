//! Stand-in for [`crate::surface`] when the block-slab engine is compiled
//! out entirely (feature `force_system_alloc`). Every operation routes
//! straight to the platform allocator via `libc`.
//!
//! The crate's own API carries no `Layout`, so there is no size to hand
//! `std::alloc::System` on `free`/`realloc`. `libc::malloc` and friends
//! don't need one either, which is why this delegates to them instead of
//! the `std::alloc` traits.

use std::ptr::NonNull;

pub fn allocate(size: usize) -> Option<NonNull<u8>> {
    NonNull::new(unsafe { libc::malloc(size) }.cast())
}

pub fn zero_allocate(count: usize, size: usize) -> Option<NonNull<u8>> {
    NonNull::new(unsafe { libc::calloc(count, size) }.cast())
}

pub fn free(ptr: Option<NonNull<u8>>) {
    let Some(ptr) = ptr else { return };
    unsafe { libc::free(ptr.as_ptr().cast()) };
}

pub fn resize(ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
    let raw = ptr.map_or(std::ptr::null_mut(), |p| p.as_ptr().cast());
    NonNull::new(unsafe { libc::realloc(raw, new_size) }.cast())
}

pub fn resize_known(ptr: NonNull<u8>, _old_size: usize, new_size: usize) -> Option<NonNull<u8>> {
    resize(Some(ptr), new_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_free_round_trip() {
        let ptr = allocate(64).expect("allocate");
        unsafe { ptr.as_ptr().write(7) };
        free(Some(ptr));
    }

    #[test]
    fn resize_of_none_behaves_like_allocate() {
        let ptr = resize(None, 16).expect("resize(None, _)");
        free(Some(ptr));
    }
}
