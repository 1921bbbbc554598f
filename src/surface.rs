//! The handful of operations every other entry point (the `GlobalAlloc`
//! wrapper, the C ABI shim, direct crate users) funnels through.
//!
//! Classification between the large and small paths is a pointer check,
//! not a branch on the requested size: a large allocation's returned
//! pointer sits exactly [`config::SLICE_UNIT`] bytes into its mapping,
//! while a small allocation's pointer is at least two slice units in
//! (see [`block::init`]). No small allocation can ever collide with that
//! tag, so `free`/`resize` work without the caller repeating the size
//! class.

use crate::block;
use crate::config;
use crate::large;
use crate::small;
use std::ptr::NonNull;

fn is_large(ptr: NonNull<u8>) -> bool {
    (ptr.as_ptr() as usize) & config::BLOCK_MASK == config::SLICE_UNIT
}

/// Allocates at least `size` bytes. `None` iff `size == 0`, on overflow,
/// or on system memory exhaustion.
pub fn allocate(size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
        return None;
    }
    if size >= config::SMALL_ALLOC_THRESHOLD {
        large::allocate(size)
    } else {
        small::allocate(size)
    }
}

/// Allocates `count * size` bytes, zeroed. `None` on overflow (including
/// the `count * size` multiplication) or system memory exhaustion.
///
/// No explicit zero-fill is needed here: a large allocation is a fresh
/// anonymous mapping, zeroed by the kernel, and a small slice is always
/// cut from a block that is either fresh (same guarantee) or recycled
/// (zero-filled in `pool::release` before it rejoins the pool, see
/// its doc comment). Every byte an allocation can observe is therefore
/// already zero.
pub fn zero_allocate(count: usize, size: usize) -> Option<NonNull<u8>> {
    let total = count.checked_mul(size)?;
    allocate(total)
}

/// Releases an allocation. `None` is a no-op, matching `free(NULL)`.
pub fn free(ptr: Option<NonNull<u8>>) {
    let Some(ptr) = ptr else { return };
    if is_large(ptr) {
        large::free(ptr);
    } else {
        small::free(ptr);
    }
}

/// Resizes an allocation whose previous size isn't known to the caller.
/// `None` behaves like `allocate(new_size)`. For the small path, since no
/// per-slice size is tracked, the copied region is bounded by the
/// distance from `ptr` to its block's end rather than the exact old
/// size. Callers that know the old size should prefer
/// [`resize_known`], which copies precisely.
///
/// A large allocation's own resize (see [`large::resize`]) is reached
/// directly, without computing `old_size` at all: it is unused on that
/// path, matching the original's `fio_realloc2`, which branches to
/// `big_realloc` before ever touching `original_size`.
pub fn resize(ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
    let Some(ptr) = ptr else { return allocate(new_size) };
    if is_large(ptr) {
        return large::resize(ptr, new_size);
    }
    let blk = block::of(ptr);
    let offset = ptr.as_ptr() as usize - blk.as_ptr() as usize;
    let old_size = config::BLOCK_SIZE - offset;
    resize_known(ptr, old_size, new_size)
}

/// Resizes an allocation whose previous size the caller already knows,
/// copying exactly `old_size.min(new_size)` bytes.
///
/// `new_size == 0` on the small path is not special-cased: it falls
/// through to `allocate(0)`, which is `None` per the size-zero rule, so
/// the `?` below returns `None` *before* `small::free(ptr)` runs and the
/// original allocation is left untouched (and leaked, exactly as calling
/// this with `new_size == 0` leaks in the original). This mirrors
/// `fio_realloc2` (`fio_mem.c`): it never tests `new_size` for zero
/// either, it just calls `fio_malloc(new_size)` and returns early on
/// `!new_mem` — the same check that also covers genuine
/// out-of-memory — before reaching `block_slice_free(ptr)`. A large
/// `ptr` skips all of this and goes straight to `large::resize`, which
/// (like `big_realloc`) rounds `new_size + SLICE_UNIT` up to a page and
/// shrinks in place rather than ever returning null for a zero request.
pub fn resize_known(ptr: NonNull<u8>, old_size: usize, new_size: usize) -> Option<NonNull<u8>> {
    if is_large(ptr) {
        return large::resize(ptr, new_size);
    }
    let new_ptr = allocate(new_size)?;
    let copy_len = old_size.min(new_size);
    unsafe { std::ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), copy_len) };
    small::free(ptr);
    Some(new_ptr)
}
