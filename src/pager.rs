//! Thin wrapper over the OS virtual-memory primitives.
//!
//! Everything here is a direct `mmap`/`munmap`/`mremap` call. The only
//! policy this module owns is producing [`config::BLOCK_SIZE`]-aligned
//! regions, since `mmap` itself gives no alignment guarantee beyond the
//! page size.

use crate::config;
use crate::error::PagerError;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::ptr::NonNull;

/// Address hint for the next reservation. Races between concurrent
/// callers are benign: a stale hint only costs `mmap` a retry at a worse
/// address, it never produces an incorrect mapping. `Relaxed` is enough.
static NEXT_HINT: AtomicUsize = AtomicUsize::new(0);

static PAGE_SIZE: spin::Once<usize> = spin::Once::new();

/// The OS page size, queried once via `sysconf` and cached.
pub(crate) fn page_size() -> usize {
    *PAGE_SIZE.call_once(|| {
        let queried = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if queried > 0 {
            queried as usize
        } else {
            4096
        }
    })
}

/// Rounds `size` up to the next page-size multiple.
pub(crate) fn round_up(size: usize) -> usize {
    let page = page_size();
    (size + page - 1) & !(page - 1)
}

/// Maps `len` bytes of anonymous read/write memory, aligned to
/// [`config::BLOCK_SIZE`]. `len` must already be a page-size multiple.
///
/// `individual` marks the reservation as a large (system-pager-backed)
/// allocation for the purpose of the next-hint bump: these advance the
/// hint by an extra gap so that small-allocation blocks and large
/// allocations don't interleave and fragment each other's address range.
pub(crate) fn reserve(len: usize, individual: bool) -> Option<NonNull<u8>> {
    reserve_detailed(len, individual).ok()
}

pub(crate) fn reserve_detailed(len: usize, individual: bool) -> Result<NonNull<u8>, PagerError> {
    debug_assert_eq!(
        len % page_size(),
        0,
        "pager::reserve requires a page-aligned length"
    );

    let hint = NEXT_HINT.load(Ordering::Relaxed) as *mut libc::c_void;
    let prot = libc::PROT_READ | libc::PROT_WRITE;
    let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;

    let mut result = unsafe { libc::mmap(hint, len, prot, flags, -1, 0) };
    if result == libc::MAP_FAILED {
        return Err(PagerError::MapFailed);
    }

    if (result as usize) & config::BLOCK_MASK != 0 {
        log::trace!("rallocator: mmap hint missed block alignment, retrying with slack");
        unsafe { libc::munmap(result, len) };
        let padded_len = len.checked_add(config::BLOCK_SIZE).ok_or(PagerError::Overflow)?;
        result = unsafe { libc::mmap(std::ptr::null_mut(), padded_len, prot, flags, -1, 0) };
        if result == libc::MAP_FAILED {
            return Err(PagerError::MapFailed);
        }
        let leading = (config::BLOCK_SIZE - ((result as usize) & config::BLOCK_MASK))
            & config::BLOCK_MASK;
        if leading != 0 {
            unsafe { libc::munmap(result, leading) };
            result = unsafe { result.add(leading) };
        }
        let trailing = padded_len - leading - len;
        if trailing != 0 {
            unsafe { libc::munmap(result.add(len), trailing) };
        }
    }

    let gap = if individual { config::LARGE_ALLOC_HINT_GAP } else { 0 };
    NEXT_HINT.store((result as usize) + len + gap, Ordering::Relaxed);

    NonNull::new(result.cast()).ok_or(PagerError::MapFailed)
}

/// Unmaps exactly `len` bytes at `ptr`. `ptr`/`len` must match a prior
/// [`reserve`] or [`resize`] result.
pub(crate) fn release(ptr: NonNull<u8>, len: usize) {
    unsafe { libc::munmap(ptr.as_ptr().cast(), len) };
}

/// Grows or shrinks a mapping in place where possible.
///
/// Growing prefers `mremap(MREMAP_MAYMOVE)` on Linux; elsewhere it probes
/// for contiguous space immediately after `ptr` and falls back to a fresh
/// reservation plus copy. Shrinking releases the trailing pages when more
/// than one page would otherwise dangle; anything smaller is left alone
/// since a single straggling page isn't worth the syscall.
pub(crate) fn resize(ptr: NonNull<u8>, prev_len: usize, new_len: usize) -> Option<NonNull<u8>> {
    if new_len > prev_len {
        return grow(ptr, prev_len, new_len);
    }
    let page = page_size();
    if new_len + page < prev_len {
        let trim_at = unsafe { ptr.as_ptr().add(new_len) };
        unsafe { libc::munmap(trim_at.cast(), prev_len - new_len) };
    }
    Some(ptr)
}

#[cfg(target_os = "linux")]
fn grow(ptr: NonNull<u8>, prev_len: usize, new_len: usize) -> Option<NonNull<u8>> {
    let result = unsafe {
        libc::mremap(ptr.as_ptr().cast(), prev_len, new_len, libc::MREMAP_MAYMOVE)
    };
    if result == libc::MAP_FAILED {
        return None;
    }
    NonNull::new(result.cast())
}

#[cfg(not(target_os = "linux"))]
fn grow(ptr: NonNull<u8>, prev_len: usize, new_len: usize) -> Option<NonNull<u8>> {
    let extra = new_len - prev_len;
    let extend_at = unsafe { ptr.as_ptr().add(prev_len) };
    let prot = libc::PROT_READ | libc::PROT_WRITE;
    let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;

    let attempt = unsafe { libc::mmap(extend_at.cast(), extra, prot, flags, -1, 0) };
    if attempt == extend_at.cast::<libc::c_void>() {
        // The kernel happened to place it right after our mapping.
        return Some(ptr);
    }
    if attempt != libc::MAP_FAILED {
        // Only release what we actually mapped, not a guess at `new_len`.
        unsafe { libc::munmap(attempt, extra) };
    }

    log::debug!("rallocator: in-place grow missed contiguity, falling back to reserve+copy");
    let fresh = reserve(new_len, true)?;
    unsafe { std::ptr::copy_nonoverlapping(ptr.as_ptr(), fresh.as_ptr(), prev_len) };
    unsafe { libc::munmap(ptr.as_ptr().cast(), prev_len) };
    Some(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_is_block_aligned_and_page_sized() {
        let len = round_up(config::BLOCK_SIZE);
        let mem = reserve(len, false).expect("reserve should succeed");
        assert_eq!(mem.as_ptr() as usize & config::BLOCK_MASK, 0);
        release(mem, len);
    }

    #[test]
    fn round_up_respects_page_size() {
        let page = page_size();
        assert_eq!(round_up(1), page);
        assert_eq!(round_up(page), page);
        assert_eq!(round_up(page + 1), page * 2);
    }

    #[test]
    fn reserve_write_resize_preserves_sentinels() {
        let len = round_up(config::BLOCK_SIZE);
        let mem = reserve(len, false).expect("reserve should succeed");
        unsafe {
            *mem.as_ptr() = b'a';
            *mem.as_ptr().add(len - 1) = b'z';
        }
        let grown_len = round_up(len * 2);
        let grown = resize(mem, len, grown_len).expect("grow should succeed");
        unsafe {
            assert_eq!(*grown.as_ptr(), b'a');
            assert_eq!(*grown.as_ptr().add(len - 1), b'z');
        }
        release(grown, grown_len);
    }
}
