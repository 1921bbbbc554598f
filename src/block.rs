//! The block header and the small-slice cutting logic that reads/writes it.
//!
//! A block is a [`config::BLOCK_SIZE`]-byte, block-aligned mapping whose
//! first slice unit holds this header. Everything past the header is cut
//! into slices for small allocations.

use crate::config;
use crate::pool;
use core::sync::atomic::{AtomicU16, Ordering};
use std::ptr::NonNull;

#[repr(C)]
pub(crate) struct Header {
    /// Reference count: one per outstanding slice plus one for the arena
    /// holding the block active. Mutated with atomic RMW since a `free`
    /// on any worker can race a slice cut on the owning arena.
    pub(crate) refs: AtomicU16,
    /// Index, in slice units, of the next unused offset. Only ever
    /// touched while the owning arena's lock is held.
    pub(crate) pos: u16,
    /// Cap, in slice units, beyond which the block is exhausted.
    pub(crate) max: u16,
    _pad: u16,
}

/// Writes a fresh header at `ptr`, which must be the base of a
/// [`config::BLOCK_SIZE`]-byte, block-aligned mapping (or a popped,
/// zero-filled recycled block).
pub(crate) fn init(ptr: NonNull<u8>) -> NonNull<Header> {
    let header = ptr.cast::<Header>();
    let slices = (config::BLOCK_SIZE / config::SLICE_UNIT) as u16;
    unsafe {
        header.as_ptr().write(Header {
            refs: AtomicU16::new(1),
            pos: config::HEADER_UNITS + 1,
            max: slices - 1 - config::HEADER_UNITS,
            _pad: 0,
        });
    }
    header
}

/// Recovers the owning block's header from any pointer returned by a
/// small allocation, by masking off the low `log2(BLOCK_SIZE)` bits.
pub(crate) fn of(ptr: NonNull<u8>) -> NonNull<Header> {
    let base = (ptr.as_ptr() as usize) & !config::BLOCK_MASK;
    unsafe { NonNull::new_unchecked(base as *mut Header) }
}

unsafe fn pos(block: NonNull<Header>) -> u16 {
    unsafe { (*block.as_ptr()).pos }
}

unsafe fn set_pos(block: NonNull<Header>, value: u16) {
    unsafe {
        (*block.as_ptr()).pos = value;
    }
}

unsafe fn max(block: NonNull<Header>) -> u16 {
    unsafe { (*block.as_ptr()).max }
}

/// Cuts a `units`-sized slice out of the block currently active in
/// `slot`, rotating to a new block first if the active one can't fit the
/// request (or there isn't one yet). Precondition: the caller holds the
/// arena lock guarding `slot`.
pub(crate) fn acquire_slice(slot: &mut Option<NonNull<Header>>, units: u16) -> Option<NonNull<u8>> {
    let needs_rotation = match *slot {
        None => true,
        Some(blk) => unsafe { pos(blk) + units > max(blk) },
    };
    if needs_rotation {
        if let Some(blk) = slot.take() {
            release(blk);
        }
        *slot = pool::new_block();
    }
    let blk = (*slot)?;

    let offset = unsafe { pos(blk) } as usize * config::SLICE_UNIT;
    let mem = unsafe { blk.as_ptr().cast::<u8>().add(offset) };
    unsafe { (*blk.as_ptr()).refs.fetch_add(1, Ordering::AcqRel) };

    let new_pos = unsafe { pos(blk) } + units;
    unsafe { set_pos(blk, new_pos) };
    if new_pos >= unsafe { max(blk) } {
        // Statistically a sliver remains, but treat the block as spent:
        // the next allocation through this arena forces a fresh block.
        release(blk);
        *slot = None;
    }

    NonNull::new(mem)
}

/// Drops one reference on `block`. When the count reaches zero the block
/// either rejoins the recycled pool (zero-filled) or is unmapped,
/// depending on pool occupancy. See [`pool::release`].
pub(crate) fn release(block: NonNull<Header>) {
    let header = unsafe { block.as_ref() };
    if header.refs.fetch_sub(1, Ordering::AcqRel) != 1 {
        return;
    }
    pool::release(block);
}
