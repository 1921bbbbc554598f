//! Global recycled-block pool.
//!
//! An intrusive LIFO stack of whole blocks awaiting reuse: while a block
//! sits on this list its header bytes are overwritten by a single `next`
//! pointer, and reinitialized on pop. Only push/pop are needed (nothing
//! here removes an arbitrary element), so a singly-linked stack is enough
//! No node allocation, no doubly-linked bookkeeping.

use crate::block::{self, Header};
use crate::config;
use crate::lifecycle;
use crate::pager;
use core::sync::atomic::{AtomicIsize, Ordering};
use std::ptr::NonNull;

struct Pool {
    head: spin::Mutex<*mut Header>,
    /// Occupancy minus a bias of `-worker_count`, so the first
    /// `worker_count` recycled blocks don't count against the cap.
    count: AtomicIsize,
}

unsafe impl Sync for Pool {}

static POOL: Pool = Pool {
    head: spin::Mutex::new(std::ptr::null_mut()),
    count: AtomicIsize::new(0),
};

unsafe fn read_link(block: NonNull<Header>) -> *mut Header {
    unsafe { block.as_ptr().cast::<*mut Header>().read() }
}

unsafe fn write_link(block: NonNull<Header>, next: *mut Header) {
    unsafe { block.as_ptr().cast::<*mut Header>().write(next) };
}

fn push_raw(block: NonNull<Header>) {
    let mut head = POOL.head.lock();
    unsafe { write_link(block, *head) };
    *head = block.as_ptr();
}

/// Sets the pool counter's bias at startup. Must run before any
/// [`release`] call observes the counter.
pub(crate) fn bias(worker_count: usize) {
    POOL.count.store(-(worker_count as isize), Ordering::Relaxed);
}

/// Pushes a freshly system-mapped block directly onto the list, bypassing
/// the counter. Used only for the startup pre-seed, which the bias above
/// already accounts for.
pub(crate) fn seed(block: NonNull<Header>) {
    push_raw(block);
}

/// Pops the head of the list, reinitializing its header, or `None` if the
/// pool is empty.
pub(crate) fn pop() -> Option<NonNull<Header>> {
    let mut head = POOL.head.lock();
    let current = NonNull::new(*head)?;
    let next = unsafe { read_link(current) };
    *head = next;
    drop(head);
    POOL.count.fetch_sub(1, Ordering::AcqRel);
    Some(block::init(current.cast()))
}

/// Returns a ready-to-use block: popped from the pool if one is
/// available, otherwise freshly mapped from the system.
pub(crate) fn new_block() -> Option<NonNull<Header>> {
    if let Some(blk) = pop() {
        return Some(blk);
    }
    log::trace!("rallocator: recycled pool empty, mapping a fresh block");
    let mem = pager::reserve(config::BLOCK_SIZE, false)?;
    Some(block::init(mem))
}

/// Called by [`block::release`] once a block's reference count has
/// dropped to zero: either the block rejoins the pool (zero-filled) or,
/// if the pool is already at capacity, is returned to the system.
pub(crate) fn release(block: NonNull<Header>) {
    let cap = (config::MAX_BLOCKS_PER_WORKER as isize)
        * (lifecycle::state().worker_count as isize);
    let occupancy = POOL.count.fetch_add(1, Ordering::AcqRel) + 1;
    if occupancy > cap {
        POOL.count.fetch_sub(1, Ordering::AcqRel);
        log::debug!("rallocator: recycled pool at cap ({cap}), returning block to the system");
        pager::release(block.cast(), config::BLOCK_SIZE);
        return;
    }
    unsafe { std::ptr::write_bytes(block.as_ptr().cast::<u8>(), 0u8, config::BLOCK_SIZE) };
    push_raw(block);
}

/// Whether the recycled pool currently holds at least one block. Exposed
/// only for tests that need to observe a release landing in the pool,
/// since the counter's startup bias makes [`POOL`]'s `count` alone an
/// unreliable "is it empty" signal from outside this module.
#[cfg(test)]
pub(crate) fn occupied() -> bool {
    !POOL.head.lock().is_null()
}

/// Drains every block on the list back to the system. Called once, at
/// shutdown.
pub(crate) fn drain() {
    loop {
        let mut head = POOL.head.lock();
        let Some(current) = NonNull::new(*head) else {
            break;
        };
        let next = unsafe { read_link(current) };
        *head = next;
        drop(head);
        pager::release(current.cast(), config::BLOCK_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_returns_same_block_reinitialized() {
        let _g = crate::harness::guard();
        let mem = pager::reserve(config::BLOCK_SIZE, false).expect("reserve");
        let blk = block::init(mem);
        seed(blk);
        let popped = pop().expect("pop should find the seeded block");
        assert_eq!(popped.as_ptr(), blk.as_ptr());
        pager::release(popped.cast(), config::BLOCK_SIZE);
    }

    #[test]
    fn pop_on_empty_pool_returns_none() {
        let _g = crate::harness::guard();
        // Pop until genuinely empty, then assert no phantom entries.
        while pop().is_some() {}
        assert!(pop().is_none());
    }
}
