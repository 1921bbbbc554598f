//! Process-wide setup and teardown.
//!
//! Rust gives us no portable constructor/destructor hook equivalent to
//! the original's `__attribute__((constructor/destructor))`, so
//! initialization happens lazily on first use (guarded by [`spin::Once`])
//! and teardown is the explicit [`shutdown`] entry point. Calling any
//! public operation after `shutdown` is undefined behavior.

use crate::arena::Arena;
use crate::block;
use crate::config;
use crate::large;
use crate::pager;
use crate::pool;
use std::ptr::NonNull;

pub(crate) struct State {
    arenas_ptr: NonNull<Arena>,
    arena_count: usize,
    pub(crate) worker_count: usize,
}

// Reached only through `&'static State`; `arenas_ptr` points at memory
// whose mutable parts (each `Arena`'s active-block slot) are themselves
// lock-protected. Needed for `State` to live inside `spin::Once`, which
// requires `T: Send + Sync` to be `Sync` itself.
unsafe impl Send for State {}
unsafe impl Sync for State {}

impl State {
    pub(crate) fn arenas(&self) -> &'static [Arena] {
        unsafe { std::slice::from_raw_parts(self.arenas_ptr.as_ptr(), self.arena_count) }
    }
}

static STATE: spin::Once<State> = spin::Once::new();

/// Returns the process-wide state, performing one-time initialization on
/// first call.
pub(crate) fn state() -> &'static State {
    STATE.call_once(init)
}

fn detect_worker_count() -> usize {
    let queried = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if queried > 0 {
        queried as usize
    } else {
        8
    }
}

fn init() -> State {
    let worker_count = detect_worker_count();
    pool::bias(worker_count);

    // Allocated via the large-allocation path, like the original's
    // `fio_mem_init` uses `big_alloc` for the same array: it's a single
    // long-lived object that never sits inside a block, so it gets the
    // same 16-byte length header and direct-mmap treatment as any other
    // large allocation rather than its own bespoke reservation.
    let arena_bytes = worker_count * std::mem::size_of::<Arena>();
    let arenas_ptr = match large::allocate_detailed(arena_bytes) {
        Ok(ptr) => ptr.cast::<Arena>(),
        Err(e) => {
            log::error!(
                "rallocator: failed to reserve the arena array ({worker_count} workers, \
                 {arena_bytes} bytes): {e}, cannot continue"
            );
            std::process::exit(libc_errno_or_one());
        }
    };
    for i in 0..worker_count {
        unsafe { arenas_ptr.as_ptr().add(i).write(Arena::new()) };
    }

    let pre_seed = worker_count.min(config::PRE_SEED_BLOCKS_MAX);
    for _ in 0..pre_seed {
        if let Some(mem) = pager::reserve(config::BLOCK_SIZE, false) {
            pool::seed(block::init(mem));
        }
    }

    State { arenas_ptr, arena_count: worker_count, worker_count }
}

fn libc_errno_or_one() -> i32 {
    let err = std::io::Error::last_os_error().raw_os_error().unwrap_or(1);
    if err == 0 { 1 } else { err }
}

/// Releases every arena's active block, drains the recycled pool back to
/// the system, and frees the arena array. Calling any public allocation
/// operation afterward is undefined behavior.
pub(crate) fn shutdown() {
    let Some(state) = STATE.get() else { return };
    for arena in state.arenas() {
        if let Some(blk) = arena.release_active() {
            block::release(blk);
        }
    }
    pool::drain();
    large::free(state.arenas_ptr.cast());
}
