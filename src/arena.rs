//! Per-worker-slot cursors and the arena acquisition protocol.

use crate::block::Header;
use std::cell::Cell;
use std::ptr::NonNull;

pub(crate) struct Arena {
    active: spin::Mutex<Option<NonNull<Header>>>,
}

// `Arena` is only ever reached through a `&'static` shared reference into
// memory owned by `lifecycle::State`; all mutation of `active` goes
// through its `Mutex`.
unsafe impl Sync for Arena {}

impl Arena {
    pub(crate) fn new() -> Self {
        Arena { active: spin::Mutex::new(None) }
    }

    /// Drops the arena's active block, if any, releasing one reference
    /// on it. Used only during shutdown.
    pub(crate) fn release_active(&self) -> Option<NonNull<Header>> {
        self.active.lock().take()
    }
}

thread_local! {
    static LAST_ARENA: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Locks an arena for the duration of one small allocation, preferring
/// the one this worker used last. Falls back to probing every arena in
/// order, yielding to the scheduler between full sweeps, until one is
/// free. Never fails.
fn lock<'a>(preferred: usize, arenas: &'a [Arena]) -> (usize, spin::MutexGuard<'a, Option<NonNull<Header>>>) {
    if let Some(guard) = arenas[preferred].active.try_lock() {
        return (preferred, guard);
    }
    loop {
        for (index, arena) in arenas.iter().enumerate() {
            if let Some(guard) = arena.active.try_lock() {
                return (index, guard);
            }
        }
        std::thread::yield_now();
    }
}

/// Locks this worker's preferred arena (its last-used one, or the first
/// arena if it hasn't allocated yet) and remembers which one it got for
/// next time.
pub(crate) fn enter<'a>(arenas: &'a [Arena]) -> spin::MutexGuard<'a, Option<NonNull<Header>>> {
    let preferred = LAST_ARENA.with(|cell| cell.get()).unwrap_or(0);
    let (index, guard) = lock(preferred, arenas);
    LAST_ARENA.with(|cell| cell.set(Some(index)));
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_lock_on_uncontended_arena_succeeds() {
        let arena = Arena::new();
        let guard = arena.active.try_lock();
        assert!(guard.is_some());
    }

    #[test]
    fn lock_skips_a_held_preferred_arena() {
        let arenas = [Arena::new(), Arena::new()];
        let _held = arenas[0].active.lock();
        let (index, _guard) = lock(0, &arenas);
        assert_eq!(index, 1);
    }
}
