//! # rallocator - A Block-Slab Memory Allocator
//!
//! This crate provides a general-purpose, concurrent memory allocator
//! meant as a drop-in replacement for the platform default. It trades
//! the simplicity of a bump allocator for something that actually
//! survives free/realloc-heavy, multi-threaded workloads.
//!
//! ## Overview
//!
//! Memory is reserved from the system in fixed-size, block-aligned
//! mappings. Small requests are cut out of a block's tail, 16 bytes at a
//! time; large requests get their own direct mapping:
//!
//! ```text
//!   One block (64 KiB, block-aligned):
//!
//!   ┌────────┬──────┬──────┬──────┬─────────────────────────────┐
//!   │ header │ s0   │ s1   │ s2   │ ...                         │
//!   └────────┴──────┴──────┴──────┴─────────────────────────────┘
//!    16 bytes  16B    16B    16B    cut forward as `pos` advances
//!
//!   A large allocation instead gets its own mapping:
//!
//!   ┌────────┬────────────────────────────────────────────────┐
//!   │ length │                 user data                      │
//!   └────────┴────────────────────────────────────────────────┘
//!    16 bytes          pointer handed back to the caller
//! ```
//!
//! Both shapes share one trick: a returned pointer's low bits, masked by
//! the block size, tell `free`/`resize` which path it came from without
//! any side table. See [`surface`] for the exact rule.
//!
//! ## Crate structure
//!
//! ```text
//!   rallocator
//!   ├── config          - tunable constants, compile-time checked
//!   ├── error           - internal pager error type
//!   ├── pager           - mmap/munmap/mremap, block-aligned reservations
//!   ├── block           - block header, slice cutting
//!   ├── pool            - recycled-block free list
//!   ├── arena           - per-worker active-block cursors
//!   ├── lifecycle       - process-wide init/shutdown
//!   ├── small           - small-allocation path
//!   ├── large           - large-allocation path
//!   ├── surface         - public allocate/free/resize, path classification
//!   ├── global          - `GlobalAlloc` wrapper + C ABI shim (feature-gated)
//!   └── system_fallback - libc-backed stand-in (feature `force_system_alloc`)
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rallocator::{allocate, free};
//!
//! let ptr = allocate(128).expect("system out of memory");
//! unsafe { ptr.as_ptr().write(42) };
//! free(Some(ptr));
//! ```
//!
//! Install it as the process-wide allocator (the default `global`
//! feature does this automatically once you add the attribute):
//!
//! ```rust,ignore
//! #[global_allocator]
//! static ALLOCATOR: rallocator::global::Allocator = rallocator::global::Allocator;
//! ```
//!
//! ## Concurrency model
//!
//! Arenas are per-worker (one per online CPU, detected at startup), each
//! holding one active block behind a spinlock. A thread remembers which
//! arena it used last and prefers it next time; under contention it
//! sweeps the rest before yielding. Freed blocks rejoin a capped,
//! lock-free-ish recycled pool rather than going straight back to the
//! system, so steady-state workloads rarely call into the kernel at all.
//!
//! ## Limitations
//!
//! - **POSIX-only**: built on `libc::mmap`/`munmap`/`mremap`/`sysconf`.
//! - **No per-allocation size tracking**: `free`/`resize` classify by
//!   pointer, not by a stored size; callers that know an old size should
//!   use [`resize_known`] rather than [`resize`].
//! - **Feature `force_system_alloc`** compiles the block-slab engine out
//!   entirely; every operation becomes a thin `libc::malloc` wrapper.

pub mod config;
#[cfg(not(feature = "force_system_alloc"))]
mod error;
#[cfg(not(feature = "force_system_alloc"))]
mod pager;
#[cfg(not(feature = "force_system_alloc"))]
mod block;
#[cfg(not(feature = "force_system_alloc"))]
mod pool;
#[cfg(not(feature = "force_system_alloc"))]
mod arena;
#[cfg(not(feature = "force_system_alloc"))]
mod lifecycle;
#[cfg(not(feature = "force_system_alloc"))]
mod small;
#[cfg(not(feature = "force_system_alloc"))]
mod large;
#[cfg(not(feature = "force_system_alloc"))]
mod surface;
#[cfg(feature = "force_system_alloc")]
mod system_fallback;
#[cfg(feature = "global")]
pub mod global;

#[cfg(not(feature = "force_system_alloc"))]
pub use surface::{allocate, free, resize, resize_known, zero_allocate};
#[cfg(feature = "force_system_alloc")]
pub use system_fallback::{allocate, free, resize, resize_known, zero_allocate};

/// Releases every arena's active block and drains the recycled pool back
/// to the system. A no-op under `force_system_alloc`, since that
/// configuration never holds engine-owned memory. Calling any public
/// operation afterward is undefined behavior.
pub fn shutdown() {
    #[cfg(not(feature = "force_system_alloc"))]
    lifecycle::shutdown();
}
