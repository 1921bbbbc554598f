//! Build-time constants that fix the allocator's pointer-tagging invariants.
//!
//! These are deliberately `const`, not runtime-configurable fields: the
//! classifier that tells a large allocation from a small one (see
//! [`crate::surface`]) is derived from the relationship between
//! [`BLOCK_SIZE`], [`SLICE_UNIT`] and [`HEADER_UNITS`] at compile time.
//! Changing one without checking the others breaks that invariant.

/// The quantum of small-allocation size and alignment, in bytes.
pub const SLICE_UNIT: usize = 16;

/// Size, in bytes, of one block. Always a power of two and a multiple of
/// the system page size; blocks are mapped aligned to this value so that
/// any interior pointer recovers its owning block by masking the low
/// `log2(BLOCK_SIZE)` bits.
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Mask recovering a block's base address from any interior pointer, and
/// testing a mapping's alignment.
pub const BLOCK_MASK: usize = BLOCK_SIZE - 1;

/// Request size at or above which allocation is satisfied directly from
/// the system pager instead of being sliced out of a block.
pub const SMALL_ALLOC_THRESHOLD: usize = BLOCK_SIZE / 2;

/// Number of slice units reserved for the block header. The header struct
/// itself ([`crate::block::Header`]) is smaller than one slice unit, but
/// the allocator budgets a whole unit for it so that `pos` never starts
/// at slice index 1 (byte offset 16), the offset the large-allocation
/// header claims. See [`crate::block`] for why this matters.
pub const HEADER_UNITS: u16 = 1;

/// Upper bound on recycled blocks kept per worker before a freed block is
/// handed back to the operating system instead of being pooled.
pub const MAX_BLOCKS_PER_WORKER: usize = 32;

/// Number of blocks to pre-map into the recycled pool at startup, capped
/// regardless of worker count to bound init-time syscall traffic.
pub const PRE_SEED_BLOCKS_MAX: usize = 32;

/// Hint-address spacing added between large (system-pager) allocations so
/// they don't crowd the region used for block-sized mappings.
pub const LARGE_ALLOC_HINT_GAP: usize = 1 << 40; // 1 TiB

const _: () = assert!(SLICE_UNIT.is_power_of_two());
const _: () = assert!(BLOCK_SIZE.is_power_of_two());
const _: () = assert!(SMALL_ALLOC_THRESHOLD < BLOCK_SIZE);
const _: () = assert!(SMALL_ALLOC_THRESHOLD % SLICE_UNIT == 0);
