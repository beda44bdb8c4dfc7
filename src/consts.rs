//! Crate-wide constants.

/// Number of ring-cache slots allocated per value-type family's pool.
///
/// The pool is the maximum span a `CompileOption` may request for
/// `stack_top_begin_pos_*`/`stack_top_end_pos_*`; it bounds the const
/// generics used by [`crate::ring::Reg`]/[`crate::ring::RegMut`].
pub const RING_POOL_SIZE: usize = 8;

/// Maximum linear memory size in bytes (4 GiB, the Wasm32 address space).
pub const MAX_MEMORY_BYTES: u64 = 1 << 32;

/// Wasm page size in bytes.
pub const WASM_PAGE_SIZE: u64 = 64 * 1024;

/// Canonical NaN bit pattern for `f32`.
pub const CANONICAL_NAN_F32: u32 = 0x7fc0_0000;

/// Canonical NaN bit pattern for `f64`.
pub const CANONICAL_NAN_F64: u64 = 0x7ff8_0000_0000_0000;

static_assertions::const_assert!(RING_POOL_SIZE > 0);
static_assertions::const_assert!(WASM_PAGE_SIZE.is_power_of_two());
