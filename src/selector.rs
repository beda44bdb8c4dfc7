//! Translation-time opfunc selector (SPEC_FULL.md §4.F).
//!
//! A selector is a pure function from `(CompileOption, current ring
//! positions[, memory instance])` to a concrete [`crate::stream::OpFn`]
//! pointer. Selection happens once, at translation time; a failed match
//! (a `curr_T` the translator had no business requesting) is an internal
//! invariant violation, never a guest-visible trap (§4.F).
//!
//! Ring-position specialization is realized with const generics: each
//! family function below is generic over `const POS: usize`, so
//! `family_fn::<3>` and `family_fn::<4>` are genuinely distinct `fn` items
//! with distinct addresses — the ring position lives in the opfunc's
//! *identity*, exactly as required by §4.B/§9, not in a runtime field read
//! by a single shared function body. [`ring_table!`] builds the lookup
//! table of all `RING_POOL_SIZE` monomorphizations once.

use crate::compile_option::CompileOption;
use crate::consts::RING_POOL_SIZE;
use crate::memory::{BoundsCheckStrategy, MemoryInstance};
use crate::stream::OpFn;

/// Builds a `[OpFn; RING_POOL_SIZE]` table out of the `RING_POOL_SIZE`
/// monomorphizations of a `const POS: usize`-generic opfunc family
/// function, so a runtime position can be turned into the matching
/// compile-time-specialized function pointer by plain indexing.
#[macro_export]
macro_rules! ring_table {
    ($f:ident) => {
        [
            $f::<0>,
            $f::<1>,
            $f::<2>,
            $f::<3>,
            $f::<4>,
            $f::<5>,
            $f::<6>,
            $f::<7>,
        ]
    };
}

static_assertions::const_assert_eq!(RING_POOL_SIZE, 8);

/// Looks up the specialization for `pos` in a ring table built by
/// [`ring_table!`]. Aborts (never traps) if `pos` is outside the
/// compile-time pool — the translator is required to supply a valid
/// position (§4.F).
pub fn pick(table: &[OpFn; RING_POOL_SIZE], pos: usize) -> OpFn {
    match table.get(pos) {
        Some(op) => *op,
        None => crate::error::internal_invariant_violation(
            "selector: ring position out of the compile-time pool",
        ),
    }
}

/// Picks between the generic and specialized bounds-check variant of a
/// memory opfunc family, given the memory instance the access targets.
/// A memory is eligible for the specialized path only when its current
/// length makes every access in the record provably in-bounds; since that
/// analysis lives in the (external) translator, this core exposes the
/// decision as an explicit parameter rather than re-deriving it from the
/// `MemoryInstance` alone.
pub fn pick_bounds_checked(
    generic: OpFn,
    specialized: OpFn,
    strategy: BoundsCheckStrategy,
) -> OpFn {
    match strategy {
        BoundsCheckStrategy::Generic => generic,
        BoundsCheckStrategy::Specialized => specialized,
    }
}

/// Convenience used by the memory-family selectors: the strategy a
/// translator would choose for a memory whose minimum guaranteed size
/// already covers every static offset this function body uses.
pub fn strategy_for_known_bound(memory: &MemoryInstance, max_static_offset: u32, access_width: u32) -> BoundsCheckStrategy {
    if memory.len() >= u64::from(max_static_offset) + u64::from(access_width) {
        BoundsCheckStrategy::Specialized
    } else {
        BoundsCheckStrategy::Generic
    }
}

/// Selects the cross-width `call_stacktop_f32_to_f64` fast path (§4.C.11,
/// open question resolved in DESIGN.md): legal only when a callee returning
/// `f64` is called from a site expecting `f32`'s ring slot, which requires
/// the f32/f64 rings to be the same ring (§4.B's float merge rule). A
/// translator that reaches this selector without that precondition has a
/// bug in its compile-time validation, so this aborts rather than trapping.
pub fn select_call_stacktop_f32_to_f64(option: CompileOption) -> OpFn {
    if !option.float_rings_merged() {
        crate::error::internal_invariant_violation(
            "call_stacktop_f32_to_f64 selected without merged float rings",
        );
    }
    crate::opfuncs::call::call_stacktop_f32_to_f64
}

/// `f64`-producer-into-`f32`-consumer counterpart of
/// [`select_call_stacktop_f32_to_f64`].
pub fn select_call_stacktop_f64_to_f32(option: CompileOption) -> OpFn {
    if !option.float_rings_merged() {
        crate::error::internal_invariant_violation(
            "call_stacktop_f64_to_f32 selected without merged float rings",
        );
    }
    crate::opfuncs::call::call_stacktop_f64_to_f32
}
