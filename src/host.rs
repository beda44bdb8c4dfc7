//! Host-call bridge (SPEC_FULL.md §6 "Host-call bridge").
//!
//! The distilled spec describes the bridge as a C-shaped contract —
//! `call(module_id, function_index, stack_pointer_cell: *mut *mut byte)` —
//! reading parameters downward from a stack pointer and writing results
//! back at the same base. This crate's `#![deny(unsafe_code)]` posture
//! (per SPEC_FULL.md's AMBIENT STACK) expresses the same contract as a
//! safe trait over a `&mut [u8]` scratch buffer: parameters occupy it in
//! declaration order before the call, results occupy it in declaration
//! order after. Every call fusion in [`crate::opfuncs::call`] builds its
//! scratch buffer this way rather than threading a raw pointer.

use crate::error::ExecResult;
use alloc::boxed::Box;

/// The value-type tags a callee's parameters/return can carry, reused from
/// the five value-type families of SPEC_FULL.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum ValType {
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `f32`.
    F32,
    /// `f64`.
    F64,
    /// `v128`, opaque to this core.
    V128,
}

impl ValType {
    /// Byte width of one value of this type in the scratch buffer.
    pub const fn width(self) -> usize {
        match self {
            Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 => 8,
            Self::V128 => 16,
        }
    }
}

/// A synchronous host-function bridge, invoked by the call fusions
/// (§4.C.11). Implementations live entirely outside this core (module
/// instantiation, host bridging are explicitly out of scope per §1); this
/// trait is the narrow seam the fused call opfuncs need to make progress.
pub trait HostBridge {
    /// Invokes `function_index` in `module_id`. On entry, `scratch` holds
    /// the callee's parameters, little-endian, in declaration order,
    /// starting at offset 0. On a successful return, `scratch` holds the
    /// callee's results in the same layout (offset 0 is result 0).
    ///
    /// A trapping callee propagates synchronously: the bridge returns
    /// `Err` and the caller (a call fusion) treats it exactly like any
    /// other opfunc trap — no partial marshalling is observable (§6, §7).
    fn call(&mut self, module_id: usize, function_index: usize, scratch: &mut [u8]) -> ExecResult<()>;
}

/// The default bridge installed on a fresh [`crate::stream::Context`]:
/// traps on any call, since no host is attached yet. A translator-facing
/// embedder replaces this via [`crate::stream::Context::set_host`] before
/// running a function body that actually performs calls.
#[derive(Debug, Default)]
pub struct UnboundHostBridge;

impl HostBridge for UnboundHostBridge {
    fn call(&mut self, _module_id: usize, _function_index: usize, _scratch: &mut [u8]) -> ExecResult<()> {
        Err(crate::error::TrapReason::Unreachable.into())
    }
}

/// Boxed trait object alias, matching how [`crate::stream::Context`] stores
/// its bridge (a `dyn` bridge, since the concrete host type is unknown to
/// this core by design).
pub type BoxedHostBridge = Box<dyn HostBridge>;
