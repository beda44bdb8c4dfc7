//! Trap and internal-error taxonomy.
//!
//! Traps are guest-visible and fatal to the current activation; internal
//! invariant violations (a malformed stream, an out-of-range ring position)
//! are bugs in the translator and are never surfaced to the guest.

/// A guest-visible, fatal condition raised by an opfunc.
///
/// `TrapReason` is deliberately `Copy` and carries no heap payload: it is
/// produced on every fused-op hot path and must be cheap to construct. The
/// richer [`Trap`] value, with its structured payload, is built exactly
/// once at the point execution actually stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TrapReason {
    /// A memory access's effective offset plus width exceeded the memory's
    /// current length, or the 33-bit effective-offset overflow bit was set.
    #[display(fmt = "memory access out of bounds")]
    MemoryOutOfBounds,
    /// Integer division or remainder by zero.
    #[display(fmt = "integer divide by zero")]
    IntegerDivideByZero,
    /// Signed division overflow (`INT_MIN / -1`).
    #[display(fmt = "integer overflow")]
    IntegerOverflow,
    /// `unreachable` was executed.
    #[display(fmt = "unreachable executed")]
    Unreachable,
    /// An indirect call's callee signature did not match the call site.
    #[display(fmt = "indirect call signature mismatch")]
    IndirectCallTypeMismatch,
    /// The operand stack grew past its configured bound.
    #[display(fmt = "stack overflow")]
    StackOverflow,
}

impl TrapReason {
    /// Every `TrapReason` is, by construction, recoverable only in the sense
    /// that it halts the *current activation* and nothing more; there is no
    /// partial-recovery mode in this core.
    pub const fn must_halt_activation(self) -> bool {
        true
    }
}

/// The structured payload surfaced to the caller of the interpreter when a
/// memory access traps (§6 "Trap payload").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryTrapPayload {
    /// Index of the memory instance the access targeted.
    pub memory_index: u32,
    /// Static offset immediate encoded in the access.
    pub declared_offset: u32,
    /// `address + declared_offset` evaluated in the 33-bit domain.
    pub effective_offset: u64,
    /// Memory length at the moment of the trap.
    pub memory_length: u64,
    /// Width in bytes of the attempted access.
    pub access_width: u32,
}

/// A fatal, guest-visible error together with the state needed to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Trap {
    /// Out-of-bounds memory access.
    #[display(fmt = "trap: {_0:?}")]
    Memory(MemoryTrapPayload),
    /// Any non-memory trap reason.
    #[display(fmt = "trap: {_0}")]
    Reason(TrapReason),
}

impl From<TrapReason> for Trap {
    fn from(reason: TrapReason) -> Self {
        Self::Reason(reason)
    }
}

impl From<MemoryTrapPayload> for Trap {
    fn from(payload: MemoryTrapPayload) -> Self {
        Self::Memory(payload)
    }
}

/// Result of an opfunc-internal operation that may trap.
pub type SimpleResult<T> = Result<T, TrapReason>;

/// Result of dispatch-level execution that may trap.
pub type ExecResult<T> = Result<T, Trap>;

/// Aborts the process: the condition checked can only be false if the
/// translator emitted an invalid stream. This is never guest-triggerable
/// and is therefore not a [`Trap`].
#[cold]
#[track_caller]
pub fn internal_invariant_violation(what: &'static str) -> ! {
    panic!("wasm-fused-core: internal invariant violated: {what}")
}
