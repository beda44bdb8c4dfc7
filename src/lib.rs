//! A fused-opcode, threaded-dispatch execution core for a WebAssembly
//! bytecode interpreter.
//!
//! This crate is the inner execution loop a translator hands a
//! [`stream::Stream`] to: it owns the ring-cached operand stack, the
//! two-tier error model, the frame/call-activation stack, linear memory,
//! and the const-generic selector machinery that picks a ring-position-
//! specialized opfunc at translation time. It does not parse Wasm modules,
//! validate types, or perform instruction selection — those live upstream,
//! in the translator this core is embedded into.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]
#![deny(
    clippy::arithmetic_side_effects,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::string_slice
)]

#[doc(hidden)] // needed by the ring_table! macro's callers outside this crate
pub extern crate alloc;

extern crate core;

#[cfg(test)]
use criterion as _;
#[cfg(test)]
use quickcheck_macros::quickcheck as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;

pub mod compile_option;
pub mod consts;
pub mod error;
pub mod frame;
pub mod host;
pub mod memory;
pub mod opfuncs;
pub mod ring;
pub mod selector;
pub mod stream;
pub mod value;

#[cfg(feature = "profile-any")]
pub mod profiler;

#[cfg(not(feature = "profile-any"))]
/// Placeholder profiler, compiled in when no `profile-*` feature is set.
pub mod profiler {
    use crate::profiler_stub::InstructionLocation;

    /// Placeholder profiler whose methods do nothing.
    #[derive(Default, Debug, Clone)]
    pub struct Profiler;

    impl Profiler {
        /// Set the current coverage location. No-op without `profile-coverage`.
        pub fn set_coverage(&mut self, _location: InstructionLocation) {}

        /// Add gas to the current location. No-op without `profile-gas`.
        pub fn add_gas(&mut self, _location: InstructionLocation, _gas_use: u64) {}
    }
}

#[cfg(not(feature = "profile-any"))]
mod profiler_stub {
    /// Minimal location type kept alive for the placeholder `Profiler`'s
    /// signature when the real `profiler` module (with its richer
    /// `InstructionLocation`) is compiled out.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct InstructionLocation {
        /// Record index at the time of sampling.
        pub ip: usize,
    }
}

/// Re-exports of the types a translator embedding this core needs most
/// often, mirroring the teacher's `prelude` convention.
pub mod prelude {
    pub use crate::compile_option::{CompileOption, CompileOptionError, DispatchMode, RingRange};
    pub use crate::consts::RING_POOL_SIZE;
    pub use crate::error::{ExecResult, SimpleResult, Trap, TrapReason};
    pub use crate::frame::{Frame, RingPositions, Word};
    pub use crate::host::{BoxedHostBridge, HostBridge, UnboundHostBridge, ValType};
    pub use crate::memory::{BoundsCheckStrategy, MemoryInstance, NarrowWidth};
    pub use crate::profiler::Profiler;
    pub use crate::stream::{Context, Control, HaltReason, Immediates, OpFn, Record, Stream, StreamBuilder};
    pub use crate::stream::run;
}
