//! Dispatch-site profiling hooks, gated by the `profile-any` feature group
//! so a default build pays nothing for them (AMBIENT STACK addition,
//! grounded on the teacher's `cfg`-gated `profiler` module in `lib.rs`).
//!
//! When no `profile-*` feature is enabled, [`Profiler`] below is the
//! placeholder: its methods are present (so call sites never need a
//! `#[cfg]`) but compile away to nothing.

#[cfg(feature = "profile-any")]
use alloc::collections::BTreeMap;

/// Where in the stream a sample was taken: the record index (`ip`) plus,
/// for coverage sampling, the ring positions active at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstructionLocation {
    /// Record index at the time of sampling.
    pub ip: usize,
}

impl InstructionLocation {
    /// Builds a location for record `ip`.
    pub const fn new(ip: usize) -> Self {
        Self { ip }
    }
}

#[cfg(feature = "profile-any")]
#[derive(Debug, Default, Clone)]
struct CoverageProfilingData {
    visited: BTreeMap<InstructionLocation, u64>,
}

#[cfg(feature = "profile-any")]
#[derive(Debug, Default, Clone)]
struct GasProfilingData {
    gas_per_location: BTreeMap<InstructionLocation, u64>,
}

/// Per-context profiler. Compiled to a zero-field placeholder unless at
/// least one `profile-*` feature is on (`profile-any` is the umbrella the
/// others imply; see `Cargo.toml`).
#[derive(Debug, Default, Clone)]
pub struct Profiler {
    #[cfg(feature = "profile-coverage")]
    coverage: CoverageProfilingData,
    #[cfg(feature = "profile-gas")]
    gas: GasProfilingData,
}

impl Profiler {
    /// Records that dispatch visited `location`.
    #[cfg(feature = "profile-coverage")]
    pub fn set_coverage(&mut self, location: InstructionLocation) {
        *self.coverage.visited.entry(location).or_insert(0) += 1;
    }

    /// Placeholder when coverage profiling is compiled out: does nothing.
    #[cfg(not(feature = "profile-coverage"))]
    pub fn set_coverage(&mut self, _location: InstructionLocation) {}

    /// Attributes `gas_use` to `location`.
    #[cfg(feature = "profile-gas")]
    pub fn add_gas(&mut self, location: InstructionLocation, gas_use: u64) {
        *self.gas.gas_per_location.entry(location).or_insert(0) += gas_use;
    }

    /// Placeholder when gas profiling is compiled out: does nothing.
    #[cfg(not(feature = "profile-gas"))]
    pub fn add_gas(&mut self, _location: InstructionLocation, _gas_use: u64) {}
}
