//! Compile-time configuration consumed by both the translator and the core.

use crate::consts::RING_POOL_SIZE;

/// Half-open ring range `[begin, end)` for one value-type family.
///
/// `begin == end` means the type bypasses the cache entirely: all of that
/// type's operands live in the byte arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingRange {
    begin: usize,
    end: usize,
}

impl RingRange {
    /// A disabled range (`begin == end == 0`).
    pub const DISABLED: Self = Self { begin: 0, end: 0 };

    /// Builds a range, rejecting spans that do not fit the ring pool.
    pub const fn new(begin: usize, end: usize) -> Option<Self> {
        if begin > end || end > RING_POOL_SIZE {
            None
        } else {
            Some(Self { begin, end })
        }
    }

    /// Whether this type's cache is disabled.
    pub const fn is_disabled(self) -> bool {
        self.begin == self.end
    }

    /// Number of ring slots in the range.
    pub const fn len(self) -> usize {
        self.end - self.begin
    }

    /// Lower bound (inclusive).
    pub const fn begin(self) -> usize {
        self.begin
    }

    /// Upper bound (exclusive).
    pub const fn end(self) -> usize {
        self.end
    }

    /// Whether `pos` is a legal ring position for this range.
    pub const fn contains(self, pos: usize) -> bool {
        pos >= self.begin && pos < self.end
    }

    /// Advances a position one step forward (pop direction), wrapping at `end`
    /// back to `begin`.
    pub const fn ring_next(self, pos: usize) -> usize {
        if pos + 1 >= self.end {
            self.begin
        } else {
            pos + 1
        }
    }

    /// Advances a position one step backward (push direction), wrapping at
    /// `begin` around to `end - 1`.
    pub const fn ring_prev(self, pos: usize) -> usize {
        if pos == self.begin {
            self.end - 1
        } else {
            pos - 1
        }
    }
}

/// Error returned by [`CompileOption::try_new`] when the requested ring
/// layout violates the cross-ring merge rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CompileOptionError {
    /// `i32`/`i64` ranges were both enabled but did not share `begin`/`end`.
    #[display(fmt = "i32 and i64 ring ranges must match when both are enabled")]
    IntegerRingsMustMatch,
    /// `f32`/`f64`/`v128` ranges were both enabled but did not share
    /// `begin`/`end`.
    #[display(
        fmt = "f32, f64, and v128 ring ranges must match when more than one is enabled"
    )]
    FloatRingsMustMatch,
    /// The integer and floating-point ring pools partially overlapped
    /// instead of being fully merged or fully disjoint.
    #[display(fmt = "integer and float ring ranges must be fully merged or fully disjoint")]
    PartialRingOverlap,
    /// A requested range did not fit within the compile-time ring pool.
    #[display(fmt = "ring range does not fit within the compile-time pool")]
    RangeOutOfBounds,
}

/// Which dispatch engine mode a [`CompileOption`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Chained mode: opfuncs tail-jump to the next record.
    Chained,
    /// Stepped mode: a central loop calls each opfunc by reference.
    Stepped,
}

impl DispatchMode {
    /// Stepped mode disables the ring cache entirely (§4.A).
    pub const fn allows_ring_cache(self) -> bool {
        matches!(self, Self::Chained)
    }
}

/// The full compile-time configuration threaded through selection and
/// dispatch: dispatch mode plus one [`RingRange`] per value-type family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOption {
    mode: DispatchMode,
    i32_range: RingRange,
    i64_range: RingRange,
    f32_range: RingRange,
    f64_range: RingRange,
    v128_range: RingRange,
}

impl CompileOption {
    /// Validates and builds a `CompileOption`.
    ///
    /// Stepped mode forces every range to [`RingRange::DISABLED`]
    /// regardless of what was requested, since the stepped dispatcher
    /// fully materializes state between records.
    pub fn try_new(
        mode: DispatchMode,
        i32_range: RingRange,
        i64_range: RingRange,
        f32_range: RingRange,
        f64_range: RingRange,
        v128_range: RingRange,
    ) -> Result<Self, CompileOptionError> {
        let (i32_range, i64_range, f32_range, f64_range, v128_range) = if mode.allows_ring_cache()
        {
            (i32_range, i64_range, f32_range, f64_range, v128_range)
        } else {
            (
                RingRange::DISABLED,
                RingRange::DISABLED,
                RingRange::DISABLED,
                RingRange::DISABLED,
                RingRange::DISABLED,
            )
        };

        if i32_range.end() > RING_POOL_SIZE
            || i64_range.end() > RING_POOL_SIZE
            || f32_range.end() > RING_POOL_SIZE
            || f64_range.end() > RING_POOL_SIZE
            || v128_range.end() > RING_POOL_SIZE
        {
            return Err(CompileOptionError::RangeOutOfBounds);
        }

        if !i32_range.is_disabled() && !i64_range.is_disabled() && i32_range != i64_range {
            return Err(CompileOptionError::IntegerRingsMustMatch);
        }

        let fp_enabled = [f32_range, f64_range, v128_range]
            .into_iter()
            .filter(|r| !r.is_disabled())
            .collect::<alloc::vec::Vec<_>>();
        if let Some(first) = fp_enabled.first() {
            if fp_enabled.iter().any(|r| r != first) {
                return Err(CompileOptionError::FloatRingsMustMatch);
            }
        }

        let int_enabled = !i32_range.is_disabled() || !i64_range.is_disabled();
        let fp_any_enabled = !fp_enabled.is_empty();
        if int_enabled && fp_any_enabled {
            let int_range = if !i32_range.is_disabled() {
                i32_range
            } else {
                i64_range
            };
            let fp_range = fp_enabled[0];
            let fully_merged = int_range == fp_range;
            let fully_disjoint = int_range.end() <= fp_range.begin() || fp_range.end() <= int_range.begin();
            if !fully_merged && !fully_disjoint {
                return Err(CompileOptionError::PartialRingOverlap);
            }
        }

        Ok(Self {
            mode,
            i32_range,
            i64_range,
            f32_range,
            f64_range,
            v128_range,
        })
    }

    /// Dispatch mode.
    pub const fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Ring range for `i32`.
    pub const fn i32_range(&self) -> RingRange {
        self.i32_range
    }

    /// Ring range for `i64`.
    pub const fn i64_range(&self) -> RingRange {
        self.i64_range
    }

    /// Ring range for `f32`.
    pub const fn f32_range(&self) -> RingRange {
        self.f32_range
    }

    /// Ring range for `f64`.
    pub const fn f64_range(&self) -> RingRange {
        self.f64_range
    }

    /// Ring range for `v128`.
    pub const fn v128_range(&self) -> RingRange {
        self.v128_range
    }

    /// Whether the f32/f64 ranges are merged, which is the only
    /// configuration under which `call_stacktop_T` may cross f32<->f64
    /// (see SPEC_FULL.md's "Open questions").
    pub const fn float_rings_merged(&self) -> bool {
        !self.f32_range.is_disabled()
            && !self.f64_range.is_disabled()
            && self.f32_range.begin() == self.f64_range.begin()
            && self.f32_range.end() == self.f64_range.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_range_bypasses_cache() {
        assert!(RingRange::DISABLED.is_disabled());
        assert_eq!(RingRange::DISABLED.len(), 0);
    }

    #[test]
    fn ring_wraps_in_both_directions() {
        let r = RingRange::new(2, 5).unwrap();
        assert_eq!(r.ring_next(4), 2);
        assert_eq!(r.ring_next(2), 3);
        assert_eq!(r.ring_prev(2), 4);
        assert_eq!(r.ring_prev(3), 2);
    }

    #[test]
    fn mismatched_integer_ranges_rejected() {
        let i32_range = RingRange::new(0, 4).unwrap();
        let i64_range = RingRange::new(0, 3).unwrap();
        let err = CompileOption::try_new(
            DispatchMode::Chained,
            i32_range,
            i64_range,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap_err();
        assert_eq!(err, CompileOptionError::IntegerRingsMustMatch);
    }

    #[test]
    fn disjoint_int_and_float_rings_allowed() {
        let i32_range = RingRange::new(0, 4).unwrap();
        let f32_range = RingRange::new(4, 8).unwrap();
        let f64_range = RingRange::new(4, 8).unwrap();
        CompileOption::try_new(
            DispatchMode::Chained,
            i32_range,
            i32_range,
            f32_range,
            f64_range,
            RingRange::DISABLED,
        )
        .unwrap();
    }

    #[test]
    fn stepped_mode_forces_rings_disabled() {
        let i32_range = RingRange::new(0, 4).unwrap();
        let opt = CompileOption::try_new(
            DispatchMode::Stepped,
            i32_range,
            i32_range,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap();
        assert!(opt.i32_range().is_disabled());
    }
}
