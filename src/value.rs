//! Bit-exact Wasm numeric kernels: wrapping integer arithmetic, masked
//! shifts, canonical-NaN floating point, and typed comparisons.
//!
//! Trapping integer ops (`div`, `rem`) are intentionally *not* fused into
//! any opfunc family (SPEC_FULL.md §4.D) and live here only as the plain,
//! non-fused building blocks a translator would still need.

use crate::consts::{CANONICAL_NAN_F32, CANONICAL_NAN_F64};
use crate::error::{SimpleResult, TrapReason};

/// Wraps a `f32` result through the canonical NaN if it is NaN, matching
/// the spec's requirement that every produced NaN carry one well-defined
/// bit pattern rather than whatever the host FPU happened to produce.
pub fn canonicalize_f32(value: f32) -> f32 {
    if value.is_nan() {
        f32::from_bits(CANONICAL_NAN_F32)
    } else {
        value
    }
}

/// `f64` counterpart of [`canonicalize_f32`].
pub fn canonicalize_f64(value: f64) -> f64 {
    if value.is_nan() {
        f64::from_bits(CANONICAL_NAN_F64)
    } else {
        value
    }
}

/// Integer kernels shared by i32/i64 fused families, expressed once per
/// width via the macro below (teacher's `alu.rs` generalizes the same way
/// over register-width ALU ops).
macro_rules! int_kernels {
    ($ty:ty, $unsigned:ty, $mod_name:ident) => {
        #[doc = concat!("Wrapping integer kernels for `", stringify!($ty), "`.")]
        pub mod $mod_name {
            use super::*;

            type Unsigned = $unsigned;

            /// Wrapping add.
            pub const fn add(a: $ty, b: $ty) -> $ty {
                a.wrapping_add(b)
            }

            /// Wrapping sub.
            pub const fn sub(a: $ty, b: $ty) -> $ty {
                a.wrapping_sub(b)
            }

            /// Wrapping mul.
            pub const fn mul(a: $ty, b: $ty) -> $ty {
                a.wrapping_mul(b)
            }

            /// Bitwise and.
            pub const fn and(a: $ty, b: $ty) -> $ty {
                a & b
            }

            /// Bitwise or.
            pub const fn or(a: $ty, b: $ty) -> $ty {
                a | b
            }

            /// Bitwise xor.
            pub const fn xor(a: $ty, b: $ty) -> $ty {
                a ^ b
            }

            /// Logical shift left, shift amount masked to `width - 1` bits
            /// per Wasm's `ishl` semantics (B3 in SPEC_FULL.md §8).
            pub fn shl(a: $ty, amount: $ty) -> $ty {
                let bits = <$ty>::BITS;
                let mask = (bits - 1) as $ty;
                a.wrapping_shl((amount & mask) as u32)
            }

            /// Unsigned (logical) shift right, masked shift amount.
            pub fn shr_u(a: $ty, amount: $ty) -> $ty {
                let bits = <$ty>::BITS;
                let mask = (bits - 1) as $ty;
                ((a as Unsigned).wrapping_shr((amount & mask) as u32)) as $ty
            }

            /// Signed (arithmetic) shift right, masked shift amount.
            pub fn shr_s(a: $ty, amount: $ty) -> $ty {
                let bits = <$ty>::BITS;
                let mask = (bits - 1) as $ty;
                a.wrapping_shr((amount & mask) as u32)
            }

            /// Signed division; traps on zero divisor or `MIN / -1` overflow.
            pub fn div_s(a: $ty, b: $ty) -> SimpleResult<$ty> {
                if b == 0 {
                    Err(TrapReason::IntegerDivideByZero)
                } else if a == <$ty>::MIN && b == -1 {
                    Err(TrapReason::IntegerOverflow)
                } else {
                    Ok(a.wrapping_div(b))
                }
            }

            /// Unsigned division; traps on zero divisor.
            pub fn div_u(a: $ty, b: $ty) -> SimpleResult<$ty> {
                let (a, b) = (a as Unsigned, b as Unsigned);
                if b == 0 {
                    Err(TrapReason::IntegerDivideByZero)
                } else {
                    Ok((a / b) as $ty)
                }
            }

            /// Signed remainder; traps on zero divisor only (unlike
            /// `div_s`, `MIN % -1` does not overflow — it is always `0`).
            pub fn rem_s(a: $ty, b: $ty) -> SimpleResult<$ty> {
                if b == 0 {
                    Err(TrapReason::IntegerDivideByZero)
                } else if a == <$ty>::MIN && b == -1 {
                    Ok(0)
                } else {
                    Ok(a.wrapping_rem(b))
                }
            }

            /// Unsigned remainder; traps on zero divisor.
            pub fn rem_u(a: $ty, b: $ty) -> SimpleResult<$ty> {
                let (a, b) = (a as Unsigned, b as Unsigned);
                if b == 0 {
                    Err(TrapReason::IntegerDivideByZero)
                } else {
                    Ok((a % b) as $ty)
                }
            }

            /// Typed comparisons, each encoded as a `0`/`1` `i32`.
            pub mod cmp {
                use super::*;

                /// `a == b`.
                pub fn eq(a: $ty, b: $ty) -> i32 {
                    (a == b) as i32
                }

                /// `a != b`.
                pub fn ne(a: $ty, b: $ty) -> i32 {
                    (a != b) as i32
                }

                /// Signed `a < b`.
                pub fn lt_s(a: $ty, b: $ty) -> i32 {
                    (a < b) as i32
                }

                /// Unsigned `a < b`.
                pub fn lt_u(a: $ty, b: $ty) -> i32 {
                        ((a as Unsigned) < (b as Unsigned)) as i32
                }

                /// Signed `a <= b`.
                pub fn le_s(a: $ty, b: $ty) -> i32 {
                    (a <= b) as i32
                }

                /// Unsigned `a <= b`.
                pub fn le_u(a: $ty, b: $ty) -> i32 {
                        ((a as Unsigned) <= (b as Unsigned)) as i32
                }

                /// Signed `a > b`.
                pub fn gt_s(a: $ty, b: $ty) -> i32 {
                    (a > b) as i32
                }

                /// Unsigned `a > b`.
                pub fn gt_u(a: $ty, b: $ty) -> i32 {
                        ((a as Unsigned) > (b as Unsigned)) as i32
                }

                /// Signed `a >= b`.
                pub fn ge_s(a: $ty, b: $ty) -> i32 {
                    (a >= b) as i32
                }

                /// Unsigned `a >= b`.
                pub fn ge_u(a: $ty, b: $ty) -> i32 {
                        ((a as Unsigned) >= (b as Unsigned)) as i32
                }

                /// `a == 0`.
                pub fn eqz(a: $ty) -> i32 {
                    (a == 0) as i32
                }
            }
        }
    };
}

int_kernels!(i32, u32, i32_kernels);
int_kernels!(i64, u64, i64_kernels);

/// Floating-point kernels, canonical-NaN on every result that can produce
/// one. Only the operations this core's fused families actually need
/// (arithmetic used by `call_stacktop`/compare fusions); full Wasm float
/// semantics belong to the non-fused opcode set.
macro_rules! float_kernels {
    ($ty:ty, $mod_name:ident, $canon:ident) => {
        #[doc = concat!("Canonical-NaN floating point kernels for `", stringify!($ty), "`.")]
        pub mod $mod_name {
            use super::*;

            /// Addition, canonicalized.
            pub fn add(a: $ty, b: $ty) -> $ty {
                $canon(a + b)
            }

            /// Subtraction, canonicalized.
            pub fn sub(a: $ty, b: $ty) -> $ty {
                $canon(a - b)
            }

            /// Multiplication, canonicalized.
            pub fn mul(a: $ty, b: $ty) -> $ty {
                $canon(a * b)
            }

            /// Division, canonicalized (division by zero yields `inf`/`NaN`
            /// per IEEE-754, not a trap).
            pub fn div(a: $ty, b: $ty) -> $ty {
                $canon(a / b)
            }

            /// `a == b` (NaN is never equal to anything, including itself).
            pub fn eq(a: $ty, b: $ty) -> i32 {
                (a == b) as i32
            }

            /// `a != b`.
            pub fn ne(a: $ty, b: $ty) -> i32 {
                (a != b) as i32
            }

            /// `a < b`.
            pub fn lt(a: $ty, b: $ty) -> i32 {
                (a < b) as i32
            }

            /// `a <= b`.
            pub fn le(a: $ty, b: $ty) -> i32 {
                (a <= b) as i32
            }

            /// `a > b`.
            pub fn gt(a: $ty, b: $ty) -> i32 {
                (a > b) as i32
            }

            /// `a >= b`.
            pub fn ge(a: $ty, b: $ty) -> i32 {
                (a >= b) as i32
            }
        }
    };
}

float_kernels!(f32, f32_kernels, canonicalize_f32);
float_kernels!(f64, f64_kernels, canonicalize_f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i32_shl_masks_shift_amount() {
        // B3: `i32.shl x, 33` behaves like `i32.shl x, 1`.
        assert_eq!(i32_kernels::shl(1, 33), i32_kernels::shl(1, 1));
    }

    #[test]
    fn i32_div_s_traps_on_min_over_neg_one() {
        assert_eq!(
            i32_kernels::div_s(i32::MIN, -1),
            Err(TrapReason::IntegerOverflow)
        );
    }

    #[test]
    fn i32_rem_s_min_over_neg_one_is_zero_not_a_trap() {
        assert_eq!(i32_kernels::rem_s(i32::MIN, -1), Ok(0));
    }

    #[test]
    fn division_by_zero_traps() {
        assert_eq!(
            i64_kernels::div_u(10, 0),
            Err(TrapReason::IntegerDivideByZero)
        );
    }

    #[test]
    fn nan_results_are_canonicalized() {
        let nan = f32::NAN;
        let result = f32_kernels::add(nan, 1.0);
        assert_eq!(result.to_bits(), CANONICAL_NAN_F32);
    }

    #[test]
    fn unsigned_compare_treats_negative_as_large() {
        assert_eq!(i32_kernels::cmp::lt_u(-1, 1), 0);
        assert_eq!(i32_kernels::cmp::lt_s(-1, 1), 1);
    }

    #[test]
    fn eq_and_ne_are_exact_complements_over_a_value_sweep() {
        use itertools::Itertools;
        let values = [i32::MIN, -1, 0, 1, i32::MAX];
        for (a, b) in values.iter().copied().cartesian_product(values.iter().copied()) {
            assert_eq!(i32_kernels::cmp::eq(a, b), 1 - i32_kernels::cmp::ne(a, b));
        }
    }
}
