//! Family 4 (§4.C.4): two ring-resident operands compared and the `0`/`1`
//! result pushed back onto the ring — the second family built with the
//! full const-generic ring-position mechanism (see [`super::arith_imm`]
//! for the rationale).
//!
//! Unlike `arith_imm`, both operands live in the ring: the left operand at
//! the compile-time position `POS`, the right at `POS`'s predecessor in
//! the pop direction. The translator only ever selects this family when
//! both operands are simultaneously ring-resident.

use crate::error::ExecResult;
use crate::stream::{Context, Control};
use crate::value::i32_kernels;

macro_rules! ring_compare_family {
    ($fn_name:ident, $cmp:path) => {
        /// Compares the two top ring-resident `i32`s and pushes a `0`/`1`
        /// `i32` result at the compile-time position `POS`.
        pub fn $fn_name<const POS: usize>(ctx: &mut Context) -> ExecResult<Control> {
            let range = ctx.option().i32_range();
            let rhs_pos = range.ring_next(POS);
            let lhs = *ctx.i32_ring.reg::<POS>();
            let rhs = *ctx.i32_ring.get(rhs_pos);
            let result = $cmp(lhs, rhs);
            let mut slot = ctx.i32_ring.reg_mut::<POS>();
            *slot = result;
            ctx.int_pos = POS;
            ctx.ip += 1;
            Ok(Control::Continue)
        }
    };
}

ring_compare_family!(eq_ring_i32, i32_kernels::cmp::eq);
ring_compare_family!(lt_s_ring_i32, i32_kernels::cmp::lt_s);
ring_compare_family!(lt_u_ring_i32, i32_kernels::cmp::lt_u);

/// Selector table for [`eq_ring_i32`].
pub fn eq_ring_i32_table() -> [crate::stream::OpFn; crate::consts::RING_POOL_SIZE] {
    crate::ring_table!(eq_ring_i32)
}
