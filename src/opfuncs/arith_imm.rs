//! Family 1 (§4.C.1): `local.get x; i32.const c; i32.add` and siblings,
//! fused into one record that reads a local, combines it with an embedded
//! immediate, and pushes the result onto the ring cache.
//!
//! This family carries the crate's full const-generic ring-position
//! mechanism: each `<POS>` monomorphization is a distinct `fn` item, so the
//! selector table built by [`crate::ring_table!`] hands the translator
//! `RING_POOL_SIZE` genuinely different function pointers, one per legal
//! `curr_T` (§4.B, §9).

use crate::error::ExecResult;
use crate::ring::RegMut;
use crate::stream::{Context, Control};
use crate::value::{i32_kernels, i64_kernels};

macro_rules! imm_binop_family {
    ($fn_name:ident, $ty:ty, $kernel:path, $ring:ident, $read_local:ident) => {
        /// Reads `local[a]`, combines it with the record's embedded
        /// immediate via the family's op, and pushes the result at the
        /// compile-time-bound ring position `POS`.
        pub fn $fn_name<const POS: usize>(ctx: &mut Context) -> ExecResult<Control> {
            let record = ctx.current_record();
            let local_index = record.imm.u32(0) as usize;
            let imm = record.imm.i64(1) as $ty;
            let lhs = $read_local(ctx, local_index);
            let result = $kernel(lhs, imm);
            let range = ctx.option().i32_range();
            debug_assert!(
                range.contains(POS) || ctx.option().i64_range().contains(POS),
                "selector picked a ring position outside the compile-time range"
            );
            let mut slot: RegMut<'_, $ty, POS> = ctx.$ring.reg_mut();
            *slot = result;
            ctx.ip += 1;
            Ok(Control::Continue)
        }
    };
}

fn local_as_i32(ctx: &Context, index: usize) -> i32 {
    super::local_i32(ctx, index)
}

fn local_as_i64(ctx: &Context, index: usize) -> i64 {
    ctx.frame().local(index).as_i64()
}

imm_binop_family!(add_imm_local_i32, i32, i32_kernels::add, i32_ring, local_as_i32);
imm_binop_family!(sub_imm_local_i32, i32, i32_kernels::sub, i32_ring, local_as_i32);
imm_binop_family!(and_imm_local_i32, i32, i32_kernels::and, i32_ring, local_as_i32);
imm_binop_family!(add_imm_local_i64, i64, i64_kernels::add, i64_ring, local_as_i64);
imm_binop_family!(sub_imm_local_i64, i64, i64_kernels::sub, i64_ring, local_as_i64);
imm_binop_family!(and_imm_local_i64, i64, i64_kernels::and, i64_ring, local_as_i64);

/// The full `RING_POOL_SIZE`-wide selector table for `add_imm_local_i32`,
/// built once and indexed by the translator's `curr_T` at selection time.
pub fn add_imm_local_i32_table() -> [crate::stream::OpFn; crate::consts::RING_POOL_SIZE] {
    crate::ring_table!(add_imm_local_i32)
}

/// Selector table for `add_imm_local_i64`.
pub fn add_imm_local_i64_table() -> [crate::stream::OpFn; crate::consts::RING_POOL_SIZE] {
    crate::ring_table!(add_imm_local_i64)
}
