//! Family 7 (§4.C.7): address-calculation fusion — `base + (idx << k)` and
//! `base + (idx * k)`, the two shapes array-indexing code compiles down to.
//! Both read two locals and push the computed `i32` address; the memory
//! fusions in [`super::memop`] consume that pushed address the same way
//! they consume any other stack-top value.

use crate::error::ExecResult;
use crate::stream::{Context, Control};
use crate::value::i32_kernels;

/// `local[base] + (local[idx] << shift)`.
/// Immediates: 0 = base local index, 1 = idx local index, 2 = shift amount.
pub fn addr_shl_two_locals(ctx: &mut Context) -> ExecResult<Control> {
    let record = ctx.current_record();
    let base_index = record.imm.u32(0) as usize;
    let idx_index = record.imm.u32(1) as usize;
    let shift = record.imm.i32(2);
    let base = super::local_i32(ctx, base_index);
    let idx = super::local_i32(ctx, idx_index);
    let addr = i32_kernels::add(base, i32_kernels::shl(idx, shift));
    super::push_i32(ctx, addr);
    ctx.ip += 1;
    Ok(Control::Continue)
}

/// `local[base] + (local[idx] * k)`.
/// Immediates: 0 = base local index, 1 = idx local index, 2 = multiplier `k`.
pub fn addr_mul_two_locals(ctx: &mut Context) -> ExecResult<Control> {
    let record = ctx.current_record();
    let base_index = record.imm.u32(0) as usize;
    let idx_index = record.imm.u32(1) as usize;
    let k = record.imm.i32(2);
    let base = super::local_i32(ctx, base_index);
    let idx = super::local_i32(ctx, idx_index);
    let addr = i32_kernels::add(base, i32_kernels::mul(idx, k));
    super::push_i32(ctx, addr);
    ctx.ip += 1;
    Ok(Control::Continue)
}
