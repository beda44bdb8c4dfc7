//! Family 5 (§4.C.5): `local.get x; T.op; local.set x` (update in place)
//! and its `local.tee` variant, fused so the local is read, combined with
//! the stack top, and written back without a separate set/tee record.

use crate::error::ExecResult;
use crate::frame::Word;
use crate::stream::{Context, Control};
use crate::value::i32_kernels;

/// `local[x] = local[x] + pop(); local.set` — the plain update-in-place
/// shape, net stack effect `-1`.
pub fn update_add_i32(ctx: &mut Context) -> ExecResult<Control> {
    let index = ctx.current_record().imm.u32(0) as usize;
    let rhs = super::pop_i32(ctx);
    let lhs = super::local_i32(ctx, index);
    let result = i32_kernels::add(lhs, rhs);
    super::set_local(ctx, index, Word::I32(result));
    ctx.ip += 1;
    Ok(Control::Continue)
}

/// `local.tee` variant: the same update, but the result is also pushed
/// back, net stack effect `0`.
pub fn tee_update_add_i32(ctx: &mut Context) -> ExecResult<Control> {
    let index = ctx.current_record().imm.u32(0) as usize;
    let rhs = super::pop_i32(ctx);
    let lhs = super::local_i32(ctx, index);
    let result = i32_kernels::add(lhs, rhs);
    super::set_local(ctx, index, Word::I32(result));
    super::push_i32(ctx, result);
    ctx.ip += 1;
    Ok(Control::Continue)
}
