//! Family 11 (§4.C.11): call fusions, folding what would otherwise be
//! `call; <stack/local shuffle>` into one record by routing the callee's
//! single result straight to its eventual destination instead of spilling
//! it through the generic operand stack first.
//!
//! All of these go through [`Context::call_host`] (§6): the core never
//! calls another translated [`crate::stream::Stream`] directly, so "call" at
//! this layer always means a host/import call. A direct call to another
//! function translated by this same core is not a fused primitive — it is
//! ordinary `call` plus ordinary argument marshalling, outside this family's
//! scope (§4.C.11's Non-goals).

use crate::error::ExecResult;
use crate::frame::Word;
use crate::stream::{Context, Control};
use alloc::vec;
use alloc::vec::Vec;

fn module_and_function(ctx: &Context) -> (usize, usize) {
    let record = ctx.current_record();
    (record.imm.u32(0) as usize, record.imm.u32(1) as usize)
}

fn call_result_i32(ctx: &mut Context, module_id: usize, function_index: usize) -> ExecResult<i32> {
    let mut scratch = [0u8; 4];
    ctx.call_host(module_id, function_index, &mut scratch)?;
    Ok(i32::from_le_bytes(scratch))
}

fn call_result_i64(ctx: &mut Context, module_id: usize, function_index: usize) -> ExecResult<i64> {
    let mut scratch = [0u8; 8];
    ctx.call_host(module_id, function_index, &mut scratch)?;
    Ok(i64::from_le_bytes(scratch))
}

fn call_result_f32(ctx: &mut Context, module_id: usize, function_index: usize) -> ExecResult<f32> {
    let mut scratch = [0u8; 4];
    ctx.call_host(module_id, function_index, &mut scratch)?;
    Ok(f32::from_le_bytes(scratch))
}

fn call_result_f64(ctx: &mut Context, module_id: usize, function_index: usize) -> ExecResult<f64> {
    let mut scratch = [0u8; 8];
    ctx.call_host(module_id, function_index, &mut scratch)?;
    Ok(f64::from_le_bytes(scratch))
}

/// Reads the `n` logical top-of-ring values for one type family, in
/// declaration (param 0 first) order, without mutating `curr_T` — a peek,
/// not a pop, so a trap raised later (by the host call itself) still
/// observes P3's "traps never mutate the ring" invariant.
macro_rules! ring_params_peek_commit {
    ($peek_name:ident, $commit_name:ident, $ty:ty, $range:ident, $pos_field:ident, $ring_field:ident) => {
        fn $peek_name(ctx: &Context, n: usize) -> Vec<$ty> {
            let range = ctx.option().$range();
            let mut pos = ctx.$pos_field;
            let mut values = Vec::with_capacity(n);
            for _ in 0..n {
                pos = range.ring_next(pos);
                values.push(*ctx.$ring_field.get(pos));
            }
            values.reverse();
            values
        }

        /// Advances `curr_T` past the `n` values [`$peek_name`] already read,
        /// committing the pop side once the host call has succeeded.
        fn $commit_name(ctx: &mut Context, n: usize) {
            let range = ctx.option().$range();
            for _ in 0..n {
                ctx.$pos_field = range.ring_next(ctx.$pos_field);
            }
        }
    };
}

ring_params_peek_commit!(peek_i32_params, commit_i32_pops, i32, i32_range, int_pos, i32_ring);
ring_params_peek_commit!(peek_i64_params, commit_i64_pops, i64, i64_range, int_pos, i64_ring);
ring_params_peek_commit!(peek_f32_params, commit_f32_pops, f32, f32_range, fp_pos, f32_ring);
ring_params_peek_commit!(peek_f64_params, commit_f64_pops, f64, f64_range, fp_pos, f64_ring);

/// Calls a void host function and discards its (empty) result.
/// Immediates: 0 = module id, 1 = function index.
pub fn call_drop(ctx: &mut Context) -> ExecResult<Control> {
    let (module_id, function_index) = module_and_function(ctx);
    ctx.call_host(module_id, function_index, &mut [])?;
    ctx.ip += 1;
    Ok(Control::Continue)
}

/// Generates a `call_set_local_T`/`call_tee_local_T` pair for one
/// value-type family: the callee's result is written directly into a
/// local, skipping the generic stack. The `tee` variant also pushes it.
macro_rules! call_local_family {
    ($set_name:ident, $tee_name:ident, $call_result:path, $word:path, $push:path) => {
        #[doc = concat!(
            "Calls a host function and writes its result into a local. ",
            "Immediates: 0 = module id, 1 = function index, 2 = local index."
        )]
        pub fn $set_name(ctx: &mut Context) -> ExecResult<Control> {
            let (module_id, function_index) = module_and_function(ctx);
            let local_index = ctx.current_record().imm.u32(2) as usize;
            let value = $call_result(ctx, module_id, function_index)?;
            super::set_local(ctx, local_index, $word(value));
            ctx.ip += 1;
            Ok(Control::Continue)
        }

        #[doc = concat!(
            "As [`", stringify!($set_name), "`], but also pushes the result (the `tee` half)."
        )]
        pub fn $tee_name(ctx: &mut Context) -> ExecResult<Control> {
            let (module_id, function_index) = module_and_function(ctx);
            let local_index = ctx.current_record().imm.u32(2) as usize;
            let value = $call_result(ctx, module_id, function_index)?;
            super::set_local(ctx, local_index, $word(value));
            $push(ctx, value);
            ctx.ip += 1;
            Ok(Control::Continue)
        }
    };
}

call_local_family!(call_set_local_i32, call_tee_local_i32, call_result_i32, Word::I32, super::push_i32);
call_local_family!(call_set_local_i64, call_tee_local_i64, call_result_i64, Word::I64, super::push_i64);

/// Generates `call_stacktop_T`: the §4.C.11 fast path for when *all* N
/// parameters are cache-resident in the T-ring. Builds a scratch buffer
/// sized `max(param_bytes, return_bytes)`, copies the N cache slots into
/// it in param order, invokes the bridge, and on return writes the result
/// back into the ring at `ring_next^(N-1)(curr_T)` — exactly the position
/// popping N values and pushing one lands on. Immediates: 0 = module id,
/// 1 = function index, 2 = N (parameter count). Function names are pasted
/// from the value-type suffix, the way the teacher's per-width families
/// are named.
macro_rules! call_stacktop_family {
    ($ty_suffix:ident, $ty:ty, $peek:path, $commit:path, $push:path, $width:expr) => {
        paste::paste! {
            #[doc = concat!("Calls a host function with its `", stringify!($ty_suffix), "` params cache-resident, and pushes its result.")]
            pub fn [<call_stacktop_ $ty_suffix>](ctx: &mut Context) -> ExecResult<Control> {
                let (module_id, function_index) = module_and_function(ctx);
                let n = ctx.current_record().imm.u32(2) as usize;
                let params: Vec<$ty> = $peek(ctx, n);
                let mut scratch = vec![0u8; (n * $width).max($width)];
                for (i, param) in params.iter().enumerate() {
                    scratch[i * $width..(i + 1) * $width].copy_from_slice(&param.to_le_bytes());
                }
                ctx.call_host(module_id, function_index, &mut scratch)?;
                // Only commit the pops (and thus mutate curr_T) once the call
                // has actually succeeded, preserving P3 on the trap path.
                $commit(ctx, n);
                let value = <$ty>::from_le_bytes(scratch[0..$width].try_into().unwrap());
                $push(ctx, value);
                ctx.ip += 1;
                Ok(Control::Continue)
            }
        }
    };
}

call_stacktop_family!(i32, i32, peek_i32_params, commit_i32_pops, super::push_i32, 4);
call_stacktop_family!(i64, i64, peek_i64_params, commit_i64_pops, super::push_i64, 8);
call_stacktop_family!(f32, f32, peek_f32_params, commit_f32_pops, super::push_f32, 4);
call_stacktop_family!(f64, f64, peek_f64_params, commit_f64_pops, super::push_f64, 8);

/// Cross-width `call_stacktop` fast path (§9's open question, resolved in
/// DESIGN.md): legal only when the f32/f64 rings are merged (§4.B), since
/// it writes into the other width's ring slot at the shared position. A
/// callee that returns `f32` is routed to a site that wants `f64` by
/// converting at push time; [`crate::selector::select_call_stacktop_f32_to_f64`]
/// is the only place allowed to produce this function pointer and it
/// aborts if the rings are not merged. Parameters are still `f32`-width,
/// gathered from the (merged) fp ring exactly as [`call_stacktop_f32`]
/// does; only the return leg crosses width.
pub fn call_stacktop_f32_to_f64(ctx: &mut Context) -> ExecResult<Control> {
    let (module_id, function_index) = module_and_function(ctx);
    let n = ctx.current_record().imm.u32(2) as usize;
    let params = peek_f32_params(ctx, n);
    let mut scratch = vec![0u8; (n * 4).max(4)];
    for (i, param) in params.iter().enumerate() {
        scratch[i * 4..i * 4 + 4].copy_from_slice(&param.to_le_bytes());
    }
    ctx.call_host(module_id, function_index, &mut scratch)?;
    commit_f32_pops(ctx, n);
    let value = f32::from_le_bytes(scratch[0..4].try_into().unwrap());
    super::push_f64(ctx, f64::from(value));
    ctx.ip += 1;
    Ok(Control::Continue)
}

/// `f64`-producer into `f32`-consumer counterpart of
/// [`call_stacktop_f32_to_f64`]. The narrowing cast matches Wasm's own
/// `f64.demote_f32`'s inverse — this is not a Wasm instruction, it is this
/// core's internal fast-path routing, so there is no trap on precision loss.
/// Parameters are `f64`-width, gathered the way [`call_stacktop_f64`] does.
pub fn call_stacktop_f64_to_f32(ctx: &mut Context) -> ExecResult<Control> {
    let (module_id, function_index) = module_and_function(ctx);
    let n = ctx.current_record().imm.u32(2) as usize;
    let params = peek_f64_params(ctx, n);
    let mut scratch = vec![0u8; (n * 8).max(8)];
    for (i, param) in params.iter().enumerate() {
        scratch[i * 8..i * 8 + 8].copy_from_slice(&param.to_le_bytes());
    }
    ctx.call_host(module_id, function_index, &mut scratch)?;
    commit_f64_pops(ctx, n);
    let value = f64::from_le_bytes(scratch[0..8].try_into().unwrap());
    super::push_f32(ctx, value as f32);
    ctx.ip += 1;
    Ok(Control::Continue)
}
