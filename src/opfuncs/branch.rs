//! Family 9 (§4.C.9) branch fusions and family 10 (§4.C.10) the stack-top
//! transform primitive.
//!
//! The "nomerge" hint §4.C.9/§9 mentions (preventing the backend from
//! folding a branch's taken/fallthrough tail-call sites together) has no
//! stable safe-Rust equivalent and is not reproduced here; §9 explicitly
//! classifies its absence as a performance regression, not a correctness
//! bug (recorded in DESIGN.md's open-question resolutions).

use crate::error::ExecResult;
use crate::frame::Word;
use crate::stream::{Context, Control};
use crate::value::i32_kernels;
use alloc::vec::Vec;

/// Typed comparison tag carried as an immediate by [`br_if_stacktop_cmp`]
/// and [`br_if_local_cmp_imm`] — the same ten comparisons family 4 (compare)
/// supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// Signed `<`.
    LtS,
    /// Unsigned `<`.
    LtU,
    /// Signed `<=`.
    LeS,
    /// Unsigned `<=`.
    LeU,
    /// Signed `>`.
    GtS,
    /// Unsigned `>`.
    GtU,
    /// Signed `>=`.
    GeS,
    /// Unsigned `>=`.
    GeU,
}

impl CmpOp {
    fn from_tag(tag: u32) -> Self {
        match tag {
            0 => Self::Eq,
            1 => Self::Ne,
            2 => Self::LtS,
            3 => Self::LtU,
            4 => Self::LeS,
            5 => Self::LeU,
            6 => Self::GtS,
            7 => Self::GtU,
            8 => Self::GeS,
            9 => Self::GeU,
            _ => crate::error::internal_invariant_violation("unknown branch comparison tag"),
        }
    }

    fn apply(self, a: i32, b: i32) -> i32 {
        match self {
            Self::Eq => i32_kernels::cmp::eq(a, b),
            Self::Ne => i32_kernels::cmp::ne(a, b),
            Self::LtS => i32_kernels::cmp::lt_s(a, b),
            Self::LtU => i32_kernels::cmp::lt_u(a, b),
            Self::LeS => i32_kernels::cmp::le_s(a, b),
            Self::LeU => i32_kernels::cmp::le_u(a, b),
            Self::GtS => i32_kernels::cmp::gt_s(a, b),
            Self::GtU => i32_kernels::cmp::gt_u(a, b),
            Self::GeS => i32_kernels::cmp::ge_s(a, b),
            Self::GeU => i32_kernels::cmp::ge_u(a, b),
        }
    }
}

fn taken(ctx: &mut Context, condition: bool, target: usize) -> Control {
    ctx.ip = if condition { target } else { ctx.ip + 1 };
    Control::Continue
}

/// `br_if` on `local[x] == 0`. Immediates: 0 = local index, 1 = target ip.
pub fn br_if_local_eqz(ctx: &mut Context) -> ExecResult<Control> {
    let record = ctx.current_record();
    let local_index = record.imm.u32(0) as usize;
    let target = record.imm.u32(1) as usize;
    let value = super::local_i32(ctx, local_index);
    Ok(taken(ctx, i32_kernels::cmp::eqz(value) != 0, target))
}

/// `br_if` on `pop() == 0`. Immediates: 0 = target ip.
pub fn br_if_stacktop_eqz(ctx: &mut Context) -> ExecResult<Control> {
    let target = ctx.current_record().imm.u32(0) as usize;
    let value = super::pop_i32(ctx);
    Ok(taken(ctx, i32_kernels::cmp::eqz(value) != 0, target))
}

/// `br_if` on a typed comparison between the top two stack values (`rhs`
/// on top, `lhs` beneath). Immediates: 0 = target ip, 1 = [`CmpOp`] tag.
pub fn br_if_stacktop_cmp(ctx: &mut Context) -> ExecResult<Control> {
    let record = ctx.current_record();
    let target = record.imm.u32(0) as usize;
    let op = CmpOp::from_tag(record.imm.u32(1));
    let rhs = super::pop_i32(ctx);
    let lhs = super::pop_i32(ctx);
    Ok(taken(ctx, op.apply(lhs, rhs) != 0, target))
}

/// `br_if` on `local[x] cmp imm`.
/// Immediates: 0 = local index, 1 = imm, 2 = target ip, 3 = [`CmpOp`] tag.
pub fn br_if_local_cmp_imm(ctx: &mut Context) -> ExecResult<Control> {
    let record = ctx.current_record();
    let local_index = record.imm.u32(0) as usize;
    let imm = record.imm.i32(1);
    let target = record.imm.u32(2) as usize;
    let op = CmpOp::from_tag(record.imm.u32(3));
    let lhs = super::local_i32(ctx, local_index);
    Ok(taken(ctx, op.apply(lhs, imm) != 0, target))
}

/// `br_if` on `(pop() & pop()) != 0`. Immediates: 0 = target ip.
pub fn br_if_stacktop_and_nonzero(ctx: &mut Context) -> ExecResult<Control> {
    let target = ctx.current_record().imm.u32(0) as usize;
    let rhs = super::pop_i32(ctx);
    let lhs = super::pop_i32(ctx);
    Ok(taken(ctx, i32_kernels::and(lhs, rhs) != 0, target))
}

/// `local.tee x; br_if` on the teed value being nonzero: writes the stack
/// top into `local[x]` without consuming it (the tee), then branches if it
/// is nonzero. Immediates: 0 = local index, 1 = target ip.
pub fn br_if_tee_local_nonzero(ctx: &mut Context) -> ExecResult<Control> {
    let record = ctx.current_record();
    let local_index = record.imm.u32(0) as usize;
    let target = record.imm.u32(1) as usize;
    let value = super::pop_i32(ctx);
    super::set_local(ctx, local_index, Word::I32(value));
    super::push_i32(ctx, value);
    Ok(taken(ctx, value != 0, target))
}

/// Family 10 (§4.C.10), a SUPPLEMENTED first-class opfunc per
/// SPEC_FULL.md: rotates the ring for one value-type family so its
/// `curr_T` becomes `begin_T`, re-canonicalizing `count` ring-resident
/// entries (immediate slot 0) ahead of an unconditional `br` whose target
/// expects the canonical position (§4.B, P4). One concrete function per
/// value-type family; a translator chains the ones it needs before a
/// multi-type branch.
macro_rules! stack_top_transform_family {
    ($fn_name:ident, $pos_field:ident, $range_fn:ident, $pop:path, $push:path) => {
        #[doc = concat!("Re-canonicalizes the `", stringify!($pos_field), "` ring ahead of a branch.")]
        pub fn $fn_name(ctx: &mut Context) -> ExecResult<Control> {
            let count = ctx.current_record().imm.u32(0) as usize;
            let range = ctx.option().$range_fn();
            if !range.is_disabled() && count > 0 {
                let values: Vec<_> = (0..count).map(|_| $pop(ctx)).collect();
                // Pushing `count` values always walks the cursor `count`
                // steps in the ring_prev direction, so to land back on
                // `begin` once the re-push is done, start the re-push from
                // `count` steps ahead of `begin` in the ring_next direction.
                let mut start = range.begin();
                for _ in 0..count {
                    start = range.ring_next(start);
                }
                ctx.$pos_field = start;
                for value in values.iter().rev() {
                    $push(ctx, *value);
                }
            }
            ctx.ip += 1;
            Ok(Control::Continue)
        }
    };
}

stack_top_transform_family!(stack_top_transform_i32, int_pos, i32_range, super::pop_i32, super::push_i32);
stack_top_transform_family!(stack_top_transform_i64, int_pos, i64_range, super::pop_i64, super::push_i64);
stack_top_transform_family!(stack_top_transform_f32, fp_pos, f32_range, super::pop_f32, super::push_f32);
stack_top_transform_family!(stack_top_transform_f64, fp_pos, f64_range, super::pop_f64, super::push_f64);
stack_top_transform_family!(stack_top_transform_v128, fp_pos, v128_range, super::pop_v128, super::push_v128);
