//! Family 8 (§4.C.8): bit-pack fusion, `lo | (hi << k)`, folding the common
//! "combine two halves into one word" shape into one record.

use crate::error::ExecResult;
use crate::stream::{Context, Control};
use crate::value::i32_kernels;

/// Pops the top two stack values — `hi` (top) then `lo` (second) — and
/// pushes `lo | (hi << shift)`. Immediate 0 = shift amount.
pub fn shl_or_stacktop_i32(ctx: &mut Context) -> ExecResult<Control> {
    let shift = ctx.current_record().imm.i32(0);
    let hi = super::pop_i32(ctx);
    let lo = super::pop_i32(ctx);
    let result = i32_kernels::or(lo, i32_kernels::shl(hi, shift));
    super::push_i32(ctx, result);
    ctx.ip += 1;
    Ok(Control::Continue)
}

/// `local[lo] | (local[hi] << shift)`, the two-local counterpart of
/// [`shl_or_stacktop_i32`] for when both halves already live in locals.
/// Immediates: 0 = lo local index, 1 = hi local index, 2 = shift amount.
pub fn shl_or_two_locals_i32(ctx: &mut Context) -> ExecResult<Control> {
    let record = ctx.current_record();
    let lo_index = record.imm.u32(0) as usize;
    let hi_index = record.imm.u32(1) as usize;
    let shift = record.imm.i32(2);
    let lo = super::local_i32(ctx, lo_index);
    let hi = super::local_i32(ctx, hi_index);
    let result = i32_kernels::or(lo, i32_kernels::shl(hi, shift));
    super::push_i32(ctx, result);
    ctx.ip += 1;
    Ok(Control::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_option::{CompileOption, DispatchMode, RingRange};
    use crate::frame::{Frame, RingPositions, Word};
    use crate::memory::MemoryInstance;
    use crate::stream::{Immediates, StreamBuilder};
    use alloc::vec;

    fn ctx() -> Context {
        let option = CompileOption::try_new(
            DispatchMode::Chained,
            RingRange::new(0, 2).unwrap(),
            RingRange::new(0, 2).unwrap(),
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap();
        let mut builder = StreamBuilder::new();
        builder.push(shl_or_stacktop_i32, Immediates::new([8, 0, 0, 0]));
        Context::new(builder.build(), option, vec![MemoryInstance::new(0, 0)], alloc::vec::Vec::new())
    }

    #[test]
    fn bitpack_combines_lo_and_shifted_hi() {
        // scenario 6: lo=0x00AB, hi=0x00CD, shift=8 -> 0xCDAB
        let mut ctx = ctx();
        super::super::push_i32(&mut ctx, 0x00AB); // lo, pushed first (deeper)
        super::super::push_i32(&mut ctx, 0x00CD); // hi, on top
        shl_or_stacktop_i32(&mut ctx).unwrap();
        assert_eq!(super::super::pop_i32(&mut ctx), 0xCDAB);
    }

    #[test]
    fn bitpack_two_locals_matches_stacktop_variant() {
        let option = CompileOption::try_new(
            DispatchMode::Stepped,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
            RingRange::DISABLED,
        )
        .unwrap();
        let mut builder = StreamBuilder::new();
        builder.push(shl_or_two_locals_i32, Immediates::new([0, 1, 8, 0]));
        let mut ctx = Context::new(builder.build(), option, vec![MemoryInstance::new(0, 0)], alloc::vec::Vec::new());
        ctx.frames.push(Frame::new(
            alloc::vec![Word::I32(0x00AB), Word::I32(0x00CD)],
            0,
            0,
            RingPositions::default(),
        ));
        shl_or_two_locals_i32(&mut ctx).unwrap();
        assert_eq!(super::super::pop_i32(&mut ctx), 0xCDAB);
    }
}
