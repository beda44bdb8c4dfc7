//! Family 3 (§4.C.3): `local.get a; local.get b; T.op` fused into one
//! record, skipping the intermediate stack traffic of reading each local
//! separately.

use crate::error::ExecResult;
use crate::stream::{Context, Control};
use crate::value::{i32_kernels, i64_kernels};

macro_rules! two_local_family {
    ($fn_name:ident, $kernel:path, $read_local:path, $push:path) => {
        /// Reads `local[a]` and `local[b]` (indices from immediate slots 0
        /// and 1), applies the family's op, and pushes the result.
        pub fn $fn_name(ctx: &mut Context) -> ExecResult<Control> {
            let record = ctx.current_record();
            let a = record.imm.u32(0) as usize;
            let b = record.imm.u32(1) as usize;
            let lhs = $read_local(ctx, a);
            let rhs = $read_local(ctx, b);
            let result = $kernel(lhs, rhs);
            $push(ctx, result);
            ctx.ip += 1;
            Ok(Control::Continue)
        }
    };
}

fn local_i32(ctx: &Context, index: usize) -> i32 {
    super::local_i32(ctx, index)
}

fn local_i64(ctx: &Context, index: usize) -> i64 {
    ctx.frame().local(index).as_i64()
}

two_local_family!(add_two_locals_i32, i32_kernels::add, local_i32, super::push_i32);
two_local_family!(mul_two_locals_i32, i32_kernels::mul, local_i32, super::push_i32);
two_local_family!(add_two_locals_i64, i64_kernels::add, local_i64, super::push_i64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_option::{CompileOption, DispatchMode, RingRange};
    use crate::frame::{Frame, RingPositions, Word};
    use crate::memory::MemoryInstance;
    use crate::stream::{Immediates, StreamBuilder};
    use alloc::vec;

    #[test]
    fn adds_two_distinct_locals() {
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
        builder.push(add_two_locals_i32, Immediates::new([0, 1, 0, 0]));
        let mut ctx = Context::new(
            builder.build(),
            option,
            vec![MemoryInstance::new(0, 0)],
            alloc::vec::Vec::new(),
        );
        ctx.frames.push(Frame::new(
            alloc::vec![Word::I32(3), Word::I32(4)],
            0,
            0,
            RingPositions::default(),
        ));
        add_two_locals_i32(&mut ctx).unwrap();
        assert_eq!(crate::opfuncs::pop_i32(&mut ctx), 7);
    }
}
