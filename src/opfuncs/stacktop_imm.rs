//! Family 2 (§4.C.2): `T.const c; T.op` fused against the current stack
//! top — pop, combine with the record's embedded immediate, push back.

use crate::error::ExecResult;
use crate::stream::{Context, Control};
use crate::value::{i32_kernels, i64_kernels};

macro_rules! stacktop_imm_family {
    ($fn_name:ident, $ty:ty, $kernel:path, $pop:path, $push:path) => {
        /// Pops the stack top, combines it with the embedded immediate via
        /// the family's op, and pushes the result back.
        pub fn $fn_name(ctx: &mut Context) -> ExecResult<Control> {
            let imm = ctx.current_record().imm.i64(0) as $ty;
            let top = $pop(ctx);
            let result = $kernel(top, imm);
            $push(ctx, result);
            ctx.ip += 1;
            Ok(Control::Continue)
        }
    };
}

stacktop_imm_family!(add_imm_stacktop_i32, i32, i32_kernels::add, super::pop_i32, super::push_i32);
stacktop_imm_family!(and_imm_stacktop_i32, i32, i32_kernels::and, super::pop_i32, super::push_i32);
stacktop_imm_family!(add_imm_stacktop_i64, i64, i64_kernels::add, super::pop_i64, super::push_i64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_option::{CompileOption, DispatchMode, RingRange};
    use crate::memory::MemoryInstance;
    use crate::stream::{Immediates, StreamBuilder};
    use alloc::vec;

    #[test]
    fn adds_immediate_to_stack_top() {
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
        builder.push(add_imm_stacktop_i32, Immediates::new([5, 0, 0, 0]));
        let mut ctx = Context::new(
            builder.build(),
            option,
            vec![MemoryInstance::new(0, 0)],
            alloc::vec::Vec::new(),
        );
        super::super::push_i32(&mut ctx, 10);
        add_imm_stacktop_i32(&mut ctx).unwrap();
        assert_eq!(super::super::pop_i32(&mut ctx), 15);
    }
}
