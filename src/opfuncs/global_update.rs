//! Family 6 (§4.C.6): `global.get g; T.op; global.set g`, the module-global
//! counterpart of [`super::update_inplace`].

use crate::error::ExecResult;
use crate::frame::Word;
use crate::stream::{Context, Control};
use crate::value::i32_kernels;

/// Updates `globals[g]` in place with `globals[g] + pop()`.
pub fn update_add_i32(ctx: &mut Context) -> ExecResult<Control> {
    let index = ctx.current_record().imm.u32(0) as usize;
    let rhs = super::pop_i32(ctx);
    let lhs = ctx.globals[index].as_i32();
    let result = i32_kernels::add(lhs, rhs);
    ctx.globals[index] = Word::I32(result);
    ctx.ip += 1;
    Ok(Control::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_option::{CompileOption, DispatchMode, RingRange};
    use crate::memory::MemoryInstance;
    use crate::stream::{Immediates, StreamBuilder};
    use alloc::vec;

    #[test]
    fn global_update_writes_back_without_pushing() {
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
        builder.push(update_add_i32, Immediates::new([0, 0, 0, 0]));
        let mut ctx = Context::new(
            builder.build(),
            option,
            vec![MemoryInstance::new(0, 0)],
            alloc::vec![Word::I32(100)],
        );
        super::super::push_i32(&mut ctx, 1);
        update_add_i32(&mut ctx).unwrap();
        assert_eq!(ctx.globals[0].as_i32(), 101);
    }
}
