use object::{Body, Value};

use crate::alloc::alloc_block;
use crate::error::RuntimeError;
use crate::interpreter::call_block;
use crate::Vm;

/// An empty block closed over the active context.
pub fn block_new(
    vm: &mut Vm,
    _receiver: Value,
    _args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let outer = vm.active_context().cloned();
    Ok(Some(alloc_block(vm, Vec::<u8>::new().into(), Vec::new(), 0, outer)))
}

/// `value` and `value:`.
pub fn block_value(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    if !matches!(vm.heap.get(receiver).map(|o| &o.body), Some(Body::Block(_))) {
        return Ok(None);
    }
    call_block(vm, receiver, args.to_vec()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;

    #[test]
    fn new_block_answers_nil() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let class = vm.special.block;
        let block = vm.send(class, "new", vec![]).unwrap();
        assert!(matches!(vm.body(block), Body::Block(b) if b.bytecode.is_empty()));
        assert_eq!(vm.send(block, "value", vec![]), Ok(Value::NIL));
    }
}
