use object::{Body, Value};

use crate::alloc::alloc_instance;
use crate::error::RuntimeError;
use crate::lookup::class_of;
use crate::Vm;

pub fn basic_class(
    vm: &mut Vm,
    receiver: Value,
    _args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(class_of(vm, receiver)))
}

fn is_class(vm: &Vm, value: Value) -> bool {
    matches!(vm.heap.get(value).map(|o| &o.body), Some(Body::Class(_)))
}

pub fn basic_new(
    vm: &mut Vm,
    receiver: Value,
    _args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    if !is_class(vm, receiver) {
        return Ok(None);
    }
    Ok(Some(alloc_instance(vm, receiver, 0)))
}

pub fn basic_new_sized(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let Some(size) = args[0].get_integer().filter(|n| *n >= 0) else {
        return Ok(None);
    };
    if !is_class(vm, receiver) {
        return Ok(None);
    }
    Ok(Some(alloc_instance(vm, receiver, size as usize)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::alloc_class;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;

    #[test]
    fn new_follows_instance_variables() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let object = vm.special.object;
        alloc_class(&mut vm, "Pair", object, &["left", "right"]);
        let pair = vm.global("Pair").unwrap();

        let p = vm.send(pair, "new", vec![]).unwrap();
        let pair = vm.global("Pair").unwrap();
        assert_eq!(vm.send(p, "basicClass", vec![]), Ok(pair));
        assert!(matches!(vm.body(p), Body::Instance(i) if i.ivars.len() == 2));
    }

    #[test]
    fn sized_new_on_indexable_classes() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let bytes = vm.special.byte_array;
        let b = vm.send(bytes, "new:", vec![Value::from_i64(4)]).unwrap();
        assert_eq!(vm.send(b, "size", vec![]), Ok(Value::from_i64(4)));
    }

    #[test]
    fn new_on_non_class_declines() {
        let mut vm = bootstrap(VmCreateInfo::default());
        assert_eq!(basic_new(&mut vm, Value::from_i64(3), &[]), Ok(None));
        let array = vm.special.array;
        assert_eq!(
            basic_new_sized(&mut vm, array, &[Value::from_i64(-1)]),
            Ok(None)
        );
    }
}
