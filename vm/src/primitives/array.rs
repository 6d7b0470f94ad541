use object::{Body, Value};

use crate::error::RuntimeError;
use crate::primitives::{check_bounds, index_arg};
use crate::Vm;

pub fn array_at(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let Some(index) = index_arg(args[0]) else {
        return Ok(None);
    };
    let Some(Body::Array(elements)) = vm.heap.get(receiver).map(|o| &o.body) else {
        return Ok(None);
    };
    let i = check_bounds("Array", index, elements.len());
    Ok(Some(elements[i]))
}

pub fn array_at_put(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let Some(index) = index_arg(args[0]) else {
        return Ok(None);
    };
    let value = args[1];
    let Some(Body::Array(elements)) = vm.heap.get_mut(receiver).map(|o| &mut o.body) else {
        return Ok(None);
    };
    let i = check_bounds("Array", index, elements.len());
    elements[i] = value;
    Ok(Some(value))
}

pub fn array_size(
    vm: &mut Vm,
    receiver: Value,
    _args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    match vm.heap.get(receiver).map(|o| &o.body) {
        Some(Body::Array(elements)) => Ok(Some(Value::from_i64(elements.len() as i64))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::alloc_array;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;

    fn int(n: i64) -> Value {
        Value::from_i64(n)
    }

    #[test]
    fn indices_start_at_one() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let a = alloc_array(&mut vm, vec![int(10), int(20), int(30)]);
        assert_eq!(vm.send(a, "at:", vec![int(1)]), Ok(int(10)));
        assert_eq!(vm.send(a, "at:put:", vec![int(3), Value::TRUE]), Ok(Value::TRUE));
        assert_eq!(vm.send(a, "at:", vec![int(3)]), Ok(Value::TRUE));
        assert_eq!(vm.send(a, "size", vec![]), Ok(int(3)));
    }

    #[test]
    fn non_integer_index_declines() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let a = alloc_array(&mut vm, vec![int(1)]);
        assert_eq!(array_at(&mut vm, a, &[Value::NIL]), Ok(None));
    }

    #[test]
    #[should_panic(expected = "Array index 4 out of bounds")]
    fn at_put_past_the_end_panics() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let a = alloc_array(&mut vm, vec![Value::NIL; 3]);
        let _ = vm.send(a, "at:put:", vec![int(4), int(0)]);
    }

    #[test]
    #[should_panic(expected = "Array index 0 out of bounds")]
    fn index_zero_panics() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let a = alloc_array(&mut vm, vec![Value::NIL; 3]);
        let _ = vm.send(a, "at:", vec![int(0)]);
    }
}
