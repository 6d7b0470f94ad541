use object::{Body, Value};

use crate::error::RuntimeError;
use crate::primitives::{check_bounds, index_arg};
use crate::Vm;

pub fn bytearray_at(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let Some(index) = index_arg(args[0]) else {
        return Ok(None);
    };
    let Some(Body::ByteArray(bytes)) = vm.heap.get(receiver).map(|o| &o.body) else {
        return Ok(None);
    };
    let i = check_bounds("ByteArray", index, bytes.len());
    Ok(Some(Value::from_i64(bytes[i] as i64)))
}

/// # Panics
///
/// Panics if the index is out of bounds or the value is outside 0..=255.
pub fn bytearray_at_put(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let (Some(index), Some(value)) = (index_arg(args[0]), args[1].get_integer()) else {
        return Ok(None);
    };
    let Some(Body::ByteArray(bytes)) = vm.heap.get_mut(receiver).map(|o| &mut o.body) else {
        return Ok(None);
    };
    let i = check_bounds("ByteArray", index, bytes.len());
    let Ok(byte) = u8::try_from(value) else {
        panic!("ByteArray value {value} out of range 0..=255");
    };
    bytes[i] = byte;
    Ok(Some(args[1]))
}

pub fn bytearray_size(
    vm: &mut Vm,
    receiver: Value,
    _args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    match vm.heap.get(receiver).map(|o| &o.body) {
        Some(Body::ByteArray(bytes)) => Ok(Some(Value::from_i64(bytes.len() as i64))),
        _ => Ok(None),
    }
}
