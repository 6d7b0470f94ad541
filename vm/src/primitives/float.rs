use object::Value;

use crate::error::RuntimeError;
use crate::primitives::number;
use crate::Vm;

/// Both operands as `f64`. Integers on either side are promoted.
fn operands(vm: &Vm, receiver: Value, args: &[Value]) -> Option<(f64, f64)> {
    let a = number(vm, receiver)?.as_f64();
    let b = number(vm, *args.first()?)?.as_f64();
    Some((a, b))
}

fn arith(
    vm: &Vm,
    receiver: Value,
    args: &[Value],
    op: fn(f64, f64) -> f64,
) -> Result<Option<Value>, RuntimeError> {
    Ok(operands(vm, receiver, args).map(|(a, b)| Value::make_float(op(a, b))))
}

fn compare(
    vm: &Vm,
    receiver: Value,
    args: &[Value],
    op: fn(&f64, &f64) -> bool,
) -> Result<Option<Value>, RuntimeError> {
    Ok(operands(vm, receiver, args).map(|(a, b)| Value::from_bool(op(&a, &b))))
}

pub fn float_add(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    arith(vm, receiver, args, |a, b| a + b)
}

pub fn float_sub(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    arith(vm, receiver, args, |a, b| a - b)
}

pub fn float_mul(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    arith(vm, receiver, args, |a, b| a * b)
}

pub fn float_div(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    arith(vm, receiver, args, |a, b| a / b)
}

pub fn float_eq(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    compare(vm, receiver, args, f64::eq)
}

pub fn float_lt(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    compare(vm, receiver, args, f64::lt)
}

pub fn float_gt(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    compare(vm, receiver, args, f64::gt)
}
