use object::Value;

use crate::error::RuntimeError;
use crate::primitives::{number, Number};
use crate::Vm;

/// Results outside the immediate range are fatal: there is no boxed
/// integer representation to overflow into.
fn integer_result(op: &str, a: i64, b: i64, result: Option<i64>) -> Value {
    match result.and_then(|r| Value::make_integer(r).ok()) {
        Some(v) => v,
        None => panic!("integer overflow: {a} {op} {b}"),
    }
}

fn operands(vm: &Vm, receiver: Value, args: &[Value]) -> Option<(i64, Number)> {
    let Some(Number::Integer(a)) = number(vm, receiver) else {
        return None;
    };
    Some((a, number(vm, *args.first()?)?))
}

fn arith(
    vm: &Vm,
    receiver: Value,
    args: &[Value],
    op: &str,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Option<Value> {
    Some(match operands(vm, receiver, args)? {
        (a, Number::Integer(b)) => integer_result(op, a, b, int(a, b)),
        (a, Number::Float(b)) => Value::make_float(float(a as f64, b)),
    })
}

fn compare(
    vm: &Vm,
    receiver: Value,
    args: &[Value],
    int: fn(&i64, &i64) -> bool,
    float: fn(&f64, &f64) -> bool,
) -> Option<Value> {
    Some(Value::from_bool(match operands(vm, receiver, args)? {
        (a, Number::Integer(b)) => int(&a, &b),
        (a, Number::Float(b)) => float(&(a as f64), &b),
    }))
}

pub fn integer_add(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(arith(vm, receiver, args, "+", i64::checked_add, |a, b| a + b))
}

pub fn integer_sub(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(arith(vm, receiver, args, "-", i64::checked_sub, |a, b| a - b))
}

pub fn integer_mul(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(arith(vm, receiver, args, "*", i64::checked_mul, |a, b| a * b))
}

pub fn integer_eq(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(compare(vm, receiver, args, i64::eq, f64::eq))
}

pub fn integer_lt(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(compare(vm, receiver, args, i64::lt, f64::lt))
}

pub fn integer_gt(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(compare(vm, receiver, args, i64::gt, f64::gt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;

    fn int(n: i64) -> Value {
        Value::from_i64(n)
    }

    #[test]
    fn arithmetic_and_comparison() {
        let mut vm = bootstrap(VmCreateInfo::default());
        assert_eq!(integer_add(&mut vm, int(5), &[int(10)]), Ok(Some(int(15))));
        assert_eq!(integer_sub(&mut vm, int(5), &[int(10)]), Ok(Some(int(-5))));
        assert_eq!(integer_mul(&mut vm, int(-6), &[int(7)]), Ok(Some(int(-42))));
        assert_eq!(integer_eq(&mut vm, int(3), &[int(3)]), Ok(Some(Value::TRUE)));
        assert_eq!(integer_lt(&mut vm, int(3), &[int(2)]), Ok(Some(Value::FALSE)));
        assert_eq!(integer_gt(&mut vm, int(3), &[int(2)]), Ok(Some(Value::TRUE)));
    }

    #[test]
    fn float_argument_promotes() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let result = integer_add(&mut vm, int(1), &[Value::make_float(0.5)])
            .unwrap()
            .and_then(Value::get_float)
            .unwrap();
        assert!((result - 1.5).abs() < 1e-12);
    }

    #[test]
    fn other_operands_decline() {
        let mut vm = bootstrap(VmCreateInfo::default());
        assert_eq!(integer_add(&mut vm, int(1), &[Value::NIL]), Ok(None));
        assert_eq!(integer_add(&mut vm, Value::NIL, &[int(1)]), Ok(None));
    }

    #[test]
    #[should_panic(expected = "integer overflow")]
    fn overflow_is_fatal() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let _ = integer_mul(&mut vm, int(object::INTEGER_MAX), &[int(2)]);
    }
}
