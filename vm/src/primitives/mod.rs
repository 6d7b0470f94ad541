//! Primitive methods.
//!
//! A method with a primitive index runs the primitive first. `Ok(None)`
//! means the primitive does not handle these operands and the method's
//! bytecode runs instead. `Err` is a recoverable failure raised by code the
//! primitive called back into (block invocation).

use object::{Body, Value};

use crate::error::RuntimeError;
use crate::lookup::class_of;
use crate::Vm;

pub mod array;
pub mod block;
pub mod bytearray;
pub mod float;
pub mod integer;
pub mod instance;
pub mod string;

pub type PrimitiveFn =
    fn(&mut Vm, Value, &[Value]) -> Result<Option<Value>, RuntimeError>;

#[derive(Clone, Copy)]
pub struct PrimitiveDesc {
    pub index: u16,
    pub name: &'static str,
    pub arity: u8,
    pub func: PrimitiveFn,
}

impl PrimitiveDesc {
    pub const fn new(
        index: u16,
        name: &'static str,
        arity: u8,
        func: PrimitiveFn,
    ) -> Self {
        Self {
            index,
            name,
            arity,
            func,
        }
    }
}

pub static PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(1, "integer_add", 1, integer::integer_add),
    PrimitiveDesc::new(2, "integer_mul", 1, integer::integer_mul),
    PrimitiveDesc::new(3, "integer_eq", 1, integer::integer_eq),
    PrimitiveDesc::new(4, "integer_sub", 1, integer::integer_sub),
    PrimitiveDesc::new(5, "basic_class", 0, instance::basic_class),
    PrimitiveDesc::new(6, "integer_lt", 1, integer::integer_lt),
    PrimitiveDesc::new(7, "integer_gt", 1, integer::integer_gt),
    PrimitiveDesc::new(10, "float_add", 1, float::float_add),
    PrimitiveDesc::new(11, "float_sub", 1, float::float_sub),
    PrimitiveDesc::new(12, "float_mul", 1, float::float_mul),
    PrimitiveDesc::new(13, "float_div", 1, float::float_div),
    PrimitiveDesc::new(14, "float_eq", 1, float::float_eq),
    PrimitiveDesc::new(15, "float_lt", 1, float::float_lt),
    PrimitiveDesc::new(16, "float_gt", 1, float::float_gt),
    PrimitiveDesc::new(20, "block_new", 0, block::block_new),
    PrimitiveDesc::new(21, "block_value", 0, block::block_value),
    PrimitiveDesc::new(22, "block_value_arg", 1, block::block_value),
    PrimitiveDesc::new(30, "string_size", 0, string::string_size),
    PrimitiveDesc::new(31, "string_concat", 1, string::string_concat),
    PrimitiveDesc::new(40, "array_at", 1, array::array_at),
    PrimitiveDesc::new(41, "array_at_put", 2, array::array_at_put),
    PrimitiveDesc::new(42, "array_size", 0, array::array_size),
    PrimitiveDesc::new(50, "bytearray_at", 1, bytearray::bytearray_at),
    PrimitiveDesc::new(51, "bytearray_at_put", 2, bytearray::bytearray_at_put),
    PrimitiveDesc::new(52, "bytearray_size", 0, bytearray::bytearray_size),
    PrimitiveDesc::new(60, "basic_new", 0, instance::basic_new),
    PrimitiveDesc::new(61, "basic_new_sized", 1, instance::basic_new_sized),
];

pub fn primitive(index: u16) -> Option<&'static PrimitiveDesc> {
    PRIMITIVES.iter().find(|p| p.index == index)
}

/// Run primitive `index`.
///
/// # Panics
///
/// Panics if no primitive has that index; methods only carry indices
/// from [`PRIMITIVES`].
pub fn dispatch(
    vm: &mut Vm,
    index: u16,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let Some(desc) = primitive(index) else {
        panic!("unknown primitive index {index}");
    };
    if desc.arity as usize != args.len() {
        return Ok(None);
    }
    (desc.func)(vm, receiver, args)
}

// ── operand helpers ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// Read a numeric operand.
///
/// # Panics
///
/// Integers are always immediate; a heap object of class `Integer` is a
/// broken invariant.
pub(crate) fn number(vm: &Vm, value: Value) -> Option<Number> {
    if let Some(i) = value.get_integer() {
        return Some(Number::Integer(i));
    }
    if let Some(f) = value.get_float() {
        return Some(Number::Float(f));
    }
    if value.is_pointer() && class_of(vm, value) == vm.special.integer {
        panic!("non-immediate integer {value:?}");
    }
    None
}

/// Convert a 1-based index operand to a 0-based one. `None` if the
/// operand is not an integer.
pub(crate) fn index_arg(value: Value) -> Option<i64> {
    value.get_integer().map(|i| i - 1)
}

/// # Panics
///
/// Panics if `index` is outside `0..len`.
pub(crate) fn check_bounds(what: &str, index: i64, len: usize) -> usize {
    if index < 0 || index as usize >= len {
        panic!("{what} index {} out of bounds 1..={len}", index + 1);
    }
    index as usize
}

pub(crate) fn string_contents(vm: &Vm, value: Value) -> Option<&str> {
    match vm.heap.get(value).map(|o| &o.body) {
        Some(Body::String(s)) | Some(Body::Symbol(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_unique() {
        for (i, a) in PRIMITIVES.iter().enumerate() {
            for b in &PRIMITIVES[i + 1..] {
                assert_ne!(a.index, b.index, "{} and {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn installed_primitives_exist() {
        for &(_, selector, index) in crate::special::PRIMITIVE_METHODS {
            let desc = primitive(index).unwrap_or_else(|| panic!("{selector}: {index}"));
            let colons = selector.matches(':').count();
            let binary = !selector.chars().next().is_some_and(char::is_alphabetic);
            let arity = if binary { 1 } else { colons };
            assert_eq!(desc.arity as usize, arity, "{selector}");
        }
    }
}
