use object::Value;

use crate::alloc::alloc_string;
use crate::error::RuntimeError;
use crate::primitives::string_contents;
use crate::Vm;

pub fn string_size(
    vm: &mut Vm,
    receiver: Value,
    _args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    Ok(string_contents(vm, receiver).map(|s| Value::from_i64(s.chars().count() as i64)))
}

/// A new String. Symbols concatenate as their names.
pub fn string_concat(
    vm: &mut Vm,
    receiver: Value,
    args: &[Value],
) -> Result<Option<Value>, RuntimeError> {
    let (Some(a), Some(b)) = (string_contents(vm, receiver), string_contents(vm, args[0]))
    else {
        return Ok(None);
    };
    let joined = format!("{a}{b}");
    Ok(Some(alloc_string(vm, &joined)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;
    use object::Body;

    #[test]
    fn size_counts_characters() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let s = alloc_string(&mut vm, "héllo");
        assert_eq!(vm.send(s, "size", vec![]), Ok(Value::from_i64(5)));
    }

    #[test]
    fn concat_accepts_symbols() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let s = alloc_string(&mut vm, "foo");
        let sym = vm.intern("bar");
        let joined = vm.send(s, ",", vec![sym]).unwrap();
        assert!(matches!(vm.body(joined), Body::String(s) if s == "foobar"));
        assert_eq!(string_concat(&mut vm, joined, &[Value::NIL]), Ok(None));
    }
}
