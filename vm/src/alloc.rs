//! Constructors for heap objects of the core classes.
//!
//! Each function takes care of rooting the Values it needs across its own
//! allocations. Values the caller holds elsewhere are stale once any of
//! these return; see [`Vm::allocate`].

use std::rc::Rc;

use object::{
    Block, Body, Class, ContextRef, Dictionary, HeapObject, Instance, Method,
    Value,
};

use crate::Vm;

/// Allocate a class with an empty method dictionary and register it as a
/// global under `name`.
pub fn alloc_class(
    vm: &mut Vm,
    name: &str,
    superclass: Value,
    ivar_names: &[&str],
) -> Value {
    vm.scratch.push(superclass);
    let methods = vm.allocate(HeapObject::new(
        vm.special.dictionary,
        Body::Dictionary(Dictionary::new()),
    ));
    let superclass = vm.scratch.pop().unwrap_or(Value::NIL);

    let inherited = match vm.heap.get(superclass).map(|o| &o.body) {
        Some(Body::Class(class)) => class.instance_size,
        _ => 0,
    };
    let class = vm.allocate(HeapObject::new(
        Value::NIL,
        Body::Class(Class {
            name: name.to_owned(),
            superclass,
            ivar_names: ivar_names.iter().map(|s| (*s).to_owned()).collect(),
            instance_size: inherited + ivar_names.len(),
            methods,
        }),
    ));
    vm.set_global(name, class);
    class
}

pub fn alloc_string(vm: &mut Vm, s: &str) -> Value {
    vm.allocate(HeapObject::new(vm.special.string, Body::String(s.to_owned())))
}

pub fn alloc_array(vm: &mut Vm, elements: Vec<Value>) -> Value {
    vm.allocate(HeapObject::new(vm.special.array, Body::Array(elements)))
}

pub fn alloc_byte_array(vm: &mut Vm, bytes: Vec<u8>) -> Value {
    vm.allocate(HeapObject::new(vm.special.byte_array, Body::ByteArray(bytes)))
}

/// Allocate an object of `class` the way `new`/`new:` does: indexable core
/// classes get `size` nil or zero elements, `Dictionary` starts empty and
/// everything else gets one nil slot per instance variable.
pub fn alloc_instance(vm: &mut Vm, class: Value, size: usize) -> Value {
    let special = vm.special;
    let body = if class == special.array {
        Body::Array(vec![Value::NIL; size])
    } else if class == special.byte_array {
        Body::ByteArray(vec![0; size])
    } else if class == special.string {
        Body::String(" ".repeat(size))
    } else if class == special.dictionary {
        Body::Dictionary(Dictionary::new())
    } else {
        let ivars = match vm.heap.get(class).map(|o| &o.body) {
            Some(Body::Class(c)) => c.instance_size,
            _ => 0,
        };
        Body::Instance(Instance::new(ivars))
    };
    vm.allocate(HeapObject::new(class, body))
}

pub fn alloc_block(
    vm: &mut Vm,
    bytecode: Rc<[u8]>,
    literals: Vec<Value>,
    temp_count: usize,
    outer: Option<ContextRef>,
) -> Value {
    vm.allocate(HeapObject::new(
        vm.special.block,
        Body::Block(Block {
            bytecode,
            literals,
            temp_count,
            outer,
        }),
    ))
}

/// Allocate a method. `selector` must already be an interned Symbol.
pub fn alloc_method(vm: &mut Vm, method: Method) -> Value {
    vm.allocate(HeapObject::new(vm.special.method, Body::Method(method)))
}

/// Install `method` under `selector` in `class`'s method dictionary.
///
/// # Panics
///
/// Panics if `class` is not a class or its dictionary is missing.
pub fn define_method(vm: &mut Vm, class: Value, selector: &str, method: Value) {
    let methods = match vm.body(class) {
        Body::Class(c) => c.methods,
        other => panic!("define_method: {} is not a class", other.type_name()),
    };
    match vm.body_mut(methods) {
        Body::Dictionary(dict) => {
            dict.insert(selector, method);
        }
        other => panic!(
            "define_method: corrupt method dictionary ({})",
            other.type_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;

    #[test]
    fn instance_size_includes_inherited_variables() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let object = vm.special.object;
        let point = alloc_class(&mut vm, "Point", object, &["x", "y"]);
        let point3 = alloc_class(&mut vm, "Point3D", point, &["z"]);

        let p = alloc_instance(&mut vm, point3, 0);
        let Body::Instance(instance) = vm.body(p) else {
            panic!("expected an instance");
        };
        assert_eq!(instance.ivars, vec![Value::NIL; 3]);
        assert_eq!(vm.global("Point3D"), Some(point3));
    }

    #[test]
    fn indexable_classes_get_sized_bodies() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let (array, bytes) = (vm.special.array, vm.special.byte_array);
        let a = alloc_instance(&mut vm, array, 3);
        let b = alloc_instance(&mut vm, bytes, 2);
        assert!(matches!(vm.body(a), Body::Array(e) if e.len() == 3));
        assert!(matches!(vm.body(b), Body::ByteArray(e) if e == &[0, 0]));
    }

    #[test]
    fn dictionary_new_is_an_empty_dictionary() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let dictionary = vm.special.dictionary;
        let d = vm.send(dictionary, "new", vec![]).unwrap();
        assert!(matches!(vm.body(d), Body::Dictionary(entries) if entries.is_empty()));
        assert_eq!(vm.print_string(d), "a Dictionary");
    }
}
