use object::{Body, Value, Visitor};

use crate::alloc::alloc_class;
use crate::builder::MethodBuilder;
use crate::{Vm, VmCreateInfo};

/// Well-known classes the engine needs for dispatch on immediates and for
/// creating objects of core types.
///
/// Every field is a GC root.
#[derive(Debug, Clone, Copy)]
pub struct SpecialClasses {
    pub object: Value,
    pub undefined_object: Value,
    pub true_class: Value,
    pub false_class: Value,
    pub integer: Value,
    pub float: Value,
    pub string: Value,
    pub symbol: Value,
    pub block: Value,
    pub array: Value,
    pub byte_array: Value,
    pub dictionary: Value,
    pub method: Value,
}

impl Default for SpecialClasses {
    fn default() -> Self {
        Self {
            object: Value::NIL,
            undefined_object: Value::NIL,
            true_class: Value::NIL,
            false_class: Value::NIL,
            integer: Value::NIL,
            float: Value::NIL,
            string: Value::NIL,
            symbol: Value::NIL,
            block: Value::NIL,
            array: Value::NIL,
            byte_array: Value::NIL,
            dictionary: Value::NIL,
            method: Value::NIL,
        }
    }
}

impl SpecialClasses {
    pub(crate) fn visit(&mut self, visitor: &mut dyn Visitor) {
        for v in [
            &mut self.object,
            &mut self.undefined_object,
            &mut self.true_class,
            &mut self.false_class,
            &mut self.integer,
            &mut self.float,
            &mut self.string,
            &mut self.symbol,
            &mut self.block,
            &mut self.array,
            &mut self.byte_array,
            &mut self.dictionary,
            &mut self.method,
        ] {
            visitor.visit_mut(v);
        }
    }
}

/// Primitive methods installed on the core classes:
/// `(class, selector, primitive index)`.
pub(crate) const PRIMITIVE_METHODS: &[(&str, &str, u16)] = &[
    ("Object", "basicClass", 5),
    ("Object", "new", 60),
    ("Object", "new:", 61),
    ("Integer", "+", 1),
    ("Integer", "*", 2),
    ("Integer", "=", 3),
    ("Integer", "-", 4),
    ("Integer", "<", 6),
    ("Integer", ">", 7),
    ("Float", "+", 10),
    ("Float", "-", 11),
    ("Float", "*", 12),
    ("Float", "/", 13),
    ("Float", "=", 14),
    ("Float", "<", 15),
    ("Float", ">", 16),
    ("Block", "new", 20),
    ("Block", "value", 21),
    ("Block", "value:", 22),
    ("String", "size", 30),
    ("String", ",", 31),
    ("Array", "at:", 40),
    ("Array", "at:put:", 41),
    ("Array", "size", 42),
    ("ByteArray", "at:", 50),
    ("ByteArray", "at:put:", 51),
    ("ByteArray", "size", 52),
];

/// Bootstrap a VM: create the core class hierarchy, register each class
/// as a global and install the core methods.
pub fn bootstrap(info: VmCreateInfo) -> Vm {
    let mut vm = Vm::new(info);

    let object = alloc_class(&mut vm, "Object", Value::NIL, &[]);
    vm.special.object = object;

    macro_rules! subclass {
        ($field:ident, $name:literal, $superclass:expr) => {{
            let superclass = $superclass;
            vm.special.$field = alloc_class(&mut vm, $name, superclass, &[]);
        }};
    }

    subclass!(undefined_object, "UndefinedObject", vm.special.object);
    subclass!(true_class, "True", vm.special.object);
    subclass!(false_class, "False", vm.special.object);
    subclass!(integer, "Integer", vm.special.object);
    subclass!(float, "Float", vm.special.object);
    subclass!(string, "String", vm.special.object);
    subclass!(symbol, "Symbol", vm.special.string);
    subclass!(block, "Block", vm.special.object);
    subclass!(array, "Array", vm.special.object);
    subclass!(byte_array, "ByteArray", vm.special.object);
    subclass!(dictionary, "Dictionary", vm.special.object);
    subclass!(method, "Method", vm.special.object);

    // Method dictionaries created before `Dictionary` existed.
    let dictionary = vm.special.dictionary;
    for (_, obj) in vm.heap.iter_mut() {
        if matches!(obj.body, Body::Dictionary(_)) && obj.header.class.is_nil() {
            obj.header.class = dictionary;
        }
    }

    for &(class, selector, primitive) in PRIMITIVE_METHODS {
        let Some(class) = vm.global(class) else {
            panic!("bootstrap: missing class {class}");
        };
        MethodBuilder::new(class, selector)
            .primitive(primitive)
            .install(&mut vm);
    }

    install_not(&mut vm, "True", Value::FALSE);
    install_not(&mut vm, "False", Value::TRUE);

    log::debug!(
        "bootstrap: {} classes, {} objects",
        vm.globals.len(),
        vm.heap.len()
    );
    vm
}

fn install_not(vm: &mut Vm, class: &str, answer: Value) {
    let Some(class) = vm.global(class) else {
        panic!("bootstrap: missing class {class}");
    };
    let mut builder = MethodBuilder::new(class, "not");
    let idx = builder.add_literal(answer);
    builder.code().push_literal(idx);
    builder.code().return_stack_top();
    builder.install(vm);
}
