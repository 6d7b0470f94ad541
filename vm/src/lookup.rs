use object::{Body, Value, ValueKind};

use crate::Vm;

/// The class a message to `value` dispatches on.
///
/// Immediates map to their special classes and class objects answer
/// themselves.
///
/// # Panics
///
/// Panics on a heap object with no class, which is a broken invariant.
pub fn class_of(vm: &Vm, value: Value) -> Value {
    let special = &vm.special;
    match value.kind() {
        ValueKind::SmallInteger(_) => special.integer,
        ValueKind::Float(_) => special.float,
        ValueKind::Nil => special.undefined_object,
        ValueKind::True => special.true_class,
        ValueKind::False => special.false_class,
        ValueKind::Pointer(_) => {
            let Some(obj) = vm.heap.get(value) else {
                panic!("class_of: dangling reference {value:?}");
            };
            if matches!(obj.body, Body::Class(_)) {
                return value;
            }
            if obj.header.class.is_nil() {
                panic!(
                    "class_of: {} object {value:?} has no class",
                    obj.body.type_name()
                );
            }
            obj.header.class
        }
    }
}

/// Name of `class`, or `"?"` if it is not a class object.
pub fn class_name(vm: &Vm, class: Value) -> &str {
    match vm.heap.get(class).map(|o| &o.body) {
        Some(Body::Class(c)) => &c.name,
        _ => "?",
    }
}

/// Find the method for `selector` starting at `class` and walking up the
/// superclass chain. The first match wins.
///
/// # Panics
///
/// Panics if a class in the chain has no method dictionary.
pub fn lookup_method(vm: &Vm, class: Value, selector: &str) -> Option<Value> {
    let mut current = class;
    while let Some(Body::Class(c)) = vm.heap.get(current).map(|o| &o.body) {
        match vm.body(c.methods) {
            Body::Dictionary(methods) => {
                if let Some(method) = methods.get(selector) {
                    return Some(method);
                }
            }
            other => panic!(
                "lookup: {} has a corrupt method dictionary ({})",
                c.name,
                other.type_name()
            ),
        }
        current = c.superclass;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{alloc_class, alloc_instance};
    use crate::builder::MethodBuilder;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;

    #[test]
    fn subclass_method_shadows_ancestor() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let object = vm.special.object;
        let animal = alloc_class(&mut vm, "Animal", object, &[]);
        alloc_class(&mut vm, "Dog", animal, &[]);

        let animal = vm.global("Animal").unwrap();
        let mut b = MethodBuilder::new(animal, "sound");
        b.push(1);
        b.code().return_stack_top();
        let generic = b.install(&mut vm);

        let dog = vm.global("Dog").unwrap();
        assert_eq!(lookup_method(&vm, dog, "sound"), Some(generic));

        let mut b = MethodBuilder::new(dog, "sound");
        b.push(2);
        b.code().return_stack_top();
        let specific = b.install(&mut vm);

        let (animal, dog) = (vm.global("Animal").unwrap(), vm.global("Dog").unwrap());
        assert_eq!(lookup_method(&vm, dog, "sound"), Some(specific));
        assert_eq!(lookup_method(&vm, animal, "sound"), Some(generic));
        assert_eq!(lookup_method(&vm, animal, "bark"), None);
    }

    #[test]
    fn instances_and_classes_dispatch_differently() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let object = vm.special.object;
        let point = alloc_class(&mut vm, "Point", object, &["x"]);
        let p = alloc_instance(&mut vm, point, 0);
        let point = vm.global("Point").unwrap();
        assert_eq!(class_of(&vm, p), point);
        assert_eq!(class_of(&vm, point), point);
        assert_eq!(class_name(&vm, point), "Point");
        assert_eq!(class_name(&vm, Value::from_i64(1)), "?");
    }

    #[test]
    fn immediates_dispatch_on_special_classes() {
        let vm = bootstrap(VmCreateInfo::default());
        let special = vm.special;
        assert_eq!(class_of(&vm, Value::from_i64(-3)), special.integer);
        assert_eq!(class_of(&vm, Value::make_float(1.5)), special.float);
        assert_eq!(class_of(&vm, Value::NIL), special.undefined_object);
        assert_eq!(class_of(&vm, Value::TRUE), special.true_class);
        assert_eq!(class_of(&vm, Value::FALSE), special.false_class);
        assert_eq!(class_of(&vm, special.string), special.string);
    }
}
