//! Hand-assembled programs run by the CLI.

use object::Value;

use crate::builder::MethodBuilder;
use crate::error::RuntimeError;
use crate::Vm;

/// Install `Integer>>factorial`:
///
/// ```text
/// factorial
///     ^ self = 1 ifTrue: [1] ifFalse: [self * (self - 1) factorial]
/// ```
///
/// with both branches inlined as jumps.
pub fn install_factorial(vm: &mut Vm) -> Value {
    let mut m = MethodBuilder::new(vm.special.integer, "factorial");
    let one = m.add_literal(1);

    m.code().push_self();
    m.code().push_literal(one);
    m.send("=", 1);
    m.code().duplicate();
    let recurse = m.code().jump_if_false();
    m.code().pop();
    m.code().push_literal(one);
    let done = m.code().jump();

    m.code().bind(recurse);
    m.code().pop();
    m.code().push_self();
    m.code().push_self();
    m.code().push_literal(one);
    m.send("-", 1);
    m.send("factorial", 0);
    m.send("*", 1);

    m.code().bind(done);
    m.code().return_stack_top();
    m.install(vm)
}

/// The doit run after an image header is loaded: `2 + 3`.
pub fn boot_doit(vm: &Vm) -> MethodBuilder {
    let mut m = MethodBuilder::new(vm.special.object, "doit");
    m.push(2);
    m.push(3);
    m.send("+", 1);
    m.code().return_stack_top();
    m
}

/// `10 factorial`.
pub fn run_factorial_demo(vm: &mut Vm) -> Result<Value, RuntimeError> {
    install_factorial(vm);
    vm.send(Value::from_i64(10), "factorial", Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::special::bootstrap;
    use crate::VmCreateInfo;

    #[test]
    fn boot_doit_answers_five() {
        let mut vm = bootstrap(VmCreateInfo::default());
        let doit = boot_doit(&vm);
        assert_eq!(vm.evaluate(doit), Ok(Value::from_i64(5)));
    }

    #[test]
    fn ten_factorial() {
        let mut vm = bootstrap(VmCreateInfo::default());
        assert_eq!(run_factorial_demo(&mut vm), Ok(Value::from_i64(3_628_800)));
    }
}
