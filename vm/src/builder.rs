use bytecode::BytecodeBuilder;
use object::{Body, Method, Value};

use crate::alloc::{alloc_method, alloc_string, define_method};
use crate::Vm;

/// A literal table entry before it is materialized on the heap.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Value(Value),
    /// Interned on build.
    Symbol(String),
    /// A fresh String per build.
    String(String),
}

impl From<Value> for Literal {
    fn from(value: Value) -> Self {
        Literal::Value(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Value(Value::from_i64(value))
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Value(Value::from_i64(value.into()))
    }
}

/// Assembles a method: literal table, temporaries, bytecode and an
/// optional primitive index.
///
/// Nothing touches the heap until [`build`](Self::build), so a builder can
/// be filled in without worrying about collections moving its literals.
#[derive(Debug)]
pub struct MethodBuilder {
    class: Value,
    selector: String,
    literals: Vec<Literal>,
    temp_names: Vec<String>,
    primitive: Option<u16>,
    code: BytecodeBuilder,
}

impl MethodBuilder {
    pub fn new(class: Value, selector: &str) -> Self {
        Self {
            class,
            selector: selector.to_owned(),
            literals: Vec::new(),
            temp_names: Vec::new(),
            primitive: None,
            code: BytecodeBuilder::new(),
        }
    }

    pub fn primitive(mut self, index: u16) -> Self {
        self.primitive = Some(index);
        self
    }

    /// Name the temporaries. Arguments occupy the leading slots, so a
    /// method with arguments lists them first.
    pub fn temps(mut self, names: &[&str]) -> Self {
        self.temp_names = names.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Append a literal and return its index. Equal literals are shared.
    pub fn add_literal(&mut self, literal: impl Into<Literal>) -> u32 {
        let literal = literal.into();
        if let Some(idx) = self.literals.iter().position(|l| *l == literal) {
            return idx as u32;
        }
        self.literals.push(literal);
        (self.literals.len() - 1) as u32
    }

    pub fn add_symbol(&mut self, name: &str) -> u32 {
        self.add_literal(Literal::Symbol(name.to_owned()))
    }

    pub fn code(&mut self) -> &mut BytecodeBuilder {
        &mut self.code
    }

    /// Emit `SEND_MESSAGE` for `selector`, adding the symbol literal.
    pub fn send(&mut self, selector: &str, argc: u32) {
        let idx = self.add_symbol(selector);
        self.code.send_message(idx, argc);
    }

    /// Emit `PUSH_LITERAL` for `literal`, adding it to the table.
    pub fn push(&mut self, literal: impl Into<Literal>) {
        let idx = self.add_literal(literal);
        self.code.push_literal(idx);
    }

    /// Materialize the literals and allocate the method object.
    pub fn build(self, vm: &mut Vm) -> Value {
        let mark = vm.scratch.len();
        vm.scratch.push(self.class);
        // Root every literal Value before the first allocation.
        for literal in &self.literals {
            let value = match literal {
                Literal::Value(v) => *v,
                _ => Value::NIL,
            };
            vm.scratch.push(value);
        }
        for (i, literal) in self.literals.iter().enumerate() {
            let value = match literal {
                Literal::Value(_) => continue,
                Literal::Symbol(name) => vm.intern(name),
                Literal::String(s) => alloc_string(vm, s),
            };
            vm.scratch[mark + 1 + i] = value;
        }
        let selector = vm.intern(&self.selector);

        let class = vm.scratch[mark];
        let literals = vm.scratch[mark + 1..].to_vec();
        let method = alloc_method(
            vm,
            Method {
                selector,
                bytecode: self.code.into_bytes().into(),
                literals,
                temp_names: self.temp_names,
                class,
                primitive: self.primitive,
            },
        );
        vm.scratch.truncate(mark);
        method
    }

    /// Build and add the method to its class's method dictionary.
    pub fn install(self, vm: &mut Vm) -> Value {
        let selector = self.selector.clone();
        let method = self.build(vm);
        let class = match vm.body(method) {
            Body::Method(m) => m.class,
            _ => unreachable!("build returns a method"),
        };
        define_method(vm, class, &selector, method);
        log::trace!("installed {}>>{}", crate::lookup::class_name(vm, class), selector);
        method
    }
}
