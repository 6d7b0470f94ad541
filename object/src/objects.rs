use std::collections::HashMap;
use std::rc::Rc;

use crate::context::ContextRef;
use crate::header::Header;
use crate::visitor::{Visitable, Visitor};
use crate::Value;

/// A heap object: header plus variant payload.
#[derive(Debug)]
pub struct HeapObject {
    pub header: Header,
    pub body: Body,
}

impl HeapObject {
    pub fn new(class: Value, body: Body) -> Self {
        Self {
            header: Header::new(class),
            body,
        }
    }
}

#[derive(Debug, Default)]
pub enum Body {
    Instance(Instance),
    Class(Class),
    Method(Method),
    Block(Block),
    Array(Vec<Value>),
    ByteArray(Vec<u8>),
    Dictionary(Dictionary),
    String(String),
    Symbol(String),
    /// Left behind in from-space once the payload has been copied out.
    #[default]
    Forwarded,
}

impl Body {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Body::Instance(_) => "Instance",
            Body::Class(_) => "Class",
            Body::Method(_) => "Method",
            Body::Block(_) => "Block",
            Body::Array(_) => "Array",
            Body::ByteArray(_) => "ByteArray",
            Body::Dictionary(_) => "Dictionary",
            Body::String(_) => "String",
            Body::Symbol(_) => "Symbol",
            Body::Forwarded => "Forwarded",
        }
    }
}

// ── Instance ───────────────────────────────────────────────────────

/// An ordinary object: one slot per instance-variable name of its class
/// chain, superclass variables first.
#[derive(Debug, Clone)]
pub struct Instance {
    pub ivars: Vec<Value>,
}

impl Instance {
    pub fn new(ivar_count: usize) -> Self {
        Self {
            ivars: vec![Value::NIL; ivar_count],
        }
    }
}

// ── Class ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    /// Nil for the root class.
    pub superclass: Value,
    /// Names declared by this class only.
    pub ivar_names: Vec<String>,
    /// Total instance size including inherited variables.
    pub instance_size: usize,
    /// A [`Body::Dictionary`] mapping selector names to methods.
    pub methods: Value,
}

// ── Method ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Method {
    /// A [`Body::Symbol`].
    pub selector: Value,
    pub bytecode: Rc<[u8]>,
    pub literals: Vec<Value>,
    /// Parameters first, then declared temporaries.
    pub temp_names: Vec<String>,
    pub class: Value,
    pub primitive: Option<u16>,
}

// ── Block ──────────────────────────────────────────────────────────

/// A closure. `outer` is the context that executed `CREATE_BLOCK`.
#[derive(Debug, Clone)]
pub struct Block {
    pub bytecode: Rc<[u8]>,
    pub literals: Vec<Value>,
    /// Parameters first, then block-local temporaries.
    pub temp_count: usize,
    pub outer: Option<ContextRef>,
}

// ── Dictionary ─────────────────────────────────────────────────────

/// Selector name to value mapping. Keys are unique; iteration order is
/// unspecified.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<String, Value, ahash::RandomState>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.values_mut()
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.entries.values().copied()
    }
}

// ── Edges ──────────────────────────────────────────────────────────

impl Visitable for Body {
    fn visit_edges(&self, visitor: &mut dyn FnMut(Value)) {
        match self {
            Body::Instance(instance) => {
                instance.ivars.iter().copied().for_each(&mut *visitor)
            }
            Body::Class(class) => {
                visitor(class.superclass);
                visitor(class.methods);
            }
            Body::Method(method) => {
                visitor(method.selector);
                visitor(method.class);
                method.literals.iter().copied().for_each(&mut *visitor);
            }
            Body::Block(block) => {
                block.literals.iter().copied().for_each(&mut *visitor)
            }
            Body::Array(elements) => {
                elements.iter().copied().for_each(&mut *visitor)
            }
            Body::Dictionary(dict) => dict.values().for_each(&mut *visitor),
            Body::ByteArray(_)
            | Body::String(_)
            | Body::Symbol(_)
            | Body::Forwarded => {}
        }
    }

    fn visit_edges_mut(&mut self, visitor: &mut dyn Visitor) {
        match self {
            Body::Instance(instance) => {
                instance.ivars.iter_mut().for_each(|v| visitor.visit_mut(v))
            }
            Body::Class(class) => {
                visitor.visit_mut(&mut class.superclass);
                visitor.visit_mut(&mut class.methods);
            }
            Body::Method(method) => {
                visitor.visit_mut(&mut method.selector);
                visitor.visit_mut(&mut method.class);
                method.literals.iter_mut().for_each(|v| visitor.visit_mut(v));
            }
            Body::Block(block) => {
                block.literals.iter_mut().for_each(|v| visitor.visit_mut(v));
                if let Some(outer) = &block.outer {
                    visitor.visit_context(outer);
                }
            }
            Body::Array(elements) => {
                elements.iter_mut().for_each(|v| visitor.visit_mut(v))
            }
            Body::Dictionary(dict) => {
                dict.values_mut().for_each(|v| visitor.visit_mut(v))
            }
            Body::ByteArray(_)
            | Body::String(_)
            | Body::Symbol(_)
            | Body::Forwarded => {}
        }
    }
}

impl Visitable for HeapObject {
    fn visit_edges(&self, visitor: &mut dyn FnMut(Value)) {
        visitor(self.header.class);
        self.body.visit_edges(visitor);
    }

    fn visit_edges_mut(&mut self, visitor: &mut dyn Visitor) {
        visitor.visit_mut(&mut self.header.class);
        self.body.visit_edges_mut(visitor);
    }
}
