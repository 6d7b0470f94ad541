pub mod alloc;
pub mod builder;
pub mod demo;
pub mod error;
pub mod image;
pub mod interpreter;
pub mod lookup;
pub mod primitives;
pub mod print;
pub mod special;

use std::collections::HashMap;

use heap::{Heap, HeapSettings, RootProvider};
use object::{Body, ContextRef, HeapObject, Value, Visitor};

pub use builder::{Literal, MethodBuilder};
pub use error::RuntimeError;
pub use image::{ImageError, ImageHeader};
pub use special::SpecialClasses;

pub type ValueMap = HashMap<String, Value, ahash::RandomState>;

/// Configuration for [`special::bootstrap`].
#[derive(Debug, Clone)]
pub struct VmCreateInfo {
    pub heap: HeapSettings,
    /// Maximum number of nested activations before a send fails with
    /// [`RuntimeError::StackDepthExceeded`].
    pub max_depth: usize,
}

impl Default for VmCreateInfo {
    fn default() -> Self {
        Self {
            heap: HeapSettings::default(),
            max_depth: 1000,
        }
    }
}

/// The VM owns the heap, the bootstrapped classes and every other GC root.
pub struct Vm {
    pub heap: Heap,
    pub special: SpecialClasses,
    /// Global variables by name. Bootstrap registers every core class.
    pub globals: ValueMap,
    /// Interned symbols: Rust string → heap Symbol.
    pub symbols: ValueMap,
    /// Values host code keeps alive across an allocation. Push before
    /// allocating and read back afterwards; the collector rewrites them.
    pub scratch: Vec<Value>,
    /// Innermost running context. Its sender chain is the whole stack.
    active: Option<ContextRef>,
    depth: usize,
    max_depth: usize,
}

/// Root set borrowed field-by-field from a [`Vm`] so the heap can be
/// borrowed mutably alongside it.
pub(crate) struct VmRoots<'a> {
    special: &'a mut SpecialClasses,
    globals: &'a mut ValueMap,
    symbols: &'a mut ValueMap,
    scratch: &'a mut Vec<Value>,
    active: &'a Option<ContextRef>,
}

impl RootProvider for VmRoots<'_> {
    fn visit_roots(&mut self, visitor: &mut dyn Visitor) {
        self.special.visit(visitor);
        for v in self.globals.values_mut() {
            visitor.visit_mut(v);
        }
        for v in self.symbols.values_mut() {
            visitor.visit_mut(v);
        }
        for v in self.scratch.iter_mut() {
            visitor.visit_mut(v);
        }
        if let Some(ctx) = self.active {
            visitor.visit_context(ctx);
        }
    }
}

impl Vm {
    fn new(info: VmCreateInfo) -> Self {
        Self {
            heap: Heap::new(info.heap),
            special: SpecialClasses::default(),
            globals: ValueMap::default(),
            symbols: ValueMap::default(),
            scratch: Vec::new(),
            active: None,
            depth: 0,
            max_depth: info.max_depth,
        }
    }

    // ── heap ───────────────────────────────────────────────────────

    fn split_roots(&mut self) -> (&mut Heap, VmRoots<'_>) {
        let Self {
            heap,
            special,
            globals,
            symbols,
            scratch,
            active,
            ..
        } = self;
        (
            heap,
            VmRoots {
                special,
                globals,
                symbols,
                scratch,
                active,
            },
        )
    }

    /// Allocate `object`. May collect first; every Value the caller holds
    /// outside a root, the scratch stack or `object` itself is stale
    /// afterwards.
    pub fn allocate(&mut self, object: HeapObject) -> Value {
        let (heap, mut roots) = self.split_roots();
        heap.allocate(object, &mut roots)
    }

    /// Force a full collection cycle.
    pub fn collect_garbage(&mut self) {
        let (heap, mut roots) = self.split_roots();
        heap.collect(&mut roots);
    }

    /// # Panics
    ///
    /// Panics if `value` is not a live heap reference.
    pub fn body(&self, value: Value) -> &Body {
        match self.heap.get(value) {
            Some(obj) => &obj.body,
            None => panic!("not a heap object: {value:?}"),
        }
    }

    /// # Panics
    ///
    /// Panics if `value` is not a live heap reference.
    pub fn body_mut(&mut self, value: Value) -> &mut Body {
        match self.heap.get_mut(value) {
            Some(obj) => &mut obj.body,
            None => panic!("not a heap object: {value:?}"),
        }
    }

    // ── activations ────────────────────────────────────────────────

    pub fn active_context(&self) -> Option<&ContextRef> {
        self.active.as_ref()
    }

    /// Make `ctx` the innermost activation for the duration of `f`.
    pub(crate) fn with_active<R>(
        &mut self,
        ctx: ContextRef,
        f: impl FnOnce(&mut Vm) -> Result<R, RuntimeError>,
    ) -> Result<R, RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::StackDepthExceeded {
                limit: self.max_depth,
            });
        }
        let previous = self.active.replace(ctx);
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        self.active = previous;
        result
    }

    // ── symbols and globals ────────────────────────────────────────

    /// Return the unique Symbol for `name`, allocating it on first use.
    pub fn intern(&mut self, name: &str) -> Value {
        if let Some(sym) = self.symbols.get(name) {
            return *sym;
        }
        let sym = self.allocate(HeapObject::new(
            self.special.symbol,
            Body::Symbol(name.to_owned()),
        ));
        self.symbols.insert(name.to_owned(), sym);
        sym
    }

    pub fn symbol_name(&self, value: Value) -> Option<&str> {
        match self.heap.get(value).map(|o| &o.body) {
            Some(Body::Symbol(name)) => Some(name),
            _ => None,
        }
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    // ── entry points ───────────────────────────────────────────────

    /// Run `method` with `receiver` and `args` in a fresh root context.
    pub fn execute_method(
        &mut self,
        method: Value,
        receiver: Value,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        interpreter::execute_method(self, method, receiver, args)
    }

    /// Send `selector` to `receiver` the way `SEND_MESSAGE` does.
    pub fn send(
        &mut self,
        receiver: Value,
        selector: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        interpreter::send_message(self, receiver, selector, args)
    }

    /// Build `builder` as an unattached method and run it with nil as the
    /// receiver.
    pub fn evaluate(
        &mut self,
        builder: MethodBuilder,
    ) -> Result<Value, RuntimeError> {
        let method = builder.build(self);
        self.execute_method(method, Value::NIL, Vec::new())
    }
}
