use std::cell::RefCell;
use std::rc::Rc;

use crate::visitor::{Visitable, Visitor};
use crate::Value;

pub type ContextRef = Rc<RefCell<Context>>;

/// Activation record of one method or block invocation.
///
/// `sender` is the dynamic link (who called this activation) and `outer`
/// the lexical one (the context that was running when the block being
/// executed was created). Method contexts have no `outer`.
///
/// Contexts are not heap objects. The collector reaches them through the
/// active chain and through blocks, and rewrites their values in place.
#[derive(Debug)]
pub struct Context {
    /// The Method or Block whose code runs here.
    pub method: Value,
    pub receiver: Value,
    pub args: Vec<Value>,
    pub temps: Vec<Value>,
    pub stack: Vec<Value>,
    pub pc: usize,
    pub sender: Option<ContextRef>,
    pub outer: Option<ContextRef>,
    gc_epoch: u64,
}

impl Context {
    /// Create a context with `temp_count` temporaries. The leading
    /// temporaries are initialised from `args`, the rest are nil.
    pub fn new(
        method: Value,
        receiver: Value,
        args: Vec<Value>,
        temp_count: usize,
        sender: Option<ContextRef>,
        outer: Option<ContextRef>,
    ) -> Self {
        let mut temps = vec![Value::NIL; temp_count.max(args.len())];
        temps[..args.len()].copy_from_slice(&args);
        Self {
            method,
            receiver,
            args,
            temps,
            stack: Vec::with_capacity(8),
            pc: 0,
            sender,
            outer,
            gc_epoch: 0,
        }
    }

    pub fn into_ref(self) -> ContextRef {
        Rc::new(RefCell::new(self))
    }

    // ── operand stack ──────────────────────────────────────────────

    #[inline(always)]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// # Panics
    ///
    /// Panics on an empty stack. A well-formed method never pops more
    /// than it pushed.
    #[inline(always)]
    pub fn pop(&mut self) -> Value {
        match self.stack.pop() {
            Some(v) => v,
            None => panic!("stack underflow at pc {}", self.pc),
        }
    }

    /// # Panics
    ///
    /// Panics on an empty stack.
    #[inline(always)]
    pub fn top(&self) -> Value {
        match self.stack.last() {
            Some(v) => *v,
            None => panic!("stack underflow at pc {}", self.pc),
        }
    }

    /// Pop `count` values, first-pushed first.
    pub fn pop_n(&mut self, count: usize) -> Vec<Value> {
        if count > self.stack.len() {
            panic!(
                "stack underflow at pc {}: need {count}, have {}",
                self.pc,
                self.stack.len()
            );
        }
        let at = self.stack.len() - count;
        self.stack.split_off(at)
    }

    // ── collector support ──────────────────────────────────────────

    /// Record that the collector reached this context in cycle `epoch`.
    /// Returns `false` if it was already reached in that cycle.
    pub fn mark(&mut self, epoch: u64) -> bool {
        if self.gc_epoch == epoch {
            return false;
        }
        self.gc_epoch = epoch;
        true
    }
}

impl Visitable for Context {
    fn visit_edges(&self, visitor: &mut dyn FnMut(Value)) {
        visitor(self.method);
        visitor(self.receiver);
        self.args.iter().copied().for_each(&mut *visitor);
        self.temps.iter().copied().for_each(&mut *visitor);
        self.stack.iter().copied().for_each(&mut *visitor);
    }

    fn visit_edges_mut(&mut self, visitor: &mut dyn Visitor) {
        visitor.visit_mut(&mut self.method);
        visitor.visit_mut(&mut self.receiver);
        for v in self
            .args
            .iter_mut()
            .chain(self.temps.iter_mut())
            .chain(self.stack.iter_mut())
        {
            visitor.visit_mut(v);
        }
        if let Some(sender) = &self.sender {
            visitor.visit_context(sender);
        }
        if let Some(outer) = &self.outer {
            visitor.visit_context(outer);
        }
    }
}
