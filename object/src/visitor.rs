use crate::context::ContextRef;
use crate::Value;

/// Walks the direct edges of an object or activation record.
pub trait Visitable {
    fn visit_edges(&self, visitor: &mut dyn FnMut(Value));
    fn visit_edges_mut(&mut self, visitor: &mut dyn Visitor);
}

/// Receives edges. Values are passed by reference so a copying
/// collector can rewrite them in place.
pub trait Visitor {
    fn visit_mut(&mut self, value: &mut Value);

    /// Contexts live outside the heap. Visiting one does not traverse it;
    /// the visitor decides whether and when to walk its edges.
    fn visit_context(&mut self, context: &ContextRef) {
        let _ = context;
    }
}

impl<F: FnMut(&mut Value)> Visitor for F {
    fn visit_mut(&mut self, value: &mut Value) {
        self(value)
    }
}
