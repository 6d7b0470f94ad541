mod value;
mod header;
mod objects;
mod context;
mod visitor;

pub use value::{HeapRef, INTEGER_MAX, INTEGER_MIN, Tag, Value, ValueError, ValueKind};
pub use header::{Header, HeaderFlags};
pub use objects::{
    Body, HeapObject,
    Instance, Class, Method, Block, Dictionary,
};
pub use context::{Context, ContextRef};
pub use visitor::{Visitable, Visitor};

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn ptr(index: usize) -> Value {
        Value::from_heap_ref(HeapRef::new(index))
    }

    fn edges(visitable: &impl Visitable) -> Vec<Value> {
        let mut out = Vec::new();
        visitable.visit_edges(&mut |v| out.push(v));
        out
    }

    // ── Header ─────────────────────────────────────────────────────

    #[test]
    fn header_flags() {
        let mut h = Header::new(Value::NIL);
        assert!(!h.is_moved());
        assert_eq!(h.forward(), None);

        h.set_forward(HeapRef::new(3));
        assert!(h.has_flag(HeaderFlags::MOVED));
        assert_eq!(h.forward(), Some(HeapRef::new(3)));

        h.clear_moved();
        assert!(!h.is_moved());
        assert_eq!(h.forward(), None);
    }

    #[test]
    fn survivor_header_ages() {
        let mut h = Header::new(ptr(1));
        h.set_age(4);
        let copy = h.survivor();
        assert_eq!(copy.class, ptr(1));
        assert_eq!(copy.age(), 5);
        assert!(copy.is_moved());
        assert_eq!(copy.forward(), None);

        h.set_age(u8::MAX);
        assert_eq!(h.survivor().age(), u8::MAX);
    }

    // ── Edges ──────────────────────────────────────────────────────

    #[test]
    fn class_edges() {
        let obj = HeapObject::new(
            ptr(0),
            Body::Class(Class {
                name: "Point".into(),
                superclass: ptr(1),
                ivar_names: vec!["x".into(), "y".into()],
                instance_size: 2,
                methods: ptr(2),
            }),
        );
        assert_eq!(edges(&obj), vec![ptr(0), ptr(1), ptr(2)]);
    }

    #[test]
    fn method_edges_include_literals() {
        let body = Body::Method(Method {
            selector: ptr(5),
            bytecode: Rc::from(&[][..]),
            literals: vec![Value::from_i64(1), ptr(6)],
            temp_names: vec![],
            class: ptr(7),
            primitive: None,
        });
        assert_eq!(edges(&body), vec![ptr(5), ptr(7), Value::from_i64(1), ptr(6)]);
    }

    #[test]
    fn visit_edges_mut_rewrites_in_place() {
        let mut body = Body::Array(vec![ptr(1), Value::from_i64(9), ptr(2)]);
        body.visit_edges_mut(&mut |v: &mut Value| {
            if let Some(r) = v.heap_ref() {
                *v = ptr(r.index() + 10);
            }
        });
        let Body::Array(elements) = body else {
            unreachable!()
        };
        assert_eq!(elements, vec![ptr(11), Value::from_i64(9), ptr(12)]);
    }

    #[test]
    fn leaf_bodies_have_no_edges() {
        assert!(edges(&Body::String("abc".into())).is_empty());
        assert!(edges(&Body::Symbol("abc".into())).is_empty());
        assert!(edges(&Body::ByteArray(vec![1, 2, 3])).is_empty());
    }

    #[test]
    fn block_reports_outer_context() {
        struct Count(usize);
        impl Visitor for Count {
            fn visit_mut(&mut self, _: &mut Value) {}
            fn visit_context(&mut self, _: &ContextRef) {
                self.0 += 1;
            }
        }

        let outer = Context::new(Value::NIL, Value::NIL, vec![], 0, None, None).into_ref();
        let mut body = Body::Block(Block {
            bytecode: Rc::from(&[][..]),
            literals: vec![],
            temp_count: 0,
            outer: Some(outer),
        });
        let mut count = Count(0);
        body.visit_edges_mut(&mut count);
        assert_eq!(count.0, 1);
    }

    // ── Dictionary ─────────────────────────────────────────────────

    #[test]
    fn dictionary_keys_are_unique() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.insert("foo", ptr(1)), None);
        assert_eq!(dict.insert("foo", ptr(2)), Some(ptr(1)));
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("foo"), Some(ptr(2)));
        assert!(!dict.contains("bar"));
    }
}
