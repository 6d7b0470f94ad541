//! Stop-and-copy semispace collector.
//!
//! Objects live in a `Vec` (from-space) and are addressed by index. A
//! collection copies every object reachable from the roots into a fresh
//! to-space, leaving a forwarding index and the `MOVED` flag on each
//! original so shared references and cycles resolve to a single copy.
//! A breadth-first scan over to-space then rewrites the copied objects'
//! fields.
//!
//! This crate knows nothing about the interpreter. Consumers provide a
//! [`RootProvider`] that hands every root [`Value`] and live
//! [`Context`](object::Context) to the collector's [`Visitor`].

use std::mem;

use object::{ContextRef, HeapObject, HeapRef, Value, Visitable, Visitor};

// ── Public API types ──────────────────────────────────────────────────

/// Consumers implement this to provide GC roots.
///
/// The visitor receives `&mut Value` so root slots can be rewritten to
/// point into to-space. Contexts passed to
/// [`Visitor::visit_context`] are traced along their `sender` and `outer`
/// links.
pub trait RootProvider {
    fn visit_roots(&mut self, visitor: &mut dyn Visitor);
}

/// Root provider with no roots. Everything but the object being
/// allocated is garbage.
pub struct NoRoots;

impl RootProvider for NoRoots {
    fn visit_roots(&mut self, _visitor: &mut dyn Visitor) {}
}

// ── Heap settings ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HeapSettings {
    /// Object slots per space at start-up.
    pub initial_capacity: usize,
    /// Occupied fraction (0.0 - 1.0) of from-space that triggers a
    /// collection before the next allocation.
    pub collect_threshold: f64,
    /// Live fraction (0.0 - 1.0) after a collection above which both
    /// spaces grow.
    pub grow_threshold: f64,
    /// Capacity multiplier applied on growth.
    pub growth_factor: usize,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            initial_capacity: 10_000,
            collect_threshold: 0.8,
            grow_threshold: 0.7,
            growth_factor: 2,
        }
    }
}

impl HeapSettings {
    #[inline]
    fn validate(&self) -> Result<(), &'static str> {
        if self.initial_capacity == 0 {
            return Err("initial_capacity must be > 0");
        }
        if !(0.0..=1.0).contains(&self.collect_threshold)
            || !(0.0..=1.0).contains(&self.grow_threshold)
        {
            return Err("Fractions must be between 0.0 and 1.0");
        }
        if self.growth_factor < 2 {
            return Err("growth_factor must be >= 2");
        }
        Ok(())
    }
}

// ── Heap ──────────────────────────────────────────────────────────────

pub struct Heap {
    space: Vec<HeapObject>,
    capacity: usize,
    settings: HeapSettings,
    collections: u64,
}

impl Heap {
    pub fn new(settings: HeapSettings) -> Self {
        settings.validate().expect("Invalid Heap Settings");
        Self {
            space: Vec::with_capacity(settings.initial_capacity),
            capacity: settings.initial_capacity,
            settings,
            collections: 0,
        }
    }

    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    /// Objects currently in from-space.
    #[inline]
    pub fn len(&self) -> usize {
        self.space.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.space.is_empty()
    }

    /// Slots per space.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Completed collection cycles.
    #[inline]
    pub fn collections(&self) -> u64 {
        self.collections
    }

    #[inline]
    pub fn should_collect(&self) -> bool {
        self.space.len() as f64
            >= self.capacity as f64 * self.settings.collect_threshold
    }

    // ── access ─────────────────────────────────────────────────────

    #[inline]
    pub fn get(&self, value: Value) -> Option<&HeapObject> {
        value.heap_ref().and_then(|r| self.space.get(r.index()))
    }

    #[inline]
    pub fn get_mut(&mut self, value: Value) -> Option<&mut HeapObject> {
        value.heap_ref().and_then(|r| self.space.get_mut(r.index()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Value, &HeapObject)> {
        self.space
            .iter()
            .enumerate()
            .map(|(i, obj)| (Value::from_heap_ref(HeapRef::new(i)), obj))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Value, &mut HeapObject)> {
        self.space
            .iter_mut()
            .enumerate()
            .map(|(i, obj)| (Value::from_heap_ref(HeapRef::new(i)), obj))
    }

    // ── allocation ─────────────────────────────────────────────────

    /// Place `object` in from-space, collecting first if occupancy has
    /// reached the threshold. Values inside `object` are treated as roots
    /// for that collection and rewritten along with them.
    pub fn allocate(
        &mut self,
        mut object: HeapObject,
        roots: &mut dyn RootProvider,
    ) -> Value {
        if self.should_collect() {
            self.collect_with(roots, Some(&mut object));
        }
        let r = HeapRef::new(self.space.len());
        self.space.push(object);
        Value::from_heap_ref(r)
    }

    /// Run a full collection cycle.
    pub fn collect(&mut self, roots: &mut dyn RootProvider) {
        self.collect_with(roots, None);
    }

    fn collect_with(
        &mut self,
        roots: &mut dyn RootProvider,
        pending: Option<&mut HeapObject>,
    ) {
        self.collections += 1;
        let before = self.space.len();

        for obj in self.space.iter_mut() {
            obj.header.clear_moved();
        }

        let mut copier = Copier {
            from: &mut self.space,
            to: Vec::with_capacity(self.capacity),
            contexts: Vec::new(),
            epoch: self.collections,
        };

        roots.visit_roots(&mut copier);
        if let Some(obj) = pending {
            obj.visit_edges_mut(&mut copier);
        }
        copier.scan();

        let to = copier.to;
        let live = to.len();
        self.space = to;

        if live as f64 > self.capacity as f64 * self.settings.grow_threshold {
            let grown = self.capacity * self.settings.growth_factor;
            log::debug!("gc: growing spaces {} -> {grown}", self.capacity);
            self.capacity = grown;
            self.space.reserve(grown - live);
        }

        log::debug!(
            "gc #{}: {before} -> {live} objects, capacity {}",
            self.collections,
            self.capacity
        );
    }

    /// Check that every pointer edge reachable from a heap object lands
    /// inside from-space on a live object.
    ///
    /// # Panics
    ///
    /// Panics on the first dangling edge.
    pub fn verify(&self) {
        let len = self.space.len();
        for (value, obj) in self.iter() {
            assert!(
                !matches!(obj.body, object::Body::Forwarded),
                "{value:?} is a forwarding husk"
            );
            obj.visit_edges(&mut |edge| {
                if let Some(r) = edge.heap_ref() {
                    assert!(r.index() < len, "{value:?} has dangling edge {edge:?}");
                }
            });
        }
    }
}

// ── Copying ───────────────────────────────────────────────────────────

struct Copier<'a> {
    from: &'a mut [HeapObject],
    to: Vec<HeapObject>,
    /// Contexts reached but not yet traced.
    contexts: Vec<ContextRef>,
    epoch: u64,
}

impl Copier<'_> {
    /// Copy the referent of `value` to to-space once and return its new
    /// address. Immediates are returned unchanged.
    fn forward(&mut self, value: Value) -> Value {
        let Some(r) = value.heap_ref() else {
            return value;
        };
        let Some(obj) = self.from.get_mut(r.index()) else {
            panic!("gc: dangling reference {value:?}");
        };
        if let Some(to) = obj.header.forward() {
            return Value::from_heap_ref(to);
        }

        let to = HeapRef::new(self.to.len());
        let copy = HeapObject {
            header: obj.header.survivor(),
            body: mem::take(&mut obj.body),
        };
        obj.header.set_forward(to);
        self.to.push(copy);
        Value::from_heap_ref(to)
    }

    /// Breadth-first over to-space, interleaved with tracing the contexts
    /// that copied blocks and roots refer to.
    fn scan(&mut self) {
        let mut scan = 0;
        loop {
            while scan < self.to.len() {
                let mut class = self.to[scan].header.class;
                let mut body = mem::take(&mut self.to[scan].body);
                self.visit_mut(&mut class);
                body.visit_edges_mut(self);
                let obj = &mut self.to[scan];
                obj.header.class = class;
                obj.body = body;
                scan += 1;
            }

            let Some(ctx) = self.contexts.pop() else {
                break;
            };
            let mut ctx = ctx.borrow_mut();
            if ctx.mark(self.epoch) {
                ctx.visit_edges_mut(self);
            }
        }
    }
}

impl Visitor for Copier<'_> {
    fn visit_mut(&mut self, value: &mut Value) {
        *value = self.forward(*value);
    }

    fn visit_context(&mut self, context: &ContextRef) {
        self.contexts.push(context.clone());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
