use bitflags::bitflags;

use crate::value::{HeapRef, Value};

bitflags! {
    /// GC bookkeeping flags stored in the header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeaderFlags: u8 {
        /// Set on an object copied during the current collection. On the
        /// original it marks that `forward` is valid.
        const MOVED = 1 << 0;
    }
}

/// Per-object header: class pointer and collector state.
///
/// The class reference is only used for dispatch. It is traced like any
/// other field so that it follows its class across a collection.
#[derive(Debug, Clone)]
pub struct Header {
    pub class: Value,
    flags: HeaderFlags,
    age: u8,
    forward: Option<HeapRef>,
}

impl Header {
    pub fn new(class: Value) -> Self {
        Self {
            class,
            flags: HeaderFlags::empty(),
            age: 0,
            forward: None,
        }
    }

    // ── flags ──────────────────────────────────────────────────────

    #[inline(always)]
    pub fn has_flag(&self, flag: HeaderFlags) -> bool {
        self.flags.contains(flag)
    }

    #[inline(always)]
    pub fn add_flag(&mut self, flag: HeaderFlags) {
        self.flags.insert(flag);
    }

    #[inline(always)]
    pub fn remove_flag(&mut self, flag: HeaderFlags) {
        self.flags.remove(flag);
    }

    #[inline(always)]
    pub fn is_moved(&self) -> bool {
        self.has_flag(HeaderFlags::MOVED)
    }

    // ── age ────────────────────────────────────────────────────────

    /// Number of collections this object has survived, saturating.
    #[inline(always)]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[inline(always)]
    pub fn set_age(&mut self, age: u8) {
        self.age = age;
    }

    // ── forwarding ─────────────────────────────────────────────────

    #[inline(always)]
    pub fn forward(&self) -> Option<HeapRef> {
        self.forward
    }

    /// Mark this (from-space) header as copied to `to`.
    pub fn set_forward(&mut self, to: HeapRef) {
        self.forward = Some(to);
        self.add_flag(HeaderFlags::MOVED);
    }

    /// Header for the to-space copy of this object.
    pub fn survivor(&self) -> Self {
        Self {
            class: self.class,
            flags: HeaderFlags::MOVED,
            age: self.age.saturating_add(1),
            forward: None,
        }
    }

    /// Reset collector state at the start of a cycle.
    pub fn clear_moved(&mut self) {
        self.remove_flag(HeaderFlags::MOVED);
        self.forward = None;
    }
}
