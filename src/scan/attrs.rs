//! Reusable per-element attribute pool
//!
//! One element's attributes are collected as name/value spans in parse
//! order. The slot vector is an arena reused across elements: `reset()`
//! rewinds the logical length, later pushes overwrite old slots in place,
//! and nothing is reallocated once the pool has grown to the widest
//! element seen.

use crate::scan::cursor::Span;
use crate::scan::qname::QName;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Attribute {
    pub name: QName,
    pub value: Span,
    /// Set once a handler has acted on this attribute, so the
    /// remaining-attributes-as-literals pass skips it.
    pub consumed: bool,
}

#[derive(Debug, Default)]
pub(crate) struct AttributePool {
    slots: Vec<Attribute>,
    len: usize,
}

impl AttributePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new element; previously filled slots become reusable.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    pub fn push(&mut self, name: QName, value: Span) {
        let attr = Attribute {
            name,
            value,
            consumed: false,
        };
        if self.len < self.slots.len() {
            self.slots[self.len] = attr;
        } else {
            self.slots.push(attr);
        }
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> &Attribute {
        debug_assert!(i < self.len);
        &self.slots[i]
    }

    pub fn mark_consumed(&mut self, i: usize) {
        debug_assert!(i < self.len);
        self.slots[i].consumed = true;
    }

    /// Filled slots in parse order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.slots[..self.len].iter()
    }

    #[cfg(test)]
    fn slot_capacity(&self) -> usize {
        self.slots.len()
    }
}
