//! Open-element scope stack
//!
//! Each open element owns one [`ScopeFrame`] carrying the state its
//! children need: the subject under construction, the pending predicate
//! when the element is a property, and the inherited `xml:base` /
//! `xml:lang` scope. Element names live in a shared byte arena so that
//! pushing a frame never allocates once the arena has warmed up.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::datatype::Datatype;
use crate::model::{NamedNode, Subject};
use crate::parser::namespaces::BaseId;

#[derive(Debug, Clone)]
pub(crate) struct ScopeFrame {
    /// Subject the frame's children attach to. `None` only on the root
    /// container frame; property frames carry their parent's subject.
    pub subject: Option<Subject>,
    /// Set when the frame is a property element awaiting or holding its
    /// object.
    pub predicate: Option<NamedNode>,
    /// A property frame flips this when its object has been produced, so
    /// a second nested resource can be rejected.
    pub object_emitted: bool,
    /// Datatype for the literal a property frame is accumulating.
    pub datatype: Option<Datatype>,
    pub base: BaseId,
    pub lang: Option<Arc<str>>,
}

#[derive(Debug)]
pub(crate) struct ScopeStack {
    frames: SmallVec<[ScopeFrame; 8]>,
    /// Concatenated element names of the open frames.
    names: Vec<u8>,
    /// End offset of each frame's name within `names`.
    name_ends: SmallVec<[u32; 8]>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: SmallVec::new(),
            names: Vec::new(),
            name_ends: SmallVec::new(),
        }
    }

    pub fn push(&mut self, name: &[u8], frame: ScopeFrame) {
        self.names.extend_from_slice(name);
        self.name_ends.push(self.names.len() as u32);
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ScopeFrame> {
        let frame = self.frames.pop()?;
        self.name_ends.pop();
        let end = self.name_ends.last().copied().unwrap_or(0);
        self.names.truncate(end as usize);
        Some(frame)
    }

    pub fn top(&self) -> Option<&ScopeFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut ScopeFrame> {
        self.frames.last_mut()
    }

    /// Name of the innermost open element, as it appeared in the tag.
    pub fn top_name(&self) -> Option<&[u8]> {
        let end = *self.name_ends.last()? as usize;
        let start = if self.name_ends.len() >= 2 {
            self.name_ends[self.name_ends.len() - 2] as usize
        } else {
            0
        };
        Some(&self.names[start..end])
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> ScopeFrame {
        ScopeFrame {
            subject: None,
            predicate: None,
            object_emitted: false,
            datatype: None,
            base: BaseId(0),
            lang: None,
        }
    }

    #[test]
    fn test_names_follow_push_and_pop() {
        let mut stack = ScopeStack::new();
        stack.push(b"rdf:RDF", frame());
        stack.push(b"cim:ACLineSegment", frame());
        stack.push(b"cim:ACLineSegment.r", frame());

        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.top_name(), Some(b"cim:ACLineSegment.r".as_slice()));

        stack.pop().unwrap();
        assert_eq!(stack.top_name(), Some(b"cim:ACLineSegment".as_slice()));
        stack.pop().unwrap();
        assert_eq!(stack.top_name(), Some(b"rdf:RDF".as_slice()));
        stack.pop().unwrap();
        assert!(stack.is_empty());
        assert_eq!(stack.top_name(), None);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_arena_shrinks_with_frames() {
        let mut stack = ScopeStack::new();
        stack.push(b"a:b", frame());
        stack.push(b"c:d", frame());
        stack.pop();
        stack.push(b"e:longer", frame());
        assert_eq!(stack.top_name(), Some(b"e:longer".as_slice()));
        stack.pop();
        assert_eq!(stack.top_name(), Some(b"a:b".as_slice()));
    }
}
