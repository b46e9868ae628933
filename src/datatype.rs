//! Literal datatype registry collaborator
//!
//! The parser resolves `rdf:datatype` attribute values to absolute IRIs and
//! then asks a [`DatatypeRegistry`] for the handle to attach to typed
//! literals. Storage engines plug in their own registry to map datatype
//! IRIs onto value-space representations; [`SimpleDatatypeRegistry`] is the
//! bundled default that accepts everything as-is.

use ahash::AHashSet;

use crate::model::NamedNode;

/// Handle for a resolved literal datatype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Datatype {
    iri: NamedNode,
}

impl Datatype {
    /// The datatype IRI backing this handle.
    pub fn iri(&self) -> &NamedNode {
        &self.iri
    }

    pub fn into_iri(self) -> NamedNode {
        self.iri
    }
}

impl From<NamedNode> for Datatype {
    fn from(iri: NamedNode) -> Self {
        Self { iri }
    }
}

/// Maps datatype IRIs to handles, registering unknown ones on first use.
///
/// The parser consults its own per-run cache first, so an implementation
/// sees each distinct datatype IRI once per parse.
pub trait DatatypeRegistry {
    fn lookup_or_register(&mut self, iri: &NamedNode) -> anyhow::Result<Datatype>;
}

/// Registry that admits every datatype IRI and records which ones it saw.
#[derive(Debug, Default)]
pub struct SimpleDatatypeRegistry {
    registered: AHashSet<NamedNode>,
}

impl SimpleDatatypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct datatype IRIs registered so far.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn contains(&self, iri: &NamedNode) -> bool {
        self.registered.contains(iri)
    }
}

impl DatatypeRegistry for SimpleDatatypeRegistry {
    fn lookup_or_register(&mut self, iri: &NamedNode) -> anyhow::Result<Datatype> {
        if !self.registered.contains(iri) {
            self.registered.insert(iri.clone());
        }
        Ok(Datatype::from(iri.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_registry_records_distinct_iris() {
        let float = NamedNode::new("http://www.w3.org/2001/XMLSchema#float").unwrap();
        let boolean = NamedNode::new("http://www.w3.org/2001/XMLSchema#boolean").unwrap();

        let mut registry = SimpleDatatypeRegistry::new();
        let a = registry.lookup_or_register(&float).unwrap();
        let b = registry.lookup_or_register(&float).unwrap();
        registry.lookup_or_register(&boolean).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.iri(), &float);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&boolean));
    }
}
