//! Namespace table and base-IRI scopes
//!
//! The namespace table is populated exactly once, from the root element's
//! `xmlns` attributes, and is immutable afterwards; the dialect forbids
//! declarations anywhere else. Base IRIs form an append-only list instead:
//! every distinct `xml:base` in the document gets its own [`BaseId`], which
//! is what the reference and datatype caches key on.

use ahash::AHashMap;
use oxiri::{Iri, IriParseError};

use crate::vocab::rdf;

/// One registered namespace.
#[derive(Debug, Clone)]
pub(crate) struct NsEntry {
    pub iri: String,
    /// True when the namespace IRI is the RDF namespace; attributes and
    /// tags under it get special treatment during dispatch.
    pub is_rdf: bool,
}

impl NsEntry {
    fn new(iri: String) -> Self {
        let is_rdf = iri == rdf::NAMESPACE;
        Self { iri, is_rdf }
    }
}

#[derive(Debug)]
pub(crate) struct NamespaceTable {
    default_ns: Option<NsEntry>,
    prefixed: AHashMap<Box<[u8]>, NsEntry>,
    min_prefix_len: usize,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self {
            default_ns: None,
            prefixed: AHashMap::new(),
            // Covers "rdf" and the implicit "xml" prefix before any
            // declaration is seen.
            min_prefix_len: 3,
        }
    }

    /// Registers the default namespace. Returns false when one was
    /// already declared.
    pub fn register_default(&mut self, iri: String) -> bool {
        if self.default_ns.is_some() {
            return false;
        }
        self.default_ns = Some(NsEntry::new(iri));
        true
    }

    /// Registers a prefixed namespace. Returns false on a duplicate
    /// prefix.
    pub fn register_prefixed(&mut self, prefix: &[u8], iri: String) -> bool {
        if self.prefixed.contains_key(prefix) {
            return false;
        }
        self.min_prefix_len = self.min_prefix_len.min(prefix.len());
        self.prefixed.insert(prefix.into(), NsEntry::new(iri));
        true
    }

    pub fn lookup(&self, prefix: &[u8]) -> Option<&NsEntry> {
        self.prefixed.get(prefix)
    }

    pub fn default_namespace(&self) -> Option<&NsEntry> {
        self.default_ns.as_ref()
    }

    /// Shortest registered prefix length, the colon-detection skip hint
    /// for the name scanners.
    pub fn min_prefix_len(&self) -> usize {
        self.min_prefix_len
    }
}

/// Identity of one base-IRI scope within a parse run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BaseId(pub(crate) u32);

/// Append-only list of distinct base IRIs seen during one parse.
///
/// Id 0 is the parser-configured base (possibly absent); `xml:base`
/// attributes append further scopes. Equal base IRIs share one id, so the
/// caches treat them as the same resolution scope.
#[derive(Debug)]
pub(crate) struct BaseScopes {
    bases: Vec<Option<Iri<String>>>,
}

impl BaseScopes {
    pub fn new(configured: Option<Iri<String>>) -> Self {
        Self {
            bases: vec![configured],
        }
    }

    pub fn root(&self) -> BaseId {
        BaseId(0)
    }

    pub fn get(&self, id: BaseId) -> Option<&Iri<String>> {
        self.bases[id.0 as usize].as_ref()
    }

    /// Adds a base scope, reusing the id of an equal existing base.
    pub fn push(&mut self, iri: Iri<String>) -> BaseId {
        if let Some(i) = self
            .bases
            .iter()
            .position(|b| b.as_ref().map(Iri::as_str) == Some(iri.as_str()))
        {
            return BaseId(i as u32);
        }
        self.bases.push(Some(iri));
        BaseId((self.bases.len() - 1) as u32)
    }

    /// Number of scopes, the configured slot included.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Resolves `text` against the given scope; without a base the text
    /// must already be an absolute IRI.
    pub fn resolve(&self, id: BaseId, text: &str) -> Result<String, IriParseError> {
        match self.get(id) {
            Some(base) => Ok(base.resolve(text)?.into_inner()),
            None => Ok(Iri::parse(text.to_owned())?.into_inner()),
        }
    }
}
