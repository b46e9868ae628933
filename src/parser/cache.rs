//! Term interning caches
//!
//! CIM exports repeat the same qualified names, object references,
//! datatype IRIs and language tags thousands of times over. Every cache
//! here keys on the raw attribute or tag bytes exactly as they appear in
//! the document, before entity decoding, so a hit costs one hash lookup
//! and no allocation; the returned terms are `Arc`-backed, and repeated
//! hits hand out the same allocation.
//!
//! Reference and datatype caches are additionally partitioned by
//! [`BaseId`]: the same relative reference under two different `xml:base`
//! scopes names two different resources.

use ahash::AHashMap;
use std::sync::Arc;

use crate::datatype::Datatype;
use crate::error::ParseResult;
use crate::model::{BlankNode, NamedNode};
use crate::parser::namespaces::BaseId;

#[derive(Debug, Default)]
pub(crate) struct TermCache {
    /// Tag or attribute qualified name -> predicate/class IRI. Namespaces
    /// are fixed after the root element, so one flat map suffices.
    qnames: AHashMap<Box<[u8]>, NamedNode>,
    /// Raw `rdf:about`/`rdf:resource` value -> resolved IRI, per base
    /// scope.
    refs: Vec<AHashMap<Box<[u8]>, NamedNode>>,
    /// Raw `rdf:datatype` value -> registered datatype, per base scope.
    datatypes: Vec<AHashMap<Box<[u8]>, Datatype>>,
    /// `rdf:nodeID` label -> blank node, document-wide.
    bnodes: AHashMap<Box<[u8]>, BlankNode>,
    /// Raw `xml:lang` value -> normalized tag.
    langs: AHashMap<Box<[u8]>, Arc<str>>,
}

impl TermCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn qname_node(
        &mut self,
        raw: &[u8],
        create: impl FnOnce() -> ParseResult<NamedNode>,
    ) -> ParseResult<NamedNode> {
        if let Some(node) = self.qnames.get(raw) {
            return Ok(node.clone());
        }
        let node = create()?;
        self.qnames.insert(raw.into(), node.clone());
        Ok(node)
    }

    pub fn ref_node(
        &mut self,
        base: BaseId,
        raw: &[u8],
        create: impl FnOnce() -> ParseResult<NamedNode>,
    ) -> ParseResult<NamedNode> {
        let slot = base.0 as usize;
        if self.refs.len() <= slot {
            self.refs.resize_with(slot + 1, AHashMap::new);
        }
        if let Some(node) = self.refs[slot].get(raw) {
            return Ok(node.clone());
        }
        let node = create()?;
        self.refs[slot].insert(raw.into(), node.clone());
        Ok(node)
    }

    pub fn datatype(
        &mut self,
        base: BaseId,
        raw: &[u8],
        create: impl FnOnce() -> ParseResult<Datatype>,
    ) -> ParseResult<Datatype> {
        let slot = base.0 as usize;
        if self.datatypes.len() <= slot {
            self.datatypes.resize_with(slot + 1, AHashMap::new);
        }
        if let Some(dt) = self.datatypes[slot].get(raw) {
            return Ok(dt.clone());
        }
        let dt = create()?;
        self.datatypes[slot].insert(raw.into(), dt.clone());
        Ok(dt)
    }

    pub fn blank_node(
        &mut self,
        raw: &[u8],
        create: impl FnOnce() -> ParseResult<BlankNode>,
    ) -> ParseResult<BlankNode> {
        if let Some(node) = self.bnodes.get(raw) {
            return Ok(node.clone());
        }
        let node = create()?;
        self.bnodes.insert(raw.into(), node.clone());
        Ok(node)
    }

    pub fn language(
        &mut self,
        raw: &[u8],
        create: impl FnOnce() -> ParseResult<Arc<str>>,
    ) -> ParseResult<Arc<str>> {
        if let Some(tag) = self.langs.get(raw) {
            return Ok(tag.clone());
        }
        let tag = create()?;
        self.langs.insert(raw.into(), tag.clone());
        Ok(tag)
    }
}

/// Mints a blank node for an element without any identifying attribute.
/// 128 random bits keep labels from colliding across parse runs.
pub(crate) fn fresh_blank_node() -> BlankNode {
    BlankNode::new_unchecked(format!("b{:032x}", rand::random::<u128>()))
}
