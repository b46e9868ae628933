//! The parsing state machine
//!
//! One [`CimXmlReader`] drives a single parse run: it consumes bytes
//! through a fixed set of states, classifies each opening tag, and emits
//! statements to the sink in document order. Element recognition works on
//! raw bytes; terms are only constructed on cache misses.

use std::io::Read;
use std::sync::Arc;

use oxiri::Iri;
use tracing::debug;

use crate::datatype::{Datatype, DatatypeRegistry};
use crate::error::{CimXmlParseError, ParseResult};
use crate::model::{BlankNode, Literal, NamedNode, Subject, Triple};
use crate::parser::cache::{fresh_blank_node, TermCache};
use crate::parser::namespaces::{BaseId, BaseScopes, NamespaceTable};
use crate::parser::scope::{ScopeFrame, ScopeStack};
use crate::parser::CimXmlParser;
use crate::scan::attrs::AttributePool;
use crate::scan::cursor::{ByteCursor, Span};
use crate::scan::qname::{
    scan_attribute_value, scan_cdata_chunk, scan_qname, scan_text_chunk, skip_whitespace,
    NameKind, QName,
};
use crate::scan::{decode_text, eq_bytes_reversed, is_xml_whitespace};
use crate::sink::{ParseStatistics, StatementSink};
use crate::vocab::rdf;

#[derive(Debug, Clone, Copy)]
enum ParserState {
    LookingForTag,
    LookingForTagName,
    LookingForAttributeName(QName),
    LookingForAttributeValue(QName, QName),
    AtEndOfOpeningTag(QName),
    AtEndOfSelfClosingTag(QName),
    InTextContent,
    InClosingTag { emit_literal: bool },
    Done,
}

/// What a fully scanned opening tag is, before any semantic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    /// The `rdf:RDF` container.
    Root,
    /// `rdf:Description`, a resource without an implied type.
    Description,
    /// `rdf:li`, rejected by this dialect.
    ListItem,
    /// Anything else: a typed resource or a property, depending on its
    /// attributes.
    Other,
}

/// RDF-namespace attributes recognized by the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RdfAttr {
    About,
    Id,
    NodeId,
    Resource,
    DatatypeIri,
    ParseType,
}

/// How a property element produces its object.
enum PropertyForm {
    /// Literal from text content, plain or language-tagged.
    Plain,
    /// `rdf:resource`: the object is a reference, emitted immediately.
    Reference(NamedNode),
    /// `rdf:datatype`: text content becomes a typed literal.
    Typed(Datatype),
    /// `rdf:parseType="Resource"`: a fresh blank node owns the nested
    /// property elements.
    NestedResource,
}

pub(crate) struct CimXmlReader<'a, R, S: ?Sized, D: ?Sized> {
    opts: &'a CimXmlParser,
    cur: ByteCursor<R>,
    sink: &'a mut S,
    registry: &'a mut D,
    ns: NamespaceTable,
    bases: BaseScopes,
    scopes: ScopeStack,
    attrs: AttributePool,
    cache: TermCache,
    state: ParserState,
    /// Accumulated, entity-decoded text of the current literal property.
    text_buf: String,
    stats: ParseStatistics,
}

impl<'a, R, S, D> CimXmlReader<'a, R, S, D>
where
    R: Read,
    S: StatementSink + ?Sized,
    D: DatatypeRegistry + ?Sized,
{
    pub(crate) fn new(opts: &'a CimXmlParser, reader: R, sink: &'a mut S, registry: &'a mut D) -> Self {
        Self {
            cur: ByteCursor::with_capacity(reader, opts.buffer_capacity),
            bases: BaseScopes::new(opts.base_iri.clone()),
            opts,
            sink,
            registry,
            ns: NamespaceTable::new(),
            scopes: ScopeStack::new(),
            attrs: AttributePool::new(),
            cache: TermCache::new(),
            state: ParserState::LookingForTag,
            text_buf: String::new(),
            stats: ParseStatistics::default(),
        }
    }

    pub(crate) fn parse(mut self) -> ParseResult<ParseStatistics> {
        self.sink.start().map_err(CimXmlParseError::Sink)?;
        self.cur.skip_bom()?;
        if let Some(base) = &self.opts.base_iri {
            self.sink.base(base.as_str()).map_err(CimXmlParseError::Sink)?;
        }
        while !matches!(self.state, ParserState::Done) {
            self.step()?;
        }
        self.stats.bytes_consumed = self.cur.offset();
        self.sink.finish().map_err(CimXmlParseError::Sink)?;
        Ok(self.stats)
    }

    fn step(&mut self) -> ParseResult<()> {
        match self.state {
            ParserState::LookingForTag => self.step_looking_for_tag(),
            ParserState::LookingForTagName => self.step_tag_name(),
            ParserState::LookingForAttributeName(tag) => self.step_attribute_name(tag),
            ParserState::LookingForAttributeValue(tag, name) => {
                self.step_attribute_value(tag, name)
            }
            ParserState::AtEndOfOpeningTag(tag) => self.dispatch_element(tag, false),
            ParserState::AtEndOfSelfClosingTag(tag) => self.dispatch_element(tag, true),
            ParserState::InTextContent => self.step_text_content(),
            ParserState::InClosingTag { emit_literal } => self.step_closing_tag(emit_literal),
            ParserState::Done => Ok(()),
        }
    }

    /// Between elements: whitespace, comments, processing instructions and
    /// markup declarations are skipped; anything else must open a tag.
    fn step_looking_for_tag(&mut self) -> ParseResult<()> {
        self.cur.release();
        let Some(b) = skip_whitespace(&mut self.cur)? else {
            if self.scopes.is_empty() {
                // Nothing was ever opened; an empty document is valid.
                self.state = ParserState::Done;
                return Ok(());
            }
            return Err(CimXmlParseError::syntax(
                "unclosed elements remain at end of stream",
                self.cur.offset(),
            ));
        };
        if b != b'<' {
            return Err(CimXmlParseError::syntax(
                "unexpected character data between elements",
                self.cur.offset(),
            ));
        }
        if self.cur.starts_with(b"</")? {
            self.cur.advance(2);
            self.cur.release();
            self.state = ParserState::InClosingTag {
                emit_literal: false,
            };
        } else if self.cur.starts_with(b"<!--")? {
            self.cur.advance(4);
            if !self.cur.skip_until(b"-->")? {
                return Err(CimXmlParseError::syntax(
                    "unterminated comment",
                    self.cur.offset(),
                ));
            }
        } else if self.cur.starts_with(b"<?")? {
            self.cur.advance(2);
            if !self.cur.skip_until(b"?>")? {
                return Err(CimXmlParseError::syntax(
                    "unterminated processing instruction",
                    self.cur.offset(),
                ));
            }
        } else if self.cur.starts_with(b"<!")? {
            self.skip_markup_declaration()?;
        } else {
            self.cur.advance(1);
            self.cur.release();
            self.state = ParserState::LookingForTagName;
        }
        Ok(())
    }

    fn step_tag_name(&mut self) -> ParseResult<()> {
        let (name, _) = scan_qname(&mut self.cur, NameKind::Tag, self.ns.min_prefix_len())?;
        self.attrs.reset();
        self.state = ParserState::LookingForAttributeName(name);
        Ok(())
    }

    fn step_attribute_name(&mut self, tag: QName) -> ParseResult<()> {
        match skip_whitespace(&mut self.cur)? {
            None => Err(CimXmlParseError::syntax(
                "unexpected end of stream inside tag",
                self.cur.offset(),
            )),
            Some(b'>') => {
                self.cur.advance(1);
                self.state = ParserState::AtEndOfOpeningTag(tag);
                Ok(())
            }
            Some(b'/') => {
                self.cur.advance(1);
                match self.cur.next_byte()? {
                    Some(b'>') => {
                        self.state = ParserState::AtEndOfSelfClosingTag(tag);
                        Ok(())
                    }
                    _ => Err(CimXmlParseError::syntax(
                        "expected '>' after '/'",
                        self.cur.offset(),
                    )),
                }
            }
            Some(_) => {
                let (name, _) =
                    scan_qname(&mut self.cur, NameKind::Attribute, self.ns.min_prefix_len())?;
                match skip_whitespace(&mut self.cur)? {
                    Some(b'=') => {
                        self.cur.advance(1);
                        self.state = ParserState::LookingForAttributeValue(tag, name);
                        Ok(())
                    }
                    _ => Err(CimXmlParseError::syntax(
                        "expected '=' after attribute name",
                        self.cur.offset(),
                    )),
                }
            }
        }
    }

    fn step_attribute_value(&mut self, tag: QName, name: QName) -> ParseResult<()> {
        let value = scan_attribute_value(&mut self.cur)?;
        self.attrs.push(name, value);
        self.state = ParserState::LookingForAttributeName(tag);
        Ok(())
    }

    /// Inside a literal property: accumulate decoded text until the
    /// element closes or a nested element begins.
    fn step_text_content(&mut self) -> ParseResult<()> {
        self.cur.release();
        let chunk = scan_text_chunk(&mut self.cur)?;
        if !chunk.is_empty() {
            decode_text(self.cur.bytes(chunk), chunk.start, &mut self.text_buf)?;
        }
        if self.cur.starts_with(b"</")? {
            self.cur.advance(2);
            self.cur.release();
            self.state = ParserState::InClosingTag { emit_literal: true };
        } else if self.cur.starts_with(b"<!--")? {
            self.cur.advance(4);
            if !self.cur.skip_until(b"-->")? {
                return Err(CimXmlParseError::syntax(
                    "unterminated comment",
                    self.cur.offset(),
                ));
            }
        } else if self.cur.starts_with(b"<![CDATA[")? {
            self.cur.advance(9);
            self.cur.release();
            let cdata = scan_cdata_chunk(&mut self.cur)?;
            let raw = self.cur.bytes(cdata);
            // CDATA text is literal: UTF-8 checked, entities left alone.
            let text = std::str::from_utf8(raw).map_err(|e| {
                CimXmlParseError::syntax(
                    "invalid UTF-8 in CDATA section",
                    cdata.start + e.valid_up_to() as u64,
                )
            })?;
            self.text_buf.push_str(text);
        } else if self.cur.starts_with(b"<?")? {
            self.cur.advance(2);
            if !self.cur.skip_until(b"?>")? {
                return Err(CimXmlParseError::syntax(
                    "unterminated processing instruction",
                    self.cur.offset(),
                ));
            }
        } else {
            // A nested element turns this property into a resource
            // property; any real text before it is malformed.
            if !self.text_buf.bytes().all(is_xml_whitespace) {
                return Err(CimXmlParseError::syntax(
                    "element content mixes text and child elements",
                    self.cur.offset(),
                ));
            }
            self.text_buf.clear();
            self.cur.advance(1);
            self.cur.release();
            self.state = ParserState::LookingForTagName;
        }
        Ok(())
    }

    fn step_closing_tag(&mut self, emit_literal: bool) -> ParseResult<()> {
        let (name, _) = scan_qname(&mut self.cur, NameKind::Tag, self.ns.min_prefix_len())?;
        match skip_whitespace(&mut self.cur)? {
            Some(b'>') => self.cur.advance(1),
            _ => {
                return Err(CimXmlParseError::syntax(
                    "expected '>' in closing tag",
                    self.cur.offset(),
                ));
            }
        }
        let Some(open_name) = self.scopes.top_name() else {
            return Err(CimXmlParseError::syntax(
                "closing tag without an open element",
                name.span.start,
            ));
        };
        if !eq_bytes_reversed(name.bytes(&self.cur), open_name) {
            return Err(CimXmlParseError::syntax(
                format!(
                    "closing tag </{}> does not match open element <{}>",
                    String::from_utf8_lossy(name.bytes(&self.cur)),
                    String::from_utf8_lossy(open_name)
                ),
                name.span.start,
            ));
        }
        let Some(frame) = self.scopes.pop() else {
            return Err(CimXmlParseError::syntax(
                "closing tag without an open element",
                name.span.start,
            ));
        };
        if emit_literal {
            let (subject, predicate) = match (frame.subject, frame.predicate) {
                (Some(s), Some(p)) => (s, p),
                _ => unreachable!("text content only accumulates under a property element"),
            };
            let literal = if let Some(dt) = frame.datatype {
                Literal::new_typed(self.text_buf.as_str(), dt.into_iri())
            } else if let Some(lang) = frame.lang {
                Literal::new_language_tagged_literal_unchecked(self.text_buf.as_str(), lang)
            } else {
                Literal::new(self.text_buf.as_str())
            };
            self.text_buf.clear();
            self.emit(Triple::new(subject, predicate, literal))?;
        }
        self.cur.release();
        self.state = if self.scopes.is_empty() {
            ParserState::Done
        } else {
            ParserState::LookingForTag
        };
        Ok(())
    }

    /// Skips `<!DOCTYPE ...>` and similar declarations, balancing the
    /// bracketed internal subset. Quoted angle brackets are not handled.
    fn skip_markup_declaration(&mut self) -> ParseResult<()> {
        self.cur.advance(2);
        let mut depth = 1u32;
        loop {
            match self.cur.next_byte()? {
                None => {
                    return Err(CimXmlParseError::syntax(
                        "unterminated markup declaration",
                        self.cur.offset(),
                    ));
                }
                Some(b'<') => depth += 1,
                Some(b'>') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Semantic handling of a fully scanned opening tag.
    fn dispatch_element(&mut self, name: QName, self_closing: bool) -> ParseResult<()> {
        self.stats.elements_parsed += 1;
        if self.scopes.is_empty() {
            self.handle_root(name, self_closing)?;
        } else {
            let (base_id, lang) = self.consume_scope_attributes()?;
            match self.classify(name)? {
                ElementKind::Root => {
                    return Err(CimXmlParseError::syntax(
                        "rdf:RDF cannot be nested inside the document",
                        name.span.start,
                    ));
                }
                ElementKind::ListItem => {
                    return Err(CimXmlParseError::syntax(
                        "rdf:li is not supported by this dialect",
                        name.span.start,
                    ));
                }
                ElementKind::Description => {
                    let subject = match self.find_identifying_subject(base_id)? {
                        Some(subject) => subject,
                        None => Subject::BlankNode(fresh_blank_node()),
                    };
                    self.finish_node_element(name, subject, false, base_id, lang, self_closing)?;
                }
                ElementKind::Other => match self.find_identifying_subject(base_id)? {
                    Some(subject) => {
                        self.finish_node_element(name, subject, true, base_id, lang, self_closing)?;
                    }
                    None => self.handle_property_element(name, base_id, lang, self_closing)?,
                },
            }
        }
        self.cur.release();
        Ok(())
    }

    /// The root element: `rdf:RDF`, carrying every namespace declaration
    /// of the document plus optional `xml:base`/`xml:lang`.
    fn handle_root(&mut self, name: QName, self_closing: bool) -> ParseResult<()> {
        let mut base_id = self.bases.root();
        let mut lang = None;
        for i in 0..self.attrs.len() {
            let (aname, value) = {
                let attr = self.attrs.get(i);
                (attr.name, attr.value)
            };
            match aname.prefix_bytes(&self.cur) {
                None if aname.bytes(&self.cur) == b"xmlns" => {
                    let mut iri = String::new();
                    decode_text(self.cur.bytes(value), value.start, &mut iri)?;
                    Iri::parse(iri.as_str()).map_err(|e| {
                        CimXmlParseError::syntax(
                            format!("invalid namespace IRI '{iri}': {e}"),
                            value.start,
                        )
                    })?;
                    if !self.ns.register_default(iri.clone()) {
                        return Err(CimXmlParseError::syntax(
                            "duplicate default namespace declaration",
                            aname.span.start,
                        ));
                    }
                    self.sink.prefix("", &iri).map_err(CimXmlParseError::Sink)?;
                }
                Some(b"xmlns") => {
                    let prefix = aname.local_bytes(&self.cur);
                    let prefix_str = std::str::from_utf8(prefix).map_err(|_| {
                        CimXmlParseError::syntax(
                            "invalid UTF-8 in namespace prefix",
                            aname.span.start,
                        )
                    })?;
                    let mut iri = String::new();
                    decode_text(self.cur.bytes(value), value.start, &mut iri)?;
                    Iri::parse(iri.as_str()).map_err(|e| {
                        CimXmlParseError::syntax(
                            format!("invalid namespace IRI '{iri}': {e}"),
                            value.start,
                        )
                    })?;
                    if !self.ns.register_prefixed(prefix, iri.clone()) {
                        return Err(CimXmlParseError::syntax(
                            format!("duplicate namespace prefix '{prefix_str}'"),
                            aname.span.start,
                        ));
                    }
                    self.sink
                        .prefix(prefix_str, &iri)
                        .map_err(CimXmlParseError::Sink)?;
                }
                Some(b"xml") => match aname.local_bytes(&self.cur) {
                    b"base" => {
                        let mut text = String::new();
                        decode_text(self.cur.bytes(value), value.start, &mut text)?;
                        let resolved = match self.bases.get(base_id) {
                            Some(base) => base.resolve(&text),
                            None => Iri::parse(text.clone()),
                        }
                        .map_err(|e| {
                            CimXmlParseError::syntax(
                                format!("invalid xml:base '{text}': {e}"),
                                value.start,
                            )
                        })?;
                        self.sink
                            .base(resolved.as_str())
                            .map_err(CimXmlParseError::Sink)?;
                        base_id = self.bases.push(resolved);
                    }
                    b"lang" => lang = self.language_for(value)?,
                    _ => {}
                },
                _ => {
                    return Err(CimXmlParseError::syntax(
                        format!(
                            "unexpected attribute '{}' on root element",
                            String::from_utf8_lossy(aname.bytes(&self.cur))
                        ),
                        aname.span.start,
                    ));
                }
            }
        }

        let is_rdf = match name.prefix_bytes(&self.cur) {
            Some(prefix) => match self.ns.lookup(prefix) {
                Some(entry) => entry.is_rdf,
                None => {
                    return Err(CimXmlParseError::syntax(
                        format!(
                            "unknown namespace prefix '{}'",
                            String::from_utf8_lossy(prefix)
                        ),
                        name.span.start,
                    ));
                }
            },
            None => self.ns.default_namespace().is_some_and(|e| e.is_rdf),
        };
        if !is_rdf || name.local_bytes(&self.cur) != b"RDF" {
            return Err(CimXmlParseError::syntax(
                "document root must be rdf:RDF",
                name.span.start,
            ));
        }
        debug!(
            attributes = self.attrs.len(),
            min_prefix = self.ns.min_prefix_len(),
            "processed root element"
        );

        if self_closing {
            self.state = ParserState::Done;
        } else {
            let frame = ScopeFrame {
                subject: None,
                predicate: None,
                object_emitted: false,
                datatype: None,
                base: base_id,
                lang,
            };
            self.scopes.push(name.bytes(&self.cur), frame);
            self.state = ParserState::LookingForTag;
        }
        Ok(())
    }

    /// Handles `xml:base`/`xml:lang` overrides before dispatch and rejects
    /// namespace declarations below the root. Other `xml:*` attributes are
    /// consumed and ignored.
    fn consume_scope_attributes(&mut self) -> ParseResult<(BaseId, Option<Arc<str>>)> {
        let (mut base_id, mut lang) = match self.scopes.top() {
            Some(top) => (top.base, top.lang.clone()),
            None => (self.bases.root(), None),
        };
        for i in 0..self.attrs.len() {
            let (aname, value, consumed) = {
                let attr = self.attrs.get(i);
                (attr.name, attr.value, attr.consumed)
            };
            if consumed {
                continue;
            }
            match aname.prefix_bytes(&self.cur) {
                None if aname.bytes(&self.cur) == b"xmlns" => {
                    return Err(CimXmlParseError::syntax(
                        "namespace declarations are only allowed on the root element",
                        aname.span.start,
                    ));
                }
                Some(b"xmlns") => {
                    return Err(CimXmlParseError::syntax(
                        "namespace declarations are only allowed on the root element",
                        aname.span.start,
                    ));
                }
                Some(b"xml") => {
                    self.attrs.mark_consumed(i);
                    match aname.local_bytes(&self.cur) {
                        b"base" => {
                            let mut text = String::new();
                            decode_text(self.cur.bytes(value), value.start, &mut text)?;
                            let resolved = match self.bases.get(base_id) {
                                Some(base) => base.resolve(&text),
                                None => Iri::parse(text.clone()),
                            }
                            .map_err(|e| {
                                CimXmlParseError::syntax(
                                    format!("invalid xml:base '{text}': {e}"),
                                    value.start,
                                )
                            })?;
                            base_id = self.bases.push(resolved);
                        }
                        b"lang" => lang = self.language_for(value)?,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Ok((base_id, lang))
    }

    fn classify(&self, name: QName) -> ParseResult<ElementKind> {
        let is_rdf = match name.prefix_bytes(&self.cur) {
            Some(prefix) => match self.ns.lookup(prefix) {
                Some(entry) => entry.is_rdf,
                None => {
                    return Err(CimXmlParseError::syntax(
                        format!(
                            "unknown namespace prefix '{}'",
                            String::from_utf8_lossy(prefix)
                        ),
                        name.span.start,
                    ));
                }
            },
            None => self.ns.default_namespace().is_some_and(|e| e.is_rdf),
        };
        Ok(if is_rdf {
            match name.local_bytes(&self.cur) {
                b"RDF" => ElementKind::Root,
                b"Description" => ElementKind::Description,
                b"li" => ElementKind::ListItem,
                _ => ElementKind::Other,
            }
        } else {
            ElementKind::Other
        })
    }

    /// Recognizes the RDF-namespace attributes the dialect acts on. Any
    /// other attribute, RDF-namespaced or not, is left for the
    /// remaining-attributes pass.
    fn rdf_attr_kind(&self, name: QName) -> ParseResult<Option<RdfAttr>> {
        let Some(prefix) = name.prefix_bytes(&self.cur) else {
            return Ok(None);
        };
        let Some(entry) = self.ns.lookup(prefix) else {
            return Err(CimXmlParseError::syntax(
                format!(
                    "unknown namespace prefix '{}'",
                    String::from_utf8_lossy(prefix)
                ),
                name.span.start,
            ));
        };
        if !entry.is_rdf {
            return Ok(None);
        }
        Ok(match name.local_bytes(&self.cur) {
            b"about" => Some(RdfAttr::About),
            b"ID" => Some(RdfAttr::Id),
            b"nodeID" => Some(RdfAttr::NodeId),
            b"resource" => Some(RdfAttr::Resource),
            b"datatype" => Some(RdfAttr::DatatypeIri),
            b"parseType" => Some(RdfAttr::ParseType),
            _ => None,
        })
    }

    /// First identifying attribute in document order wins: `rdf:about`,
    /// `rdf:ID` or `rdf:nodeID`, whichever is seen first.
    fn find_identifying_subject(&mut self, base_id: BaseId) -> ParseResult<Option<Subject>> {
        for i in 0..self.attrs.len() {
            let (aname, value, consumed) = {
                let attr = self.attrs.get(i);
                (attr.name, attr.value, attr.consumed)
            };
            if consumed {
                continue;
            }
            match self.rdf_attr_kind(aname)? {
                Some(RdfAttr::About) => {
                    self.attrs.mark_consumed(i);
                    return Ok(Some(Subject::NamedNode(
                        self.resolve_reference(base_id, value)?,
                    )));
                }
                Some(RdfAttr::Id) => {
                    self.attrs.mark_consumed(i);
                    return Ok(Some(Subject::NamedNode(
                        self.resolve_id_fragment(base_id, value)?,
                    )));
                }
                Some(RdfAttr::NodeId) => {
                    self.attrs.mark_consumed(i);
                    return Ok(Some(Subject::BlankNode(self.labeled_blank_node(value)?)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Completes a resource element: optional `rdf:type` triple, link into
    /// an enclosing property, remaining attributes as literal triples,
    /// then a new scope frame unless self-closing.
    fn finish_node_element(
        &mut self,
        name: QName,
        subject: Subject,
        typed: bool,
        base_id: BaseId,
        lang: Option<Arc<str>>,
        self_closing: bool,
    ) -> ParseResult<()> {
        if typed {
            let class = self.resolve_qname_node(name)?;
            self.emit(Triple::new(subject.clone(), rdf::TYPE.clone(), class))?;
        }
        let link = match self.scopes.top_mut() {
            Some(ScopeFrame {
                subject: Some(parent),
                predicate: Some(pred),
                object_emitted,
                datatype,
                ..
            }) => {
                if datatype.is_some() {
                    return Err(CimXmlParseError::syntax(
                        "a property with rdf:datatype cannot contain a resource element",
                        name.span.start,
                    ));
                }
                if *object_emitted {
                    return Err(CimXmlParseError::syntax(
                        "property element already has an object",
                        name.span.start,
                    ));
                }
                *object_emitted = true;
                Some(Triple::new(parent.clone(), pred.clone(), subject.clone()))
            }
            _ => None,
        };
        if let Some(triple) = link {
            self.emit(triple)?;
        }
        self.emit_remaining_attributes_as_literals(&subject)?;
        if !self_closing {
            let frame = ScopeFrame {
                subject: Some(subject),
                predicate: None,
                object_emitted: false,
                datatype: None,
                base: base_id,
                lang,
            };
            self.scopes.push(name.bytes(&self.cur), frame);
        }
        self.state = ParserState::LookingForTag;
        Ok(())
    }

    /// A property element: its qualified name is the predicate, its object
    /// comes from `rdf:resource`, `rdf:datatype`, `rdf:parseType` or text
    /// content, first matching attribute in document order deciding.
    fn handle_property_element(
        &mut self,
        name: QName,
        base_id: BaseId,
        lang: Option<Arc<str>>,
        self_closing: bool,
    ) -> ParseResult<()> {
        let subject = match self.scopes.top() {
            Some(top) => {
                if top.predicate.is_some() {
                    return Err(CimXmlParseError::syntax(
                        "property element cannot appear directly inside another property element",
                        name.span.start,
                    ));
                }
                match &top.subject {
                    Some(subject) => subject.clone(),
                    None => {
                        return Err(CimXmlParseError::syntax(
                            "element carries no rdf:about, rdf:ID or rdf:nodeID and has no \
                             enclosing resource",
                            name.span.start,
                        ));
                    }
                }
            }
            None => unreachable!("dispatch guarantees an enclosing frame"),
        };
        let predicate = self.resolve_qname_node(name)?;

        let mut form = PropertyForm::Plain;
        for i in 0..self.attrs.len() {
            let (aname, value, consumed) = {
                let attr = self.attrs.get(i);
                (attr.name, attr.value, attr.consumed)
            };
            if consumed {
                continue;
            }
            match self.rdf_attr_kind(aname)? {
                Some(RdfAttr::Resource) => {
                    self.attrs.mark_consumed(i);
                    form = PropertyForm::Reference(self.resolve_reference(base_id, value)?);
                    break;
                }
                Some(RdfAttr::DatatypeIri) => {
                    self.attrs.mark_consumed(i);
                    form = PropertyForm::Typed(self.resolve_datatype(base_id, value)?);
                    break;
                }
                Some(RdfAttr::ParseType) => {
                    self.attrs.mark_consumed(i);
                    self.check_parse_type(value)?;
                    form = PropertyForm::NestedResource;
                    break;
                }
                _ => {}
            }
        }

        match form {
            PropertyForm::Reference(object) => {
                self.emit(Triple::new(
                    subject.clone(),
                    predicate.clone(),
                    object.clone(),
                ))?;
                let object_subject = Subject::NamedNode(object);
                self.emit_remaining_attributes_as_literals(&object_subject)?;
                if !self_closing {
                    let frame = ScopeFrame {
                        subject: Some(subject),
                        predicate: Some(predicate),
                        object_emitted: true,
                        datatype: None,
                        base: base_id,
                        lang,
                    };
                    self.scopes.push(name.bytes(&self.cur), frame);
                }
                self.state = ParserState::LookingForTag;
            }
            PropertyForm::NestedResource => {
                let object = fresh_blank_node();
                self.emit(Triple::new(
                    subject.clone(),
                    predicate.clone(),
                    object.clone(),
                ))?;
                let object_subject = Subject::BlankNode(object);
                self.emit_remaining_attributes_as_literals(&object_subject)?;
                if !self_closing {
                    let frame = ScopeFrame {
                        subject: Some(object_subject),
                        predicate: None,
                        object_emitted: false,
                        datatype: None,
                        base: base_id,
                        lang,
                    };
                    self.scopes.push(name.bytes(&self.cur), frame);
                }
                self.state = ParserState::LookingForTag;
            }
            PropertyForm::Typed(datatype) => {
                self.reject_remaining_attributes()?;
                if self_closing {
                    self.emit(Triple::new(
                        subject,
                        predicate,
                        Literal::new_typed("", datatype.into_iri()),
                    ))?;
                    self.state = ParserState::LookingForTag;
                } else {
                    let frame = ScopeFrame {
                        subject: Some(subject),
                        predicate: Some(predicate),
                        object_emitted: false,
                        datatype: Some(datatype),
                        base: base_id,
                        lang,
                    };
                    self.scopes.push(name.bytes(&self.cur), frame);
                    self.text_buf.clear();
                    self.state = ParserState::InTextContent;
                }
            }
            PropertyForm::Plain => {
                self.reject_remaining_attributes()?;
                if self_closing {
                    // Same path as text content, with an empty lexical form.
                    let literal = match lang {
                        Some(tag) => Literal::new_language_tagged_literal_unchecked("", tag),
                        None => Literal::new(""),
                    };
                    self.emit(Triple::new(subject, predicate, literal))?;
                    self.state = ParserState::LookingForTag;
                } else {
                    let frame = ScopeFrame {
                        subject: Some(subject),
                        predicate: Some(predicate),
                        object_emitted: false,
                        datatype: None,
                        base: base_id,
                        lang,
                    };
                    self.scopes.push(name.bytes(&self.cur), frame);
                    self.text_buf.clear();
                    self.state = ParserState::InTextContent;
                }
            }
        }
        Ok(())
    }

    fn check_parse_type(&mut self, value: Span) -> ParseResult<()> {
        let mut text = String::new();
        decode_text(self.cur.bytes(value), value.start, &mut text)?;
        match text.as_str() {
            "Resource" => Ok(()),
            "Collection" | "Literal" | "Statement" => Err(CimXmlParseError::syntax(
                format!("rdf:parseType=\"{text}\" is not supported by this dialect"),
                value.start,
            )),
            _ => Err(CimXmlParseError::syntax(
                format!("unknown rdf:parseType \"{text}\""),
                value.start,
            )),
        }
    }

    /// Every attribute still unconsumed becomes a plain literal triple on
    /// the given subject. That includes leftover RDF-namespace attributes:
    /// an `rdf:ID` shadowed by an earlier `rdf:about` surfaces as a
    /// literal, matching the first-match identification rule.
    fn emit_remaining_attributes_as_literals(&mut self, subject: &Subject) -> ParseResult<()> {
        for i in 0..self.attrs.len() {
            let (aname, value, consumed) = {
                let attr = self.attrs.get(i);
                (attr.name, attr.value, attr.consumed)
            };
            if consumed {
                continue;
            }
            let predicate = self.resolve_qname_node(aname)?;
            let mut text = String::new();
            decode_text(self.cur.bytes(value), value.start, &mut text)?;
            self.attrs.mark_consumed(i);
            self.emit(Triple::new(subject.clone(), predicate, Literal::new(text)))?;
        }
        Ok(())
    }

    fn reject_remaining_attributes(&self) -> ParseResult<()> {
        for attr in self.attrs.iter() {
            if !attr.consumed {
                return Err(CimXmlParseError::syntax(
                    format!(
                        "attribute '{}' is not allowed on a property element with literal \
                         content",
                        String::from_utf8_lossy(attr.name.bytes(&self.cur))
                    ),
                    attr.name.span.start,
                ));
            }
        }
        Ok(())
    }

    /// Resolves a tag or attribute qualified name to an IRI through the
    /// flat qname cache; namespaces cannot change after the root element.
    fn resolve_qname_node(&mut self, name: QName) -> ParseResult<NamedNode> {
        let raw = name.bytes(&self.cur);
        self.cache.qname_node(raw, || {
            let ns_iri = match name.prefix_bytes(&self.cur) {
                Some(prefix) => {
                    &self
                        .ns
                        .lookup(prefix)
                        .ok_or_else(|| {
                            CimXmlParseError::syntax(
                                format!(
                                    "unknown namespace prefix '{}'",
                                    String::from_utf8_lossy(prefix)
                                ),
                                name.span.start,
                            )
                        })?
                        .iri
                }
                None => {
                    &self
                        .ns
                        .default_namespace()
                        .ok_or_else(|| {
                            CimXmlParseError::syntax(
                                "no default namespace declared",
                                name.span.start,
                            )
                        })?
                        .iri
                }
            };
            let local = std::str::from_utf8(name.local_bytes(&self.cur)).map_err(|_| {
                CimXmlParseError::syntax("invalid UTF-8 in name", name.span.start)
            })?;
            NamedNode::new(format!("{ns_iri}{local}")).map_err(|e| {
                CimXmlParseError::syntax(
                    format!(
                        "qualified name '{}' does not form a valid IRI: {e}",
                        String::from_utf8_lossy(name.bytes(&self.cur))
                    ),
                    name.span.start,
                )
            })
        })
    }

    /// Resolves an `rdf:about`/`rdf:resource` value against the scope
    /// base, through the per-base reference cache.
    fn resolve_reference(&mut self, base_id: BaseId, value: Span) -> ParseResult<NamedNode> {
        let raw = self.cur.bytes(value);
        self.cache.ref_node(base_id, raw, || {
            let mut text = String::new();
            decode_text(raw, value.start, &mut text)?;
            if self.opts.bare_mrid_references && text.starts_with('_') {
                // Legacy exports drop the '#' before mRID fragments.
                text.insert(0, '#');
            }
            let iri = self.bases.resolve(base_id, &text).map_err(|e| {
                CimXmlParseError::syntax(
                    format!("cannot resolve reference '{text}': {e}"),
                    value.start,
                )
            })?;
            Ok(NamedNode::new_unchecked(iri))
        })
    }

    /// `rdf:ID` names a fragment of the in-scope base, which must exist.
    fn resolve_id_fragment(&mut self, base_id: BaseId, value: Span) -> ParseResult<NamedNode> {
        let mut id = String::new();
        decode_text(self.cur.bytes(value), value.start, &mut id)?;
        let Some(base) = self.bases.get(base_id) else {
            return Err(CimXmlParseError::syntax(
                format!("rdf:ID=\"{id}\" requires a base IRI in scope"),
                value.start,
            ));
        };
        let iri = if self.opts.raw_id_fragments {
            // Legacy form: textual concatenation, no RFC 3986 resolution.
            format!("{}#{}", base.as_str(), id)
        } else {
            base.resolve(&format!("#{id}"))
                .map_err(|e| {
                    CimXmlParseError::syntax(
                        format!("cannot resolve rdf:ID \"{id}\": {e}"),
                        value.start,
                    )
                })?
                .into_inner()
        };
        Ok(NamedNode::new_unchecked(iri))
    }

    fn labeled_blank_node(&mut self, value: Span) -> ParseResult<BlankNode> {
        let raw = self.cur.bytes(value);
        self.cache.blank_node(raw, || {
            let mut label = String::new();
            decode_text(raw, value.start, &mut label)?;
            BlankNode::new(label).map_err(|e| {
                CimXmlParseError::syntax(format!("invalid rdf:nodeID: {e}"), value.start)
            })
        })
    }

    fn resolve_datatype(&mut self, base_id: BaseId, value: Span) -> ParseResult<Datatype> {
        let raw = self.cur.bytes(value);
        self.cache.datatype(base_id, raw, || {
            let mut text = String::new();
            decode_text(raw, value.start, &mut text)?;
            let iri = self.bases.resolve(base_id, &text).map_err(|e| {
                CimXmlParseError::syntax(
                    format!("cannot resolve datatype IRI '{text}': {e}"),
                    value.start,
                )
            })?;
            let node = NamedNode::new_unchecked(iri);
            self.registry
                .lookup_or_register(&node)
                .map_err(|source| CimXmlParseError::Datatype {
                    iri: node.clone(),
                    source,
                })
        })
    }

    /// Interns an `xml:lang` value; an empty value clears the inherited
    /// language.
    fn language_for(&mut self, value: Span) -> ParseResult<Option<Arc<str>>> {
        if value.is_empty() {
            return Ok(None);
        }
        let raw = self.cur.bytes(value);
        let tag = self.cache.language(raw, || {
            let mut text = String::new();
            decode_text(raw, value.start, &mut text)?;
            let lower = text.to_ascii_lowercase();
            oxilangtag::LanguageTag::parse(lower.as_str()).map_err(|e| {
                CimXmlParseError::syntax(
                    format!("invalid language tag '{text}': {e}"),
                    value.start,
                )
            })?;
            Ok(Arc::from(lower))
        })?;
        Ok(Some(tag))
    }

    fn emit(&mut self, triple: Triple) -> ParseResult<()> {
        self.stats.triples_emitted += 1;
        self.sink.triple(triple).map_err(CimXmlParseError::Sink)
    }
}
