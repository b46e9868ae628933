//! RDF term model for the CIM/XML parser
//!
//! Terms are backed by shared `Arc<str>` storage so that the parser's
//! interning caches can hand out the same allocation for every occurrence
//! of an IRI or blank-node label within one parse run. Cloning a term is a
//! reference-count bump, which is what makes per-element subject/predicate
//! bookkeeping cheap on multi-hundred-megabyte inputs.

use std::fmt;
use std::sync::Arc;

pub use oxilangtag::LanguageTagParseError;
pub use oxiri::IriParseError;

/// An IRI-identified node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedNode {
    iri: Arc<str>,
}

impl NamedNode {
    /// Creates a named node, validating the IRI with `oxiri`.
    pub fn new(iri: impl Into<String>) -> Result<Self, IriParseError> {
        let iri = iri.into();
        oxiri::Iri::parse(iri.as_str())?;
        Ok(Self::new_unchecked(iri))
    }

    /// Creates a named node without validating the IRI.
    ///
    /// The caller must guarantee the string is a valid absolute IRI.
    pub fn new_unchecked(iri: impl Into<String>) -> Self {
        Self {
            iri: Arc::from(iri.into()),
        }
    }

    /// The IRI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.iri
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

impl PartialEq<str> for NamedNode {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

/// Error raised when a blank-node label is not a valid NCName-like token.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid blank node label '{label}'")]
pub struct BlankNodeIdParseError {
    label: String,
}

/// A document-scoped anonymous node identified by its label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlankNode {
    id: Arc<str>,
}

impl BlankNode {
    /// Creates a blank node from a document-local label.
    pub fn new(id: impl Into<String>) -> Result<Self, BlankNodeIdParseError> {
        let id = id.into();
        if !is_valid_blank_node_label(&id) {
            return Err(BlankNodeIdParseError { label: id });
        }
        Ok(Self::new_unchecked(id))
    }

    /// Creates a blank node without validating the label.
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self {
            id: Arc::from(id.into()),
        }
    }

    /// The label as a string slice, without the `_:` marker.
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

fn is_valid_blank_node_label(label: &str) -> bool {
    let mut chars = label.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// An RDF literal: a lexical form with an optional language tag or datatype.
///
/// The two annotations are mutually exclusive by construction; there is no
/// way to build a literal carrying both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    language: Option<Arc<str>>,
    datatype: Option<NamedNode>,
}

impl Literal {
    /// Creates a plain string literal.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// Creates a language-tagged literal, validating the tag as BCP47.
    ///
    /// The tag is lowercased, the usual RDF canonical form.
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, LanguageTagParseError> {
        let language = language.into().to_ascii_lowercase();
        oxilangtag::LanguageTag::parse(language.as_str())?;
        Ok(Self::new_language_tagged_literal_unchecked(value, language))
    }

    /// Creates a language-tagged literal from an already-validated tag.
    pub fn new_language_tagged_literal_unchecked(
        value: impl Into<String>,
        language: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    /// Creates a typed literal.
    pub fn new_typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: Some(datatype),
        }
    }

    /// The lexical form.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The language tag, if this is a language-tagged literal.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The datatype IRI: the explicit one, `rdf:langString` for
    /// language-tagged literals, `xsd:string` otherwise.
    pub fn datatype(&self) -> &NamedNode {
        match &self.datatype {
            Some(dt) => dt,
            None if self.language.is_some() => &crate::vocab::rdf::LANG_STRING,
            None => &crate::vocab::xsd::STRING,
        }
    }

    /// True when neither a language tag nor an explicit datatype is set.
    pub fn is_plain(&self) -> bool {
        self.language.is_none() && self.datatype.is_none()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.value.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                _ => fmt::Write::write_char(f, c)?,
            }
        }
        f.write_str("\"")?;
        if let Some(lang) = &self.language {
            write!(f, "@{lang}")?;
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^{dt}")?;
        }
        Ok(())
    }
}

/// A triple subject: a named node or a blank node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

impl From<NamedNode> for Subject {
    fn from(node: NamedNode) -> Self {
        Subject::NamedNode(node)
    }
}

impl From<BlankNode> for Subject {
    fn from(node: BlankNode) -> Self {
        Subject::BlankNode(node)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::NamedNode(n) => n.fmt(f),
            Subject::BlankNode(n) => n.fmt(f),
        }
    }
}

/// A triple object: a named node, a blank node, or a literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::NamedNode(node)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

impl From<Subject> for Term {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::NamedNode(n) => Term::NamedNode(n),
            Subject::BlankNode(n) => Term::BlankNode(n),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(n) => n.fmt(f),
            Term::BlankNode(n) => n.fmt(f),
            Term::Literal(l) => l.fmt(f),
        }
    }
}

/// A subject-predicate-object statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Term,
}

impl Triple {
    pub fn new(
        subject: impl Into<Subject>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node_validates_iri() {
        assert!(NamedNode::new("http://example.org/a").is_ok());
        assert!(NamedNode::new("not an iri").is_err());
    }

    #[test]
    fn test_named_node_display_wraps_in_angle_brackets() {
        let n = NamedNode::new("http://example.org/a").unwrap();
        assert_eq!(n.to_string(), "<http://example.org/a>");
    }

    #[test]
    fn test_blank_node_label_validation() {
        assert!(BlankNode::new("b0").is_ok());
        assert!(BlankNode::new("_x-1.y").is_ok());
        assert!(BlankNode::new("").is_err());
        assert!(BlankNode::new("1abc").is_err());
        assert!(BlankNode::new("a:b").is_err());
    }

    #[test]
    fn test_plain_literal_datatype_is_xsd_string() {
        let l = Literal::new("hello");
        assert_eq!(l.value(), "hello");
        assert_eq!(l.language(), None);
        assert_eq!(l.datatype().as_str(), crate::vocab::xsd::STRING.as_str());
        assert!(l.is_plain());
    }

    #[test]
    fn test_language_literal_datatype_is_lang_string() {
        let l = Literal::new_language_tagged_literal("hallo", "DE").unwrap();
        assert_eq!(l.language(), Some("de"));
        assert_eq!(
            l.datatype().as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString"
        );
    }

    #[test]
    fn test_invalid_language_tag_rejected() {
        assert!(Literal::new_language_tagged_literal("x", "not a tag").is_err());
    }

    #[test]
    fn test_typed_literal_keeps_datatype() {
        let dt = NamedNode::new("http://www.w3.org/2001/XMLSchema#float").unwrap();
        let l = Literal::new_typed("1.5", dt.clone());
        assert_eq!(l.datatype(), &dt);
        assert_eq!(l.language(), None);
    }

    #[test]
    fn test_literal_display_escapes() {
        let l = Literal::new("say \"hi\"\n");
        assert_eq!(l.to_string(), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn test_triple_display_is_ntriples_like() {
        let t = Triple::new(
            NamedNode::new("http://example.org/s").unwrap(),
            NamedNode::new("http://example.org/p").unwrap(),
            Literal::new("o"),
        );
        assert_eq!(
            t.to_string(),
            "<http://example.org/s> <http://example.org/p> \"o\" ."
        );
    }

    #[test]
    fn test_subject_converts_into_term() {
        let s: Subject = BlankNode::new("n1").unwrap().into();
        let t: Term = s.clone().into();
        assert_eq!(t, Term::BlankNode(BlankNode::new("n1").unwrap()));
        assert_eq!(s.to_string(), "_:n1");
    }
}
