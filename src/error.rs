//! Error types for CIM/XML parsing
//!
//! Every grammar or resolution failure is fatal and non-retriable: the
//! parse aborts at the first violation, triples already delivered to the
//! sink stand, and `finish()` is never invoked. Syntax errors carry the
//! absolute byte offset of the offending input uniformly.

use crate::model::NamedNode;

/// A fatal violation of the supported CIM/XML grammar.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} (byte {offset})")]
pub struct CimXmlSyntaxError {
    message: String,
    offset: u64,
}

impl CimXmlSyntaxError {
    pub(crate) fn new(message: impl Into<String>, offset: u64) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// Human-readable description, without the position suffix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Absolute byte offset into the input stream where the error was
    /// detected.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Any error raised while parsing a CIM/XML document.
#[derive(Debug, thiserror::Error)]
pub enum CimXmlParseError {
    /// The input violates the supported grammar or cannot be resolved.
    #[error(transparent)]
    Syntax(#[from] CimXmlSyntaxError),

    /// The underlying stream failed.
    #[error("I/O error while reading input: {0}")]
    Io(#[from] std::io::Error),

    /// The statement sink rejected an event.
    #[error("statement sink failed: {0}")]
    Sink(#[source] anyhow::Error),

    /// The datatype registry rejected a datatype IRI.
    #[error("datatype registry failed for {iri}: {source}")]
    Datatype {
        iri: NamedNode,
        #[source]
        source: anyhow::Error,
    },
}

impl CimXmlParseError {
    pub(crate) fn syntax(message: impl Into<String>, offset: u64) -> Self {
        CimXmlSyntaxError::new(message, offset).into()
    }

    /// The byte offset, when this is a syntax error.
    pub fn offset(&self) -> Option<u64> {
        match self {
            CimXmlParseError::Syntax(e) => Some(e.offset()),
            _ => None,
        }
    }
}

/// Result alias for parse operations.
pub type ParseResult<T> = Result<T, CimXmlParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display_includes_offset() {
        let err = CimXmlSyntaxError::new("unexpected attribute", 42);
        assert_eq!(err.to_string(), "unexpected attribute (byte 42)");
        assert_eq!(err.offset(), 42);
    }

    #[test]
    fn test_parse_error_exposes_syntax_offset() {
        let err = CimXmlParseError::syntax("bad name", 7);
        assert_eq!(err.offset(), Some(7));
        assert_eq!(err.to_string(), "bad name (byte 7)");

        let io: CimXmlParseError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(io.offset(), None);
    }
}
