//! Statement sink collaborator interface
//!
//! The parser pushes its output into a [`StatementSink`] in strict document
//! order: `start`, then namespace/base declarations as they appear on the
//! root element, then triples as their elements complete, then `finish`.
//! There is no quad event; the dialect carries no named graphs. A sink
//! failure aborts the parse immediately.

use serde::{Deserialize, Serialize};

use crate::model::Triple;

/// Receiver for the ordered event stream of one parse run.
///
/// All methods except [`triple`](StatementSink::triple) have no-op
/// defaults, so a sink that only cares about statements implements one
/// method. Errors are surfaced to the caller as
/// [`CimXmlParseError::Sink`](crate::CimXmlParseError::Sink) and stop the
/// parse; events already delivered stand.
pub trait StatementSink {
    /// Called once, before any other event.
    fn start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per emitted statement, in document order.
    fn triple(&mut self, triple: Triple) -> anyhow::Result<()>;

    /// Reports the effective base IRI, when one is configured or declared.
    fn base(&mut self, _iri: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Reports one namespace declaration from the root element. The
    /// default namespace is reported with an empty prefix.
    fn prefix(&mut self, _prefix: &str, _iri: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once, after the root element closed. Not called on error.
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Sink that collects everything in memory, mainly for tests and small
/// documents.
#[derive(Debug, Default)]
pub struct MemorySink {
    triples: Vec<Triple>,
    prefixes: Vec<(String, String)>,
    base: Option<String>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected triples in emission order.
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn into_triples(self) -> Vec<Triple> {
        self.triples
    }

    /// Namespace declarations in document order, default namespace as `""`.
    pub fn prefixes(&self) -> &[(String, String)] {
        &self.prefixes
    }

    /// The base IRI reported by the parser, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// True once `finish()` was delivered, i.e. the parse completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl StatementSink for MemorySink {
    fn triple(&mut self, triple: Triple) -> anyhow::Result<()> {
        self.triples.push(triple);
        Ok(())
    }

    fn base(&mut self, iri: &str) -> anyhow::Result<()> {
        self.base = Some(iri.to_owned());
        Ok(())
    }

    fn prefix(&mut self, prefix: &str, iri: &str) -> anyhow::Result<()> {
        self.prefixes.push((prefix.to_owned(), iri.to_owned()));
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Counters reported by a successful parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStatistics {
    /// Statements delivered to the sink.
    pub triples_emitted: u64,
    /// Opening tags processed, root element included.
    pub elements_parsed: u64,
    /// Bytes consumed from the input stream.
    pub bytes_consumed: u64,
}
