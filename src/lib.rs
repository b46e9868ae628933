//! # cimxml
//!
//! A single-pass streaming parser for CIM/XML, the RDF/XML profile used
//! by IEC 61970/61968 power-grid model exchanges (CGMES and friends).
//!
//! Instead of building a DOM or running a generic XML parser, this crate
//! reads the byte stream once and pushes subject/predicate/object
//! statements into a [`StatementSink`] the moment each element completes:
//!
//! - all namespaces are declared on the `rdf:RDF` root and are immutable
//!   afterwards
//! - resources are identified by `rdf:about`, `rdf:ID` or `rdf:nodeID`;
//!   any element with such an attribute is a typed resource, any element
//!   without one is a property of its enclosing resource
//! - `rdf:li` and `rdf:parseType` values other than `Resource` are
//!   rejected outright
//! - every violation is a fatal error carrying the byte offset where it
//!   was detected; there is no recovery mode
//!
//! Repeated qualified names, references, datatypes and language tags are
//! interned, so a gigabyte-scale export parses with allocation
//! proportional to its vocabulary, not its size.
//!
//! ## Examples
//!
//! ```rust
//! use cimxml::{CimXmlParser, MemorySink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = br##"<rdf:RDF
//!   xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
//!   xmlns:cim="http://iec.ch/TC57/2013/CIM-schema-cim16#">
//!   <cim:Location rdf:ID="_loc1">
//!     <cim:Location.CoordinateSystem rdf:resource="#_cs1"/>
//!   </cim:Location>
//! </rdf:RDF>"##;
//!
//! let mut sink = MemorySink::new();
//! let stats = CimXmlParser::new()
//!     .with_base_iri("http://example.org/")?
//!     .parse_slice(doc, &mut sink)?;
//!
//! assert_eq!(stats.triples_emitted, 2);
//! for triple in sink.triples() {
//!     println!("{triple}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod datatype;
mod error;
pub mod model;
mod parser;
pub(crate) mod scan;
pub mod sink;
pub mod vocab;

pub use datatype::{Datatype, DatatypeRegistry, SimpleDatatypeRegistry};
pub use error::{CimXmlParseError, CimXmlSyntaxError, ParseResult};
pub use model::*;
pub use parser::CimXmlParser;
pub use sink::{MemorySink, ParseStatistics, StatementSink};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
