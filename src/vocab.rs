//! RDF vocabularies used by the CIM/XML dialect

use crate::model::NamedNode;
use std::sync::LazyLock;

/// RDF vocabulary namespace
pub mod rdf {
    use super::*;

    /// The RDF namespace IRI
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    /// rdf:type predicate
    pub static TYPE: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}type", NAMESPACE)));

    /// rdf:langString datatype
    pub static LANG_STRING: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}langString", NAMESPACE)));
}

/// XML Schema datatypes vocabulary namespace
pub mod xsd {
    use super::*;

    /// The XSD namespace IRI
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

    /// xsd:string datatype
    pub static STRING: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}string", NAMESPACE)));

    /// xsd:boolean datatype
    pub static BOOLEAN: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}boolean", NAMESPACE)));

    /// xsd:integer datatype
    pub static INTEGER: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}integer", NAMESPACE)));

    /// xsd:float datatype
    pub static FLOAT: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}float", NAMESPACE)));

    /// xsd:double datatype
    pub static DOUBLE: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}double", NAMESPACE)));

    /// xsd:decimal datatype
    pub static DECIMAL: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}decimal", NAMESPACE)));

    /// xsd:dateTime datatype
    pub static DATE_TIME: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}dateTime", NAMESPACE)));

    /// xsd:date datatype
    pub static DATE: LazyLock<NamedNode> =
        LazyLock::new(|| NamedNode::new_unchecked(format!("{}date", NAMESPACE)));
}
