mod error;
mod reference;
mod row;
mod schema;

pub use error::*;
pub use reference::*;
pub use row::*;
pub use schema::*;

// Re-export some oxrdf types.
pub use oxiri::{Iri, IriParseError};
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode,
    NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Subject, SubjectRef, Term,
    TermRef, Triple, TripleRef,
};

/// Vocabularies used by the direct mapping.
pub mod vocab {
    pub use oxrdf::vocab::{rdf, xsd};
}

/// XSD value types used to compute canonical lexical forms.
pub mod xsd {
    pub use oxsdatatypes::{Boolean, Date, DateTime, Decimal, Double, Integer, Time};
}
