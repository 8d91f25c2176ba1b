//! The W3C Direct Mapping of relational data to RDF.
//!
//! Two working drafts are supported, selected with [MappingVersion](rdb2rdf_common::MappingVersion):
//! WD-2011-03-24 and WD-2012-05-29. [MappingRules] captures what differs between them, the
//! [DirectMappingEngine] applies them to one row at a time.

mod engine;
mod identity;
mod iri;
mod literal;
mod rules;

pub use engine::DirectMappingEngine;
pub use iri::PercentEncoder;
pub use rules::MappingRules;
