use crate::PercentEncoder;
use rdb2rdf_common::MappingVersion;

/// The draft-specific parts of the direct mapping.
///
/// Both drafts build the same kinds of triples. They differ in how IRIs are spelled and in whether
/// literals are normalized and emitted for foreign key columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappingRules {
    names: PercentEncoder,
    values: PercentEncoder,
    key_separator: char,
    reference_prefix: &'static str,
    literals_for_foreign_keys: bool,
    canonical_literals: bool,
}

impl MappingRules {
    pub fn new(version: MappingVersion) -> Self {
        match version {
            MappingVersion::Wd20110324 => Self {
                names: PercentEncoder::UNRESERVED_WITHOUT_PERIOD,
                values: PercentEncoder::UNRESERVED_WITHOUT_PERIOD,
                key_separator: '.',
                reference_prefix: "",
                literals_for_foreign_keys: false,
                canonical_literals: false,
            },
            MappingVersion::Wd20120529 => Self {
                names: PercentEncoder::IUNRESERVED_WITHOUT_HYPHEN,
                values: PercentEncoder::IUNRESERVED,
                key_separator: ';',
                reference_prefix: "ref-",
                literals_for_foreign_keys: true,
                canonical_literals: true,
            },
        }
    }

    /// Encoder for table and column names.
    pub fn names(&self) -> PercentEncoder {
        self.names
    }

    /// Encoder for key values in row IRIs.
    pub fn values(&self) -> PercentEncoder {
        self.values
    }

    /// Separates the `column=value` pairs of a row IRI and the columns of a reference predicate.
    pub fn key_separator(&self) -> char {
        self.key_separator
    }

    /// Marks reference predicates.
    pub fn reference_prefix(&self) -> &'static str {
        self.reference_prefix
    }

    /// Whether columns of foreign keys also produce literal triples.
    pub fn literals_for_foreign_keys(&self) -> bool {
        self.literals_for_foreign_keys
    }

    /// Whether values are rewritten to the canonical lexical form of their datatype.
    pub fn canonical_literals(&self) -> bool {
        self.canonical_literals
    }
}

impl From<MappingVersion> for MappingRules {
    fn from(version: MappingVersion) -> Self {
        Self::new(version)
    }
}
