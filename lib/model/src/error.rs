use crate::KeyKind;
use std::str::Utf8Error;
use thiserror::Error;

/// A violation of the structural invariants of a table descriptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    #[error("The primary key of table '{table}' has kind {kind:?}, expected Primary")]
    PrimaryKeyKind { table: String, kind: KeyKind },
    #[error("A foreign key of table '{table}' references a key of kind {kind:?}, expected Reference")]
    ReferencedKeyKind { table: String, kind: KeyKind },
    #[error("Column '{column}' of a key of table '{table}' is not part of the header")]
    UnknownKeyColumn { table: String, column: String },
    #[error("Foreign key of table '{table}' has {local} local columns but references {referenced} columns")]
    ForeignKeyArity {
        table: String,
        local: usize,
        referenced: usize,
    },
    #[error("A key of table '{table}' has no columns")]
    EmptyKey { table: String },
    #[error("Row of table '{table}' has {actual} values but the header has {expected} columns")]
    RowArity {
        table: String,
        expected: usize,
        actual: usize,
    },
}

/// A column value that is not valid UTF-8 text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Value of column '{column}' in table '{table}' is not valid UTF-8: {source}")]
pub struct ValueEncodingError {
    pub table: String,
    pub column: String,
    #[source]
    pub source: Utf8Error,
}
