use crate::ConfigError;
use rdb2rdf_model::{ForeignKey, ModelError, ValueEncodingError};
use std::error::Error;
use std::io;
use std::time::Duration;

/// An error that stops a mapping run or, for [MappingError::Encoding], a single row.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MappingError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Database metadata could not be read.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A foreign key matched more than one row.
    #[error(transparent)]
    ReferentialIntegrity(#[from] ReferentialIntegrityError),
    /// A column type has no XSD equivalent.
    #[error(transparent)]
    UnknownDatatype(#[from] UnknownDatatypeError),
    /// A value could not be decoded or encoded. Only the affected row is lost.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// A chain of primary keys that are foreign keys does not terminate.
    #[error(transparent)]
    KeyChainCycle(#[from] KeyChainCycleError),
    /// Error from the database driver.
    #[error("Database access failed: {0}")]
    Database(#[source] Box<dyn Error + Send + Sync + 'static>),
    /// A database call did not complete in time.
    #[error("Database call exceeded the timeout of {0:?}")]
    Timeout(Duration),
    /// The graph sink rejected a triple or failed to flush.
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("The mapping run was cancelled")]
    Cancelled,
}

impl MappingError {
    /// Returns whether the error only affects the row being converted.
    pub fn is_row_local(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }

    /// Wraps an arbitrary driver error.
    pub fn database(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Database(error.into())
    }
}

/// Database metadata is unavailable or inconsistent.
#[derive(Debug, thiserror::Error)]
#[error("Schema metadata unavailable for '{subject}': {source}")]
pub struct SchemaError {
    subject: String,
    #[source]
    source: Box<dyn Error + Send + Sync + 'static>,
}

impl SchemaError {
    /// Builds an error for `subject` (usually a table name) from an underlying error.
    pub fn new(
        subject: impl Into<String>,
        error: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            source: error.into(),
        }
    }

    /// Builds an error for `subject` from a printable message.
    pub fn msg(subject: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(subject, msg.into())
    }

    /// The table (or catalog object) whose metadata was unavailable.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl From<ModelError> for SchemaError {
    fn from(error: ModelError) -> Self {
        let subject = match &error {
            ModelError::PrimaryKeyKind { table, .. }
            | ModelError::ReferencedKeyKind { table, .. }
            | ModelError::UnknownKeyColumn { table, .. }
            | ModelError::ForeignKeyArity { table, .. }
            | ModelError::EmptyKey { table }
            | ModelError::RowArity { table, .. } => table.clone(),
            _ => String::new(),
        };
        Self::new(subject, error)
    }
}

/// A foreign key lookup matched more than one row.
#[derive(Debug, thiserror::Error)]
#[error(
    "Foreign key ({}) of table '{}' matches more than one row of table '{}'",
    .key.columns.join(", "),
    .key.table,
    .key.references.table
)]
pub struct ReferentialIntegrityError {
    pub key: ForeignKey,
}

/// No XSD datatype is known for a column type.
#[derive(Debug, thiserror::Error)]
#[error("No XSD datatype is known for type '{sql_type}' of column '{table}.{column}'")]
pub struct UnknownDatatypeError {
    pub table: String,
    pub column: String,
    pub sql_type: String,
}

/// A value could not be turned into an IRI, blank node or literal.
#[derive(Debug, thiserror::Error)]
#[error("Cannot encode value of column '{table}.{column}': {reason}")]
pub struct EncodingError {
    pub table: String,
    pub column: String,
    pub reason: String,
}

impl From<ValueEncodingError> for EncodingError {
    fn from(error: ValueEncodingError) -> Self {
        Self {
            reason: error.source.to_string(),
            table: error.table,
            column: error.column,
        }
    }
}

impl From<ValueEncodingError> for MappingError {
    fn from(error: ValueEncodingError) -> Self {
        Self::Encoding(error.into())
    }
}

/// Following primary keys that are foreign keys led back to an already visited row, or exceeded
/// the configured depth.
#[derive(Debug, thiserror::Error)]
#[error("Primary key chain does not terminate: {}", .chain.join(" -> "))]
pub struct KeyChainCycleError {
    /// The visited rows, rendered as `table(key values)`.
    pub chain: Vec<String>,
}

/// An error related to the graph sink.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SinkError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
}
