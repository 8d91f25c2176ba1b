use rdb2rdf_common::MappingError;
use std::time::Duration;

/// An error raised while talking to the database.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// The call was interrupted because it exceeded the configured timeout.
    #[error("Database call exceeded the timeout of {0:?}")]
    Timeout(Duration),
    /// The database returned a result that does not have the expected shape.
    #[error("Unexpected database result: {0}")]
    Malformed(String),
}

impl From<SourceError> for MappingError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Timeout(timeout) => Self::Timeout(timeout),
            other => Self::database(other),
        }
    }
}
