use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// The SQL dialect spoken by the source database.
///
/// Only a handful of behaviours depend on the dialect: identifier quoting, pagination syntax and
/// whether temporal columns have to be extracted as epoch seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// ANSI SQL:2008.
    #[default]
    Standard,
    Sqlite,
    #[serde(alias = "mysql")]
    MySql,
    #[serde(alias = "postgresql", alias = "postgres")]
    PostgreSql,
}

impl Dialect {
    /// The character used to quote identifiers.
    pub fn quote_char(self) -> char {
        match self {
            Self::MySql => '`',
            Self::Standard | Self::Sqlite | Self::PostgreSql => '"',
        }
    }

    /// Quotes `identifier`, doubling any embedded quote character.
    pub fn quote(self, identifier: &str) -> String {
        let quote = self.quote_char();
        let mut result = String::with_capacity(identifier.len() + 2);
        result.push(quote);
        for c in identifier.chars() {
            if c == quote {
                result.push(quote);
            }
            result.push(c);
        }
        result.push(quote);
        result
    }

    /// Returns whether DATE and TIMESTAMP columns must be read as epoch seconds.
    ///
    /// The drivers of these databases do not deliver a lexical form from which the original
    /// value can be recovered, hence the value is reconstructed from the epoch in the configured
    /// time zone.
    pub fn extracts_temporal_as_epoch(self) -> bool {
        matches!(self, Self::MySql)
    }

    /// Wraps `column` (already quoted) so that it is returned as epoch seconds, for dialects that
    /// extract temporal values as epochs.
    pub fn epoch_expression(self, column: &str) -> Option<String> {
        match self {
            Self::MySql => Some(format!("UNIX_TIMESTAMP({column})")),
            Self::Standard | Self::Sqlite | Self::PostgreSql => None,
        }
    }

    /// Appends a pagination clause to `query`.
    pub fn paginate(self, query: &str, offset: u64, limit: u64) -> String {
        match self {
            Self::Standard => {
                format!("{query} OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY")
            }
            Self::Sqlite | Self::MySql | Self::PostgreSql => {
                format!("{query} LIMIT {limit} OFFSET {offset}")
            }
        }
    }

    /// Restricts `query` to at most `limit` rows.
    pub fn limit(self, query: &str, limit: u64) -> String {
        match self {
            Self::Standard => format!("{query} FETCH FIRST {limit} ROWS ONLY"),
            Self::Sqlite | Self::MySql | Self::PostgreSql => format!("{query} LIMIT {limit}"),
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
        };
        f.write_str(name)
    }
}
