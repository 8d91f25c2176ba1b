use crate::SourceError;
use rdb2rdf_common::Dialect;

/// The raw values of one result row. `None` denotes SQL `NULL`.
pub type Record = Vec<Option<Vec<u8>>>;

/// A value bound to a query parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// The kind of an object listed in the database catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    BaseTable,
    View,
    Other,
}

/// An object listed in the database catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaObject {
    pub name: String,
    pub kind: ObjectKind,
}

/// A column as reported by the database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    /// The declared type name, e.g. `VARCHAR(20)`.
    pub type_name: String,
}

/// A column of the primary key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyColumnMetadata {
    pub column: String,
    /// 1-based position of the column within the key.
    pub key_seq: u16,
}

/// A column of a foreign key ("imported key").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedKeyMetadata {
    pub column: String,
    pub target_table: String,
    /// The referenced column. `None` if the key implicitly references the primary key of the
    /// target table.
    pub target_column: Option<String>,
    /// 1-based position of the column within the key. A new key starts whenever this is `1`.
    pub key_seq: u16,
}

/// A unique constraint or unique index other than the primary key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniqueKeyMetadata {
    pub name: String,
    pub columns: Vec<String>,
}

/// A live relational connection.
///
/// Implementations report metadata in the spirit of JDBC's `DatabaseMetaData` and execute queries
/// whose result fits in memory. Streaming of large tables is achieved by the [crate::RowCursor],
/// which only issues paginated queries.
pub trait Database {
    /// Returns the dialect used to build queries for this database.
    fn dialect(&self) -> Dialect;

    /// Lists tables, views and other relations.
    fn schema_objects(&self) -> Result<Vec<SchemaObject>, SourceError>;

    /// Lists the columns of `table` in their declaration order.
    fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>, SourceError>;

    /// Lists the primary key columns of `table`. Empty if the table has no primary key.
    fn primary_key_columns(&self, table: &str) -> Result<Vec<KeyColumnMetadata>, SourceError>;

    /// Lists the foreign key columns of `table`, grouped by key and ordered by `key_seq`.
    fn imported_keys(&self, table: &str) -> Result<Vec<ImportedKeyMetadata>, SourceError>;

    /// Lists unique keys of `table` other than the primary key.
    fn unique_keys(&self, table: &str) -> Result<Vec<UniqueKeyMetadata>, SourceError>;

    /// Executes `sql` with positional `params` and returns all result rows.
    fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Record>, SourceError>;
}

impl<D: Database + ?Sized> Database for &D {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn schema_objects(&self) -> Result<Vec<SchemaObject>, SourceError> {
        (**self).schema_objects()
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>, SourceError> {
        (**self).columns(table)
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<KeyColumnMetadata>, SourceError> {
        (**self).primary_key_columns(table)
    }

    fn imported_keys(&self, table: &str) -> Result<Vec<ImportedKeyMetadata>, SourceError> {
        (**self).imported_keys(table)
    }

    fn unique_keys(&self, table: &str) -> Result<Vec<UniqueKeyMetadata>, SourceError> {
        (**self).unique_keys(table)
    }

    fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Record>, SourceError> {
        (**self).query(sql, params)
    }
}
