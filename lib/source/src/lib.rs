//! Access to the relational source of a direct mapping run.
//!
//! The [Database] trait abstracts over the metadata and query capabilities of a live connection.
//! On top of it, the [SchemaCatalog] derives table descriptors, the [RowCursor] streams the rows of
//! all base tables and the [ForeignKeyResolver] looks up the rows referenced by foreign keys.
//!
//! None of these components own the connection. They borrow it from the caller, which is
//! responsible for closing it.

mod catalog;
mod cursor;
mod database;
mod error;
mod resolver;
mod sql;
mod sqlite;
mod temporal;

pub use catalog::SchemaCatalog;
pub use cursor::{CursorOptions, RowCursor, TableProgress};
pub use database::{
    ColumnMetadata, Database, ImportedKeyMetadata, KeyColumnMetadata, ObjectKind, Record,
    SchemaObject, SqlParam, UniqueKeyMetadata,
};
pub use error::SourceError;
pub use resolver::ForeignKeyResolver;
pub use sql::SqlBuilder;
pub use sqlite::SqliteDatabase;
