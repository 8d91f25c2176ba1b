use crate::{
    ColumnMetadata, Database, ImportedKeyMetadata, KeyColumnMetadata, ObjectKind, Record,
    SchemaObject, SourceError, SqlParam, UniqueKeyMetadata,
};
use rdb2rdf_common::Dialect;
use rdb2rdf_model::SqlType;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OpenFlags};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Number of virtual machine instructions between two timeout checks.
const PROGRESS_HANDLER_PERIOD: i32 = 1_000;

/// A [Database] backed by SQLite.
///
/// Metadata is read from `sqlite_master` and the table-valued pragma functions. The
/// `pragma_foreign_key_list` sequence number provides the ordering hint for composite foreign
/// keys.
pub struct SqliteDatabase {
    conn: Connection,
    timeout: Option<Duration>,
    /// Deadline of the running call in milliseconds since `started`. `0` means no deadline.
    deadline: Arc<AtomicU64>,
    started: Instant,
}

impl SqliteDatabase {
    /// Opens the database file at `path` in read-only mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening SQLite database");
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    /// Creates an empty in-memory database.
    pub fn open_in_memory() -> Result<Self, SourceError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            timeout: None,
            deadline: Arc::new(AtomicU64::new(0)),
            started: Instant::now(),
        }
    }

    /// Interrupts every call that runs longer than `timeout`.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        if timeout.is_some() {
            let deadline = Arc::clone(&self.deadline);
            let started = self.started;
            self.conn.progress_handler(
                PROGRESS_HANDLER_PERIOD,
                Some(move || {
                    let deadline = deadline.load(Ordering::Relaxed);
                    deadline != 0 && elapsed_millis(started) > deadline
                }),
            );
        }
        self
    }

    /// Executes one or more statements, e.g. to set up a schema.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SourceError> {
        Ok(self.conn.execute_batch(sql)?)
    }

    /// Closes the connection, reporting errors that would otherwise be swallowed on drop.
    pub fn close(self) -> Result<(), SourceError> {
        debug!("Closing SQLite database");
        self.conn.close().map_err(|(_, error)| error.into())
    }

    fn arm_deadline(&self) -> DeadlineGuard<'_> {
        if let Some(timeout) = self.timeout {
            let timeout = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            let deadline = elapsed_millis(self.started).saturating_add(timeout).max(1);
            self.deadline.store(deadline, Ordering::Relaxed);
        }
        DeadlineGuard {
            deadline: &self.deadline,
        }
    }

    fn classify(&self, error: rusqlite::Error) -> SourceError {
        match (&error, self.timeout) {
            (rusqlite::Error::SqliteFailure(failure, _), Some(timeout))
                if failure.code == ErrorCode::OperationInterrupted =>
            {
                SourceError::Timeout(timeout)
            }
            _ => SourceError::Sqlite(error),
        }
    }

    fn query_strings(
        &self,
        sql: &str,
        param: &str,
        columns: usize,
    ) -> Result<Vec<Vec<Option<String>>>, SourceError> {
        let records = self.query(sql, &[SqlParam::Text(param.to_owned())])?;
        records
            .into_iter()
            .map(|record| {
                if record.len() != columns {
                    return Err(SourceError::Malformed(format!(
                        "expected {columns} columns from metadata query, got {}",
                        record.len()
                    )));
                }
                record
                    .into_iter()
                    .map(|value| {
                        value
                            .map(|bytes| {
                                String::from_utf8(bytes).map_err(|error| {
                                    SourceError::Malformed(format!(
                                        "metadata is not valid UTF-8: {error}"
                                    ))
                                })
                            })
                            .transpose()
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn schema_objects(&self) -> Result<Vec<SchemaObject>, SourceError> {
        let rows = self.query(
            "SELECT name, type FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
            &[],
        )?;
        rows.into_iter()
            .map(|record| match record.as_slice() {
                [Some(name), Some(kind)] => Ok(SchemaObject {
                    name: String::from_utf8_lossy(name).into_owned(),
                    kind: match kind.as_slice() {
                        b"table" => ObjectKind::BaseTable,
                        b"view" => ObjectKind::View,
                        _ => ObjectKind::Other,
                    },
                }),
                _ => Err(SourceError::Malformed(
                    "sqlite_master returned an incomplete row".to_owned(),
                )),
            })
            .collect()
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnMetadata>, SourceError> {
        self.query_strings(
            "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid",
            table,
            2,
        )?
        .into_iter()
        .map(|mut values| {
            let type_name = values.pop().flatten().unwrap_or_default();
            let name = values.pop().flatten().ok_or_else(|| {
                SourceError::Malformed(format!("column without name in table '{table}'"))
            })?;
            Ok(ColumnMetadata {
                name,
                type_name: normalize_type_name(&type_name),
            })
        })
        .collect()
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<KeyColumnMetadata>, SourceError> {
        self.query_strings(
            "SELECT name, pk FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk",
            table,
            2,
        )?
        .into_iter()
        .map(|values| match values.as_slice() {
            [Some(column), Some(key_seq)] => Ok(KeyColumnMetadata {
                column: column.clone(),
                key_seq: parse_key_seq(key_seq)?,
            }),
            _ => Err(SourceError::Malformed(format!(
                "incomplete primary key metadata for table '{table}'"
            ))),
        })
        .collect()
    }

    fn imported_keys(&self, table: &str) -> Result<Vec<ImportedKeyMetadata>, SourceError> {
        self.query_strings(
            "SELECT seq, \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1) \
             ORDER BY id, seq",
            table,
            4,
        )?
        .into_iter()
        .map(|values| match values.as_slice() {
            [Some(seq), Some(target_table), Some(column), target_column] => {
                Ok(ImportedKeyMetadata {
                    column: column.clone(),
                    target_table: target_table.clone(),
                    target_column: target_column.clone(),
                    key_seq: parse_key_seq(seq)?.saturating_add(1),
                })
            }
            _ => Err(SourceError::Malformed(format!(
                "incomplete foreign key metadata for table '{table}'"
            ))),
        })
        .collect()
    }

    fn unique_keys(&self, table: &str) -> Result<Vec<UniqueKeyMetadata>, SourceError> {
        let indexes = self.query_strings(
            "SELECT name FROM pragma_index_list(?1) \
             WHERE \"unique\" = 1 AND origin IN ('u', 'c') AND partial = 0 ORDER BY name",
            table,
            1,
        )?;

        let mut keys = Vec::new();
        for name in indexes.into_iter().filter_map(|mut values| values.pop().flatten()) {
            let columns = self
                .query_strings(
                    "SELECT name FROM pragma_index_info(?1) ORDER BY seqno",
                    &name,
                    1,
                )?
                .into_iter()
                .map(|mut values| values.pop().flatten())
                .collect::<Option<Vec<_>>>();
            // Indexes on expressions have unnamed columns and cannot identify rows by value.
            if let Some(columns) = columns.filter(|columns| !columns.is_empty()) {
                keys.push(UniqueKeyMetadata { name, columns });
            }
        }
        Ok(keys)
    }

    fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Record>, SourceError> {
        let _deadline = self.arm_deadline();
        let mut statement = self.conn.prepare(sql).map_err(|e| self.classify(e))?;
        let column_count = statement.column_count();
        let mut rows = statement
            .query(params_from_iter(params.iter().map(to_value)))
            .map_err(|e| self.classify(e))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(|e| self.classify(e))? {
            let mut record = Vec::with_capacity(column_count);
            for index in 0..column_count {
                record.push(to_bytes(row.get_ref(index)?));
            }
            records.push(record);
        }
        Ok(records)
    }
}

/// Clears the deadline of a call once it completes.
struct DeadlineGuard<'a> {
    deadline: &'a AtomicU64,
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        self.deadline.store(0, Ordering::Relaxed);
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn parse_key_seq(value: &str) -> Result<u16, SourceError> {
    value
        .parse()
        .map_err(|_| SourceError::Malformed(format!("invalid key sequence '{value}'")))
}

fn to_value(param: &SqlParam) -> Value {
    match param {
        SqlParam::Integer(value) => Value::Integer(*value),
        SqlParam::Real(value) => Value::Real(*value),
        SqlParam::Text(value) => Value::Text(value.clone()),
        SqlParam::Blob(value) => Value::Blob(value.clone()),
    }
}

fn to_bytes(value: ValueRef<'_>) -> Option<Vec<u8>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(value) => Some(value.to_string().into_bytes()),
        ValueRef::Real(value) => Some(value.to_string().into_bytes()),
        ValueRef::Text(value) | ValueRef::Blob(value) => Some(value.to_vec()),
    }
}

/// Folds SQLite's free-form declared types into names understood by [SqlType].
///
/// Names that are already known are kept. Others follow SQLite's type affinity rules. A column
/// without declared type is treated as text.
fn normalize_type_name(declared: &str) -> String {
    if declared.trim().is_empty() {
        return "TEXT".to_owned();
    }
    if !matches!(SqlType::from_type_name(declared), SqlType::Other(_)) {
        return declared.to_owned();
    }

    let upper = declared.to_ascii_uppercase();
    let affinity = if upper.contains("INT") {
        "INTEGER"
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        "TEXT"
    } else if upper.contains("BLOB") {
        "BLOB"
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "DOUBLE"
    } else {
        return declared.to_owned();
    };
    affinity.to_owned()
}
