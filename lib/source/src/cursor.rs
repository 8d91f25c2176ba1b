use crate::sql::decode_record;
use crate::{Database, Record, SchemaCatalog, SourceError, SqlBuilder};
use rdb2rdf_common::error::SchemaError;
use rdb2rdf_common::{MappingConfig, MappingError};
use rdb2rdf_model::{Row, Table};
use std::collections::VecDeque;
use std::sync::Arc;
use time::UtcOffset;
use tracing::{debug, info, warn};

/// Options of a [RowCursor].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorOptions {
    /// Number of rows fetched per round trip.
    pub fetch_size: u32,
    /// Time zone used to reconstruct temporal values extracted as epoch seconds.
    pub time_offset: UtcOffset,
    /// Skip tables whose metadata cannot be read instead of failing.
    pub skip_invalid_tables: bool,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            fetch_size: 1000,
            time_offset: UtcOffset::UTC,
            skip_invalid_tables: false,
        }
    }
}

impl CursorOptions {
    pub fn from_config(config: &MappingConfig) -> Result<Self, MappingError> {
        Ok(Self {
            fetch_size: config.fetch_size.max(1),
            time_offset: config.utc_offset()?,
            skip_invalid_tables: config.skip_invalid_tables,
        })
    }
}

/// Progress of the scan of a single table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableProgress {
    pub table: String,
    pub rows_read: u64,
    /// Row count reported when the table was entered. Only used for reporting.
    pub estimated_rows: Option<u64>,
}

impl TableProgress {
    /// Percentage of the estimated rows that have been read.
    #[allow(clippy::cast_precision_loss, reason = "Only used for reporting")]
    pub fn percentage(&self) -> Option<f64> {
        self.estimated_rows
            .filter(|estimate| *estimate > 0)
            .map(|estimate| (self.rows_read as f64 / estimate as f64 * 100.0).min(100.0))
    }
}

struct TableScan {
    table: Arc<Table>,
    offset: u64,
    buffer: VecDeque<Record>,
    source_exhausted: bool,
    progress: TableProgress,
}

enum CursorState {
    BeforeTable,
    OnTable(TableScan),
    Exhausted,
}

/// Streams the rows of all base tables, one table after the other.
///
/// Rows are fetched in pages of [CursorOptions::fetch_size], so at most one page is held in
/// memory regardless of the table size. The descriptor of the current table is kept until the
/// cursor moves on to the next table.
pub struct RowCursor<'db, D: Database + ?Sized> {
    db: &'db D,
    catalog: SchemaCatalog<'db, D>,
    sql: SqlBuilder,
    options: CursorOptions,
    pending_tables: Option<VecDeque<String>>,
    state: CursorState,
    completed: Vec<TableProgress>,
}

impl<'db, D: Database + ?Sized> RowCursor<'db, D> {
    pub fn new(db: &'db D, options: CursorOptions) -> Self {
        Self {
            db,
            catalog: SchemaCatalog::new(db),
            sql: SqlBuilder::new(db.dialect()),
            options,
            pending_tables: None,
            state: CursorState::BeforeTable,
            completed: Vec::new(),
        }
    }

    /// Returns the next row, moving on to the next table when the current one is exhausted.
    ///
    /// Returns [None] once all tables have been read.
    pub fn next(&mut self) -> Result<Option<Row>, MappingError> {
        loop {
            if matches!(self.state, CursorState::BeforeTable) {
                self.enter_next_table()?;
                continue;
            }
            let CursorState::OnTable(scan) = &mut self.state else {
                return Ok(None);
            };

            if scan.buffer.is_empty() && !scan.source_exhausted {
                fetch_page(self.db, &self.sql, scan, u64::from(self.options.fetch_size))?;
            }
            if let Some(record) = scan.buffer.pop_front() {
                scan.progress.rows_read += 1;
                let row = decode_record(
                    &scan.table,
                    Some(scan.progress.rows_read),
                    record,
                    self.sql.dialect(),
                    self.options.time_offset,
                )?;
                return Ok(Some(row));
            }
            self.leave_table();
        }
    }

    /// The descriptor of the table currently being read.
    pub fn current_table(&self) -> Option<&Arc<Table>> {
        match &self.state {
            CursorState::OnTable(scan) => Some(&scan.table),
            CursorState::BeforeTable | CursorState::Exhausted => None,
        }
    }

    /// The progress of the table currently being read.
    pub fn progress(&self) -> Option<&TableProgress> {
        match &self.state {
            CursorState::OnTable(scan) => Some(&scan.progress),
            CursorState::BeforeTable | CursorState::Exhausted => None,
        }
    }

    /// The progress of all tables that have been read completely.
    pub fn completed_tables(&self) -> &[TableProgress] {
        &self.completed
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, CursorState::Exhausted)
    }

    fn enter_next_table(&mut self) -> Result<(), MappingError> {
        if self.pending_tables.is_none() {
            let tables = self.catalog.tables()?;
            info!(tables = tables.len(), "Found base tables");
            self.pending_tables = Some(tables.into());
        }

        while let Some(name) = self
            .pending_tables
            .as_mut()
            .and_then(VecDeque::pop_front)
        {
            let table = match self.catalog.table(&name) {
                Ok(table) => table,
                Err(error) if self.options.skip_invalid_tables && !is_timeout(&error) => {
                    warn!(table = %name, %error, "Skipping table with unreadable metadata");
                    continue;
                }
                Err(error) => return Err(error.into()),
            };

            let estimated_rows = self.estimate_rows(&name)?;
            info!(table = %name, estimated_rows = ?estimated_rows, "Reading table");
            self.state = CursorState::OnTable(TableScan {
                table,
                offset: 0,
                buffer: VecDeque::new(),
                source_exhausted: false,
                progress: TableProgress {
                    table: name,
                    rows_read: 0,
                    estimated_rows,
                },
            });
            return Ok(());
        }

        self.state = CursorState::Exhausted;
        Ok(())
    }

    fn leave_table(&mut self) {
        if let CursorState::OnTable(scan) =
            std::mem::replace(&mut self.state, CursorState::BeforeTable)
        {
            info!(
                table = %scan.progress.table,
                rows = scan.progress.rows_read,
                "Finished table"
            );
            self.completed.push(scan.progress);
        }
    }

    /// Counts the rows of `table` for progress reports. Only a timeout is fatal.
    fn estimate_rows(&self, table: &str) -> Result<Option<u64>, MappingError> {
        let records = match self.db.query(&self.sql.count_rows(table), &[]) {
            Ok(records) => records,
            Err(SourceError::Timeout(timeout)) => return Err(MappingError::Timeout(timeout)),
            Err(error) => {
                warn!(table, %error, "Could not count rows");
                return Ok(None);
            }
        };
        Ok(records
            .into_iter()
            .next()
            .and_then(|record| record.into_iter().next().flatten())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|count| count.trim().parse().ok()))
    }
}

/// Returns whether reading metadata failed because a database call timed out.
fn is_timeout(error: &SchemaError) -> bool {
    std::error::Error::source(error)
        .and_then(|source| source.downcast_ref::<SourceError>())
        .is_some_and(|source| matches!(source, SourceError::Timeout(_)))
}

fn fetch_page<D: Database + ?Sized>(
    db: &D,
    sql: &SqlBuilder,
    scan: &mut TableScan,
    fetch_size: u64,
) -> Result<(), MappingError> {
    let query = sql.select_page(&scan.table, scan.offset, fetch_size);
    let records = db.query(&query, &[])?;
    let fetched = records.len() as u64;
    debug!(
        table = scan.table.name(),
        offset = scan.offset,
        fetched,
        "Fetched page"
    );
    scan.offset += fetched;
    scan.source_exhausted = fetched < fetch_size;
    scan.buffer.extend(records);
    Ok(())
}
