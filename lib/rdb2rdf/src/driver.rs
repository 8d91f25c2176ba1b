//! Orchestration of a mapping run.

use crate::metrics::ProgressLog;
use crate::MappingMetrics;
use rdb2rdf_common::{GraphSink, MappingConfig, MappingError};
use rdb2rdf_engine::DirectMappingEngine;
use rdb2rdf_model::{Row, Triple};
use rdb2rdf_source::{CursorOptions, Database, ForeignKeyResolver, RowCursor, SqliteDatabase};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Requests a running [MappingDriver::run] to stop before the next row.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Streams every row of a database through the [DirectMappingEngine] into a [GraphSink].
///
/// The driver owns the connection. The row cursor and the foreign key resolver of a run borrow
/// it, and it is released when the driver is dropped or closed.
pub struct MappingDriver<D: Database> {
    db: D,
    config: MappingConfig,
    engine: DirectMappingEngine,
    cancellation: CancellationToken,
}

impl MappingDriver<SqliteDatabase> {
    /// Opens the SQLite database at `path` read-only.
    pub fn open_sqlite(
        path: impl AsRef<Path>,
        config: MappingConfig,
    ) -> Result<Self, MappingError> {
        let db = SqliteDatabase::open(path)?.with_query_timeout(config.query_timeout());
        Self::new(db, config)
    }

    /// Closes the connection and reports errors that a drop would swallow.
    pub fn close(self) -> Result<(), MappingError> {
        Ok(self.db.close()?)
    }
}

impl<D: Database> MappingDriver<D> {
    /// Validates `config` and creates a driver for `db`.
    pub fn new(db: D, config: MappingConfig) -> Result<Self, MappingError> {
        config.validate()?;
        let engine = DirectMappingEngine::new(config.mapping_version, config.base_iri()?);
        Ok(Self {
            db,
            config,
            engine,
            cancellation: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn engine(&self) -> &DirectMappingEngine {
        &self.engine
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn into_database(self) -> D {
        self.db
    }

    /// A token that cancels runs of this driver, possibly from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Maps all tables into `sink`.
    ///
    /// The sink is flushed every `flushInterval` triples and once at the end, also when the run
    /// fails. Rows with values that cannot be encoded are logged and skipped. Any other error
    /// aborts the run. Triples flushed before the error stay in the sink.
    pub fn run<S: GraphSink + ?Sized>(&self, sink: &mut S) -> Result<MappingMetrics, MappingError> {
        let started = Instant::now();
        let options = CursorOptions::from_config(&self.config)?;
        let mut cursor = RowCursor::new(&self.db, options);
        let mut resolver = ForeignKeyResolver::new(
            &self.db,
            options.time_offset,
            self.config.max_key_chain_depth,
        );
        let mut metrics = MappingMetrics::default();
        info!(
            version = %self.config.mapping_version,
            base_iri = self.engine.base_iri().as_str(),
            dialect = %self.db.dialect(),
            "Starting direct mapping"
        );

        let result = self.map_rows(&mut cursor, &mut resolver, sink, &mut metrics, started);
        let flushed = sink.flush().map_err(MappingError::from);
        metrics.tables = cursor.completed_tables().len();
        metrics.elapsed = started.elapsed();

        match result.and(flushed) {
            Ok(()) => {
                info!(
                    tables = metrics.tables,
                    rows = metrics.rows,
                    triples = metrics.triples,
                    skipped_rows = metrics.skipped_rows,
                    elapsed = ?metrics.elapsed,
                    "Direct mapping finished"
                );
                Ok(metrics)
            }
            Err(error) => {
                warn!(
                    %error,
                    rows = metrics.rows,
                    triples = metrics.triples,
                    "Direct mapping aborted"
                );
                Err(error)
            }
        }
    }

    fn map_rows<S: GraphSink + ?Sized>(
        &self,
        cursor: &mut RowCursor<'_, D>,
        resolver: &mut ForeignKeyResolver<'_, D>,
        sink: &mut S,
        metrics: &mut MappingMetrics,
        started: Instant,
    ) -> Result<(), MappingError> {
        let mut progress = ProgressLog::new(self.config.progress_interval, started);
        let mut unflushed = 0;
        loop {
            if self.cancellation.is_cancelled() {
                return Err(MappingError::Cancelled);
            }
            let row = match cursor.next() {
                Ok(Some(row)) => row,
                Ok(None) => return Ok(()),
                Err(error) if error.is_row_local() => {
                    metrics.rows += 1;
                    metrics.skipped_rows += 1;
                    let table = cursor.current_table().map(|table| table.name());
                    log_skipped_row(table, None, &error);
                    continue;
                }
                Err(error) => return Err(error),
            };
            metrics.rows += 1;
            let triples = match self.map_row(&row, resolver) {
                Ok(triples) => triples,
                Err(error) if error.is_row_local() => {
                    metrics.skipped_rows += 1;
                    log_skipped_row(Some(row.table().name()), row.index(), &error);
                    continue;
                }
                Err(error) => return Err(error),
            };

            let added = sink.add_all(triples)?;
            metrics.triples += added as u64;
            unflushed += added as u64;
            if unflushed >= self.config.flush_interval {
                sink.flush()?;
                unflushed = 0;
            }
            progress.record(metrics.triples);
        }
    }

    fn map_row(
        &self,
        row: &Row,
        resolver: &mut ForeignKeyResolver<'_, D>,
    ) -> Result<Vec<Triple>, MappingError> {
        let referenced = resolver.resolve_all(row)?;
        let primary_chain = resolver.primary_is_foreign_key(row)?;
        self.engine
            .convert(row, &referenced, primary_chain.as_ref())
    }
}

fn log_skipped_row(table: Option<&str>, index: Option<u64>, error: &MappingError) {
    warn!(table = ?table, index = ?index, %error, "Skipping row");
}
