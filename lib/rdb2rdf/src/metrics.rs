use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};
use tracing::info;

/// Counters of a mapping run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MappingMetrics {
    /// Number of tables that were read completely.
    pub tables: usize,
    /// Number of rows read from the database, including skipped rows.
    pub rows: u64,
    /// Number of triples handed to the sink.
    pub triples: u64,
    /// Number of rows dropped because one of their values could not be encoded.
    pub skipped_rows: u64,
    pub elapsed: Duration,
}

impl MappingMetrics {
    #[allow(clippy::cast_precision_loss, reason = "Only used for reporting")]
    pub fn triples_per_second(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.triples as f64 / seconds
        } else {
            0.0
        }
    }
}

impl Display for MappingMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} triples from {} rows of {} tables in {:.2}s",
            self.triples,
            self.rows,
            self.tables,
            self.elapsed.as_secs_f64()
        )?;
        if self.skipped_rows > 0 {
            write!(f, " ({} rows skipped)", self.skipped_rows)?;
        }
        Ok(())
    }
}

/// Logs the running triple count every `interval` triples.
pub(crate) struct ProgressLog {
    interval: u64,
    next_report: u64,
    started: Instant,
}

impl ProgressLog {
    pub(crate) fn new(interval: u64, started: Instant) -> Self {
        let interval = interval.max(1);
        Self {
            interval,
            next_report: interval,
            started,
        }
    }

    pub(crate) fn record(&mut self, triples: u64) {
        if triples < self.next_report {
            return;
        }
        let elapsed = self.started.elapsed();
        #[allow(clippy::cast_precision_loss, reason = "Only used for reporting")]
        let throughput = triples as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        info!(
            triples,
            elapsed = ?elapsed,
            triples_per_second = throughput.round(),
            "Mapping progress"
        );
        self.next_report = (triples / self.interval + 1) * self.interval;
    }
}
