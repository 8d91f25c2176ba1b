use rdb2rdf_common::error::SinkError;
use rdb2rdf_common::GraphSink;
use rdb2rdf_model::{Graph, Triple};

/// Collects triples in memory, in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    triples: Vec<Triple>,
    flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn into_triples(self) -> Vec<Triple> {
        self.triples
    }

    /// Returns the collected triples as a set.
    pub fn graph(&self) -> Graph {
        self.triples.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Number of times the sink was flushed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl GraphSink for MemorySink {
    fn add(&mut self, triple: Triple) -> Result<(), SinkError> {
        self.triples.push(triple);
        Ok(())
    }

    fn add_all(&mut self, triples: Vec<Triple>) -> Result<usize, SinkError> {
        let count = triples.len();
        self.triples.extend(triples);
        Ok(count)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flushes += 1;
        Ok(())
    }
}
