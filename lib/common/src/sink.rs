use crate::error::SinkError;
use rdb2rdf_model::Triple;

/// The append-only graph store that receives the triples of a mapping run.
///
/// A sink may buffer triples. Only triples that were added before a successful [GraphSink::flush]
/// are guaranteed to be persisted.
pub trait GraphSink {
    /// Appends a single triple.
    fn add(&mut self, triple: Triple) -> Result<(), SinkError>;

    /// Appends all given triples and returns how many were added.
    fn add_all(&mut self, triples: Vec<Triple>) -> Result<usize, SinkError> {
        let count = triples.len();
        for triple in triples {
            self.add(triple)?;
        }
        Ok(count)
    }

    /// Persists all buffered triples.
    fn flush(&mut self) -> Result<(), SinkError>;
}

impl<S: GraphSink + ?Sized> GraphSink for &mut S {
    fn add(&mut self, triple: Triple) -> Result<(), SinkError> {
        (**self).add(triple)
    }

    fn add_all(&mut self, triples: Vec<Triple>) -> Result<usize, SinkError> {
        (**self).add_all(triples)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}
