use rdb2rdf_common::error::SinkError;
use rdb2rdf_common::GraphSink;
use rdb2rdf_model::{NamedNode, Triple};
use std::io::Write;

/// Writes triples as N-Triples, or as N-Quads into a named graph.
///
/// Lines are written as triples arrive. Wrap the writer in a [std::io::BufWriter] to batch them;
/// [GraphSink::flush] flushes the writer.
pub struct NQuadsSink<W: Write> {
    writer: W,
    graph: Option<NamedNode>,
}

impl<W: Write> NQuadsSink<W> {
    /// Writes N-Triples into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            graph: None,
        }
    }

    /// Writes all triples into `graph` instead of the default graph.
    #[must_use]
    pub fn with_graph(mut self, graph: Option<NamedNode>) -> Self {
        self.graph = graph;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> GraphSink for NQuadsSink<W> {
    fn add(&mut self, triple: Triple) -> Result<(), SinkError> {
        match &self.graph {
            Some(graph) => writeln!(self.writer, "{} .", triple.as_ref().in_graph(graph))?,
            None => writeln!(self.writer, "{triple} .")?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(self.writer.flush()?)
    }
}
