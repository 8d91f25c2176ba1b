//! [GraphSink] implementations.

mod memory;
mod nquads;

pub use memory::MemorySink;
pub use nquads::NQuadsSink;
pub use rdb2rdf_common::GraphSink;
