pub mod config;
mod dialect;
pub mod error;
mod sink;

pub use config::{ConfigError, MappingConfig, MappingVersion};
pub use dialect::Dialect;
pub use error::MappingError;
pub use sink::GraphSink;
