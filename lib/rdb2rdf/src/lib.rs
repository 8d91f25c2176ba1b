#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod driver;
mod metrics;
pub mod sink;

pub use driver::{CancellationToken, MappingDriver};
pub use metrics::MappingMetrics;
pub use rdb2rdf_common::{
    ConfigError, Dialect, GraphSink, MappingConfig, MappingError, MappingVersion,
};

pub mod error {
    pub use rdb2rdf_common::error::*;
}

pub mod model {
    pub use rdb2rdf_model::*;
}

pub mod source {
    pub use rdb2rdf_source::*;
}

pub mod engine {
    pub use rdb2rdf_engine::*;
}
