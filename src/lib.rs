// src/lib.rs
pub mod config;
pub mod generator;
pub mod graph;

pub use config::{ChannelSpec, GraphConfig};
pub use generator::{GeneratorConfig, GeneratorParams, RandomValueGenerator};
pub use graph::{
    resolve_index_range, Channel, ChannelReader, ChannelRegistry, DataKey, GraphError,
    GraphHandler, GraphUpdated, IndexRange, Sample, ScopeParams, ScopeRect,
};
