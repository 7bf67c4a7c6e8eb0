// src/graph/error.rs
use thiserror::Error;

use crate::graph::DataKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no channel registered at key {0}")]
    UnknownKey(DataKey),
    #[error("key {0} belongs to a system channel")]
    ReservedKey(DataKey),
    #[error("channel keys must be non-negative, got {0}")]
    NegativeKey(DataKey),
}
