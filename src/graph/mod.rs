// src/graph/mod.rs
pub mod channel;
pub mod clock;
pub mod error;
pub mod handler;
pub mod range;
pub mod registry;
pub mod scope;

pub use channel::{Channel, ChannelReader, Sample};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::GraphError;
pub use handler::{GraphHandler, GraphUpdated};
pub use range::{resolve_index_range, IndexRange};
pub use registry::{ChannelRegistry, DataKey, RegistryPolicy, COUNT_RESERVED, TIMESTAMP_KEY};
pub use scope::{GridLine, GridParams, ScopeParams, ScopeRect, MIN_EXTENT};
