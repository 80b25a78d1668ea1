pub mod aggregation;
pub mod broadcast;
pub mod config;
pub mod data;
pub mod error;
pub mod execution;
pub mod model;
pub mod scorer;

pub use aggregation::{PartialResult, Reduction};
pub use broadcast::Broadcast;
pub use config::WorkerConfig;
pub use error::{Result, WorkerErr};
pub use scorer::PartitionScorer;
