use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// How a worker drives the numeric work of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionSpec {
    /// Every batch is scored inline as soon as it is assembled.
    #[default]
    Eager,
    /// Batches are scored on a dedicated thread while the next one is assembled.
    Deferred { max_in_flight: NonZeroUsize },
}

/// Scoring settings handed to every worker of an evaluation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSpec {
    pub minibatch_size: NonZeroUsize,
    #[serde(default)]
    pub execution: ExecutionSpec,
}
