use std::num::NonZeroUsize;

use comms::specs::worker::{ExecutionSpec, ScoringSpec};

/// Immutable scoring bounds for a worker instance.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    minibatch_size: NonZeroUsize,
    execution: ExecutionSpec,
}

impl WorkerConfig {
    /// Creates a new worker configuration that scores eagerly.
    ///
    /// # Args
    /// * `minibatch_size` - The maximum amount of examples per scored batch.
    ///
    /// # Returns
    /// A `WorkerConfig` instance.
    pub fn new(minibatch_size: NonZeroUsize) -> Self {
        Self {
            minibatch_size,
            execution: ExecutionSpec::Eager,
        }
    }

    /// Replaces the execution mode of this configuration.
    pub fn with_execution(mut self, execution: ExecutionSpec) -> Self {
        self.execution = execution;
        self
    }

    /// Returns the maximum amount of examples per scored batch.
    pub fn minibatch_size(&self) -> NonZeroUsize {
        self.minibatch_size
    }

    /// Returns how the numeric work of a partition should be driven.
    pub fn execution(&self) -> ExecutionSpec {
        self.execution
    }
}

impl From<ScoringSpec> for WorkerConfig {
    fn from(spec: ScoringSpec) -> Self {
        Self::new(spec.minibatch_size).with_execution(spec.execution)
    }
}
