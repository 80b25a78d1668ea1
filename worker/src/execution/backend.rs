use crate::error::Result;

/// A unit of numeric work, usually scoring a single batch.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Drives the numeric work of a partition.
///
/// Jobs may run at any point between `dispatch` and the following `commit`, so their
/// outputs must only be read once `commit` returns.
pub trait NumericBackend: Send + Sync {
    /// Hands a job to the backend. Jobs run in dispatch order.
    ///
    /// # Arguments
    /// * `job` - The work to run.
    fn dispatch(&self, job: Job) -> Result<()>;

    /// Blocks until every job dispatched so far has finished.
    fn commit(&self) -> Result<()>;
}
