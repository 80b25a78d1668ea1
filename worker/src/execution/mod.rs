mod backend;
mod deferred;
mod eager;

pub use backend::{Job, NumericBackend};
pub use deferred::Deferred;
pub use eager::Eager;

use comms::specs::worker::ExecutionSpec;

use crate::error::Result;

/// Creates the backend described by `spec`.
///
/// # Errors
/// `Executor` if the backend's threads can't be spawned.
pub fn from_spec(spec: ExecutionSpec) -> Result<Box<dyn NumericBackend>> {
    let backend: Box<dyn NumericBackend> = match spec {
        ExecutionSpec::Eager => Box::new(Eager),
        ExecutionSpec::Deferred { max_in_flight } => Box::new(Deferred::new(max_in_flight)?),
    };

    Ok(backend)
}
