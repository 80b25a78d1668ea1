use std::{error::Error, fmt, io};

use machine_learning::MlErr;

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Partition scoring failures.
///
/// None of these are retried: a failed partition fails the whole evaluation job.
#[derive(Debug)]
pub enum WorkerErr {
    Io(io::Error),
    ParameterShapeMismatch {
        expected: usize,
        got: usize,
    },
    BatchShape(MlErr),
    Architecture(MlErr),
    InvalidParams {
        len: usize,
    },
    InvalidResults {
        len: usize,
    },
    MissingPartitions {
        expected: usize,
        got: usize,
    },
    Incomplete {
        batch: usize,
    },
    Executor(String),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::ParameterShapeMismatch { expected, got } => write!(
                f,
                "parameter vector length mismatch: got {got}, expected {expected}"
            ),
            WorkerErr::BatchShape(e) => write!(f, "malformed batch: {e}"),
            WorkerErr::Architecture(e) => write!(f, "bad architecture: {e}"),
            WorkerErr::InvalidParams { len } => write!(
                f,
                "a buffer of {len} bytes doesn't hold a whole number of parameters"
            ),
            WorkerErr::InvalidResults { len } => write!(
                f,
                "a buffer of {len} bytes doesn't hold a whole number of partial results"
            ),
            WorkerErr::MissingPartitions { expected, got } => write!(
                f,
                "{got} partitions reported their results, expected {expected}"
            ),
            WorkerErr::Incomplete { batch } => {
                write!(f, "batch {batch} was never scored")
            }
            WorkerErr::Executor(detail) => write!(f, "execution backend failure: {detail}"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Io(e) => Some(e),
            WorkerErr::BatchShape(e) | WorkerErr::Architecture(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        match value {
            WorkerErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
