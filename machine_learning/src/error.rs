use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    MissingInput {
        name: String,
    },
    SchemaMismatch {
        row: usize,
    },
    InvalidArchitecture(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::MissingInput { name } => {
                write!(f, "The batch has no feature matrix for the input `{name}`")
            }
            MlErr::SchemaMismatch { row } => write!(
                f,
                "The example at row {row} doesn't share the input/label schema of the stream"
            ),
            MlErr::InvalidArchitecture(detail) => {
                write!(f, "Invalid architecture descriptor: {detail}")
            }
        }
    }
}

impl Error for MlErr {}

impl From<serde_json::Error> for MlErr {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidArchitecture(value.to_string())
    }
}
