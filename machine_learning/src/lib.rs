pub mod arch;
pub mod data;
pub mod error;

pub use error::{MlErr, Result};
