use super::{Job, NumericBackend};
use crate::error::Result;

/// Runs every job inline, there's never pending work.
#[derive(Debug, Default, Clone, Copy)]
pub struct Eager;

impl NumericBackend for Eager {
    fn dispatch(&self, job: Job) -> Result<()> {
        job();
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }
}
