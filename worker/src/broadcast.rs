use std::{mem, sync::Arc};

use crate::error::{Result, WorkerErr};

/// A read-only value shipped once to every worker of a job.
///
/// Cloning only bumps a reference count, every clone observes the same value.
#[derive(Debug)]
pub struct Broadcast<T: ?Sized>(Arc<T>);

impl<T: ?Sized> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Broadcast<T> {
    /// Creates a new `Broadcast`.
    ///
    /// # Args
    /// * `value` - The value to share.
    pub fn new(value: impl Into<Arc<T>>) -> Self {
        Self(value.into())
    }

    /// Returns the shared value.
    pub fn value(&self) -> &T {
        &self.0
    }
}

impl Broadcast<[f32]> {
    /// Reinterprets a raw native-endian buffer as a broadcast parameter vector.
    ///
    /// # Args
    /// * `bytes` - The raw parameters, need not be aligned.
    ///
    /// # Returns
    /// The broadcast or `InvalidParams` if `bytes` doesn't hold a whole number of `f32`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % mem::size_of::<f32>() != 0 {
            return Err(WorkerErr::InvalidParams { len: bytes.len() });
        }

        let params: Vec<f32> = bytemuck::pod_collect_to_vec(bytes);
        Ok(Self::new(params))
    }
}

impl From<Vec<f32>> for Broadcast<[f32]> {
    fn from(value: Vec<f32>) -> Self {
        Self::new(value)
    }
}
