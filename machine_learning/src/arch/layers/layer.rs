use ndarray::ArrayView2;

use super::Dense;
use crate::{Result, arch::activations::ActFn};

#[derive(Clone, Debug)]
pub enum Layer {
    Dense(Dense),
}

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self::Dense(Dense::new(dim, act_fn))
    }

    /// Returns the amount of parameters of this layer.
    pub fn size(&self) -> usize {
        match self {
            Self::Dense(l) => l.size(),
        }
    }

    /// Returns the amount of parameters of this layer that are subject to regularization.
    pub fn weights_len(&self) -> usize {
        match self {
            Self::Dense(l) => l.weights_len(),
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        match self {
            Self::Dense(l) => l.forward(params, x),
        }
    }
}
