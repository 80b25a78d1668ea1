use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer.
///
/// The layer doesn't own its parameters, it reads them from a flat slice laid out as the
/// row-major `(in, out)` weight matrix followed by the `out` biases.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,

    // Forward output, reused across batches of the same size.
    a: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The input and output dimensions.
    /// * `act_fn` - The activation applied to the weighted sums, if any.
    ///
    /// # Returns
    /// A new `Dense` instance.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
            a: Array2::zeros((0, dim.1)),
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the amount of weights, that is, the parameters that aren't biases.
    pub fn weights_len(&self) -> usize {
        self.dim.0 * self.dim.1
    }

    /// Computes the layer's output for a batch of inputs, one example per row.
    ///
    /// # Arguments
    /// * `params` - The parameters of this layer.
    /// * `x` - The input batch.
    ///
    /// # Returns
    /// The activations of this layer or a `SizeMismatch` error if `params` or `x` don't
    /// fit this layer's dimensions.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense input",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let shape = (x.nrows(), self.dim.1);

        if self.a.dim() != shape {
            self.a = Array2::zeros(shape);
        }

        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut self.a);
        self.a += &b;

        if let Some(act_fn) = &self.act_fn {
            act_fn.apply(self.a.view_mut());
        }

        Ok(self.a.view())
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        let mismatch = || MlErr::SizeMismatch {
            what: "dense parameters",
            got: params.len(),
            expected: self.size,
        };

        if params.len() != self.size {
            return Err(mismatch());
        }

        let (w_raw, b_raw) = params.split_at(self.weights_len());
        let weights = ArrayView2::from_shape(self.dim, w_raw).map_err(|_| mismatch())?;
        let biases = ArrayView1::from_shape(self.dim.1, b_raw).map_err(|_| mismatch())?;
        Ok((weights, biases))
    }
}
