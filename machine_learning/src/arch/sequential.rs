use ndarray::{Array2, ArrayView2, s};

use super::{Model, layers::Layer, loss::LossFn};
use crate::{MlErr, Result, data::LabeledBatch};

/// A named input of a model and the width of its feature vectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub name: String,
    pub size: usize,
}

/// A sequential model: information flows forward through its layers.
///
/// The named inputs are concatenated in declaration order before reaching the first layer.
#[derive(Clone, Debug)]
pub struct Sequential<L: LossFn> {
    inputs: Vec<Input>,
    layers: Vec<Layer>,
    loss_fn: L,
    l2: f32,
    params: Vec<f32>,

    // Concatenated inputs, reused across batches of the same size.
    x: Array2<f32>,
}

impl<L: LossFn> Sequential<L> {
    /// Creates a new `Sequential` with zeroed parameters.
    ///
    /// # Arguments
    /// * `inputs` - The named inputs of the model.
    /// * `layers` - The layers the sequential is composed of.
    /// * `loss_fn` - The loss function used for scoring.
    /// * `l2` - The L2 regularization coefficient added to every score.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(inputs: Vec<Input>, layers: I, loss_fn: L, l2: f32) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<_> = layers.into_iter().collect();
        let size = layers.iter().map(Layer::size).sum();
        let width = inputs.iter().map(|input| input.size).sum();

        Self {
            inputs,
            layers,
            loss_fn,
            l2,
            params: vec![0.; size],
            x: Array2::zeros((0, width)),
        }
    }

    /// Returns the L2 penalty of the current parameters, biases excluded.
    pub fn l2_penalty(&self) -> f32 {
        if self.l2 == 0. {
            return 0.;
        }

        let mut params = self.params.as_slice();
        let mut sum = 0.;

        for layer in &self.layers {
            let (layer_params, rest) = params.split_at(layer.size());
            sum += layer_params[..layer.weights_len()]
                .iter()
                .map(|w| w * w)
                .sum::<f32>();
            params = rest;
        }

        0.5 * self.l2 * sum
    }
}

impl<L: LossFn> Model for Sequential<L> {
    fn size(&self) -> usize {
        self.params.len()
    }

    fn params(&self) -> &[f32] {
        &self.params
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.params.len() {
            return Err(MlErr::SizeMismatch {
                what: "parameters",
                got: params.len(),
                expected: self.params.len(),
            });
        }

        self.params.copy_from_slice(params);
        Ok(())
    }

    fn score(&mut self, batch: &LabeledBatch) -> Result<f32> {
        let penalty = self.l2_penalty();
        let y = batch.labels();

        let Self {
            inputs,
            layers,
            loss_fn,
            params,
            x,
            ..
        } = self;

        gather_inputs(inputs, batch, x)?;
        let y_pred = forward_layers(layers, params, x.view())?;

        if y_pred.ncols() != y.ncols() {
            return Err(MlErr::SizeMismatch {
                what: "labels",
                got: y.ncols(),
                expected: y_pred.ncols(),
            });
        }

        Ok(loss_fn.loss(y_pred, y) + penalty)
    }
}

/// Copies the batch's named inputs side by side into `x`, in the order the model declares them.
fn gather_inputs(inputs: &[Input], batch: &LabeledBatch, x: &mut Array2<f32>) -> Result<()> {
    let rows = batch.len();
    if x.nrows() != rows {
        *x = Array2::zeros((rows, x.ncols()));
    }

    let mut offset = 0;
    for input in inputs {
        let feature = batch
            .feature(&input.name)
            .ok_or_else(|| MlErr::MissingInput {
                name: input.name.clone(),
            })?;

        if feature.ncols() != input.size {
            return Err(MlErr::SizeMismatch {
                what: "input width",
                got: feature.ncols(),
                expected: input.size,
            });
        }

        if feature.nrows() != rows {
            return Err(MlErr::SizeMismatch {
                what: "batch rows",
                got: feature.nrows(),
                expected: rows,
            });
        }

        x.slice_mut(s![.., offset..offset + input.size])
            .assign(&feature);
        offset += input.size;
    }

    Ok(())
}

fn forward_layers<'a>(
    layers: &'a mut [Layer],
    mut params: &[f32],
    mut x: ArrayView2<'a, f32>,
) -> Result<ArrayView2<'a, f32>> {
    let nlayers = layers.len();

    for (i, layer) in layers.iter_mut().enumerate() {
        let (layer_params, rest) =
            params
                .split_at_checked(layer.size())
                .ok_or_else(|| MlErr::SizeMismatch {
                    what: "layers",
                    got: i,
                    expected: nlayers,
                })?;

        x = layer.forward(layer_params, x)?;
        params = rest;
    }

    Ok(x)
}
