use crate::{Result, data::LabeledBatch};

/// A scorable model owning a private copy of its parameters.
pub trait Model: Send {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the model's parameters as a flat slice.
    fn params(&self) -> &[f32];

    /// Overwrites the model's parameters with a copy of `params`.
    ///
    /// # Arguments
    /// * `params` - A flat slice with exactly `size` parameters.
    ///
    /// # Returns
    /// A `SizeMismatch` error if the length of `params` is not `size`.
    fn set_params(&mut self, params: &[f32]) -> Result<()>;

    /// Evaluates the model over a batch without updating any parameter.
    ///
    /// # Arguments
    /// * `batch` - The labeled batch to score.
    ///
    /// # Returns
    /// The mean loss per example of the batch plus the regularization penalty, or an error
    /// if the batch doesn't fit the model's inputs and outputs.
    fn score(&mut self, batch: &LabeledBatch) -> Result<f32>;
}
