use ndarray::ArrayView2;

/// A loss function evaluated over a batch, one example per row.
pub trait LossFn: Send {
    /// Returns the mean loss per example of the batch.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;
}
