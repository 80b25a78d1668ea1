use ndarray::ArrayView2;

use super::LossFn;

/// Lower bound applied to predicted probabilities before taking their logarithm.
const EPSILON: f32 = 1e-7;

/// Categorical cross entropy over predicted class probabilities.
///
/// Expects each row of `y_pred` to be a probability distribution, typically the output
/// of a softmax layer, and each row of `y` to be a one-hot or soft target.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let n = y_pred.nrows();
        if n == 0 {
            return 0.;
        }

        let log_p = y_pred.mapv(|p| p.clamp(EPSILON, 1.).ln());
        -(&y * &log_p).sum() / n as f32
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    #[test]
    fn perfect_prediction_has_no_loss() {
        let y = arr2(&[[0., 1.], [1., 0.]]);
        assert!(CrossEntropy::new().loss(y.view(), y.view()).abs() < 1e-6);
    }

    #[test]
    fn uniform_prediction() {
        let y_pred = arr2(&[[0.25; 4], [0.25; 4]]);
        let y = arr2(&[[1., 0., 0., 0.], [0., 0., 1., 0.]]);

        let loss = CrossEntropy::new().loss(y_pred.view(), y.view());
        assert!((loss - 4f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn zero_probability_is_finite() {
        let y_pred = arr2(&[[0., 1.]]);
        let y = arr2(&[[1., 0.]]);

        assert!(CrossEntropy::new().loss(y_pred.view(), y.view()).is_finite());
    }
}
