use ndarray::ArrayViewMut2;

use super::Sigmoid;

#[derive(Clone, Debug)]
pub enum ActFn {
    Sigmoid(Sigmoid),
    Tanh,
    Relu,
    Softmax,
}

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    /// Applies the activation in place over a batch of weighted sums, one example per row.
    ///
    /// # Arguments
    /// * `z` - The weighted sums of a layer.
    pub fn apply(&self, mut z: ArrayViewMut2<f32>) {
        match self {
            Self::Sigmoid(a) => z.mapv_inplace(|z| a.f(z)),
            Self::Tanh => z.mapv_inplace(f32::tanh),
            Self::Relu => z.mapv_inplace(|z| z.max(0.)),
            Self::Softmax => {
                for mut row in z.rows_mut() {
                    let max = row.fold(f32::NEG_INFINITY, |m, &z| m.max(z));
                    row.mapv_inplace(|z| (z - max).exp());

                    let sum = row.sum();
                    row.mapv_inplace(|z| z / sum);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, arr2};

    use super::*;

    #[test]
    fn relu_clamps_negatives() {
        let mut z = arr2(&[[-1., 0.5], [2., -3.]]);
        ActFn::Relu.apply(z.view_mut());
        assert_eq!(z, arr2(&[[0., 0.5], [2., 0.]]));
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let mut z = arr2(&[[1., 2., 3.], [1000., 1000., 1000.]]);
        ActFn::Softmax.apply(z.view_mut());

        for row in z.rows() {
            assert!((row.sum() - 1.).abs() < 1e-6);
        }

        assert!(z[[0, 2]] > z[[0, 1]] && z[[0, 1]] > z[[0, 0]]);
        assert!((z[[1, 0]] - 1. / 3.).abs() < 1e-6);
    }

    #[test]
    fn sigmoid_is_elementwise() {
        let mut z = Array2::zeros((2, 3));
        ActFn::sigmoid(1.).apply(z.view_mut());
        assert!(z.iter().all(|&a| a == 0.5));
    }
}
