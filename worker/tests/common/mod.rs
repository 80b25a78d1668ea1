#![allow(dead_code)]

use machine_learning::data::Example;
use ndarray::{Array1, Array2, Axis};
use ndarray_rand::{
    RandomExt,
    rand::{SeedableRng, rngs::StdRng},
    rand_distr::StandardNormal,
};

/// 9 features into 10 sigmoid outputs, `(9 + 1) * 10 = 100` parameters.
pub const ARCH: &str = r#"{
    "sequential": {
        "inputs": [{ "name": "features", "size": 9 }],
        "layers": [{ "dense": { "dim": [9, 10], "act_fn": { "sigmoid": { "amp": 1.0 } } } }],
        "loss": "mse"
    }
}"#;

pub const ARCH_PARAMS: usize = 100;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn params(seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let params: Array1<f32> = Array1::random_using(ARCH_PARAMS, StandardNormal, &mut rng);
    params.to_vec()
}

/// `n` random examples fitting `ARCH`.
pub fn examples(n: usize, seed: u64) -> Vec<Example> {
    let mut rng = StdRng::seed_from_u64(seed);
    let xs: Array2<f32> = Array2::random_using((n, 9), StandardNormal, &mut rng);
    let ys: Array2<f32> = Array2::random_using((n, 10), StandardNormal, &mut rng);

    xs.axis_iter(Axis(0))
        .zip(ys.axis_iter(Axis(0)))
        .map(|(x, y)| Example::new([("features", x.to_owned())], y.to_owned()))
        .collect()
}
