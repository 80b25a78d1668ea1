use log::debug;
use machine_learning::arch::{Model, ModelBuilder};

use crate::error::{Result, WorkerErr};

/// Builds a worker-local model out of the broadcast architecture and parameters.
///
/// The model owns a private copy of `params`, the shared value is never mutated.
///
/// # Args
/// * `architecture` - The JSON architecture descriptor.
/// * `params` - The flat parameter vector, laid out layer by layer.
///
/// # Returns
/// The ready to use model.
///
/// # Errors
/// `Architecture` if the descriptor can't be turned into a model, `ParameterShapeMismatch`
/// if `params` doesn't match the size of that model.
pub fn instantiate(architecture: &str, params: &[f32]) -> Result<Box<dyn Model>> {
    let mut model = ModelBuilder::new()
        .from_json(architecture)
        .map_err(WorkerErr::Architecture)?;

    let expected = model.size();
    if params.len() != expected {
        return Err(WorkerErr::ParameterShapeMismatch {
            expected,
            got: params.len(),
        });
    }

    model.set_params(params).map_err(WorkerErr::Architecture)?;
    debug!(params = expected; "instantiated model");
    Ok(model)
}
