use std::collections::HashSet;

use comms::specs::machine_learning::{ActFnSpec, InputSpec, LayerSpec, LossFnSpec, ModelSpec};

use super::{
    Input, Model, Sequential,
    activations::ActFn,
    layers::Layer,
    loss::{CrossEntropy, LossFn, Mse},
};
use crate::{MlErr, Result};

/// Builds `Model`s given an architecture descriptor.
///
/// Building is a pure function of the descriptor: the same descriptor always yields the
/// same topology, with every parameter set to zero.
#[derive(Default)]
pub struct ModelBuilder;

impl ModelBuilder {
    /// Creates a new `ModelBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Model` from its JSON architecture descriptor.
    ///
    /// # Arguments
    /// * `json` - The serialized `ModelSpec`.
    ///
    /// # Returns
    /// The model or `InvalidArchitecture` if the descriptor is malformed or inconsistent.
    pub fn from_json(&self, json: &str) -> Result<Box<dyn Model>> {
        let spec: ModelSpec = serde_json::from_str(json)?;
        self.build(&spec)
    }

    /// Builds a new `Model` following a spec.
    ///
    /// # Arguments
    /// * `spec` - The specification for the model.
    pub fn build(&self, spec: &ModelSpec) -> Result<Box<dyn Model>> {
        match spec {
            ModelSpec::Sequential {
                inputs,
                layers: layer_specs,
                loss,
                l2,
            } => {
                self.validate(inputs, layer_specs, *l2)?;

                let inputs = inputs
                    .iter()
                    .map(|spec| Input {
                        name: spec.name.clone(),
                        size: spec.size,
                    })
                    .collect();

                let layers = layer_specs.iter().map(|ls| self.resolve_layer(*ls));
                Ok(self.resolve_loss(*loss, inputs, layers.collect(), *l2))
            }
        }
    }

    fn resolve_layer(&self, spec: LayerSpec) -> Layer {
        match spec {
            LayerSpec::Dense { dim, act_fn } => {
                Layer::dense(dim, act_fn.map(|s| self.resolve_act_fn(s)))
            }
        }
    }

    fn resolve_act_fn(&self, spec: ActFnSpec) -> ActFn {
        match spec {
            ActFnSpec::Sigmoid { amp } => ActFn::sigmoid(amp),
            ActFnSpec::Tanh => ActFn::Tanh,
            ActFnSpec::Relu => ActFn::Relu,
            ActFnSpec::Softmax => ActFn::Softmax,
        }
    }

    fn resolve_loss(
        &self,
        spec: LossFnSpec,
        inputs: Vec<Input>,
        layers: Vec<Layer>,
        l2: f32,
    ) -> Box<dyn Model> {
        match spec {
            LossFnSpec::Mse => self.terminate_build(inputs, layers, Mse::new(), l2),
            LossFnSpec::CrossEntropy => {
                self.terminate_build(inputs, layers, CrossEntropy::new(), l2)
            }
        }
    }

    fn terminate_build<L>(
        &self,
        inputs: Vec<Input>,
        layers: Vec<Layer>,
        loss_fn: L,
        l2: f32,
    ) -> Box<dyn Model>
    where
        L: LossFn + 'static,
    {
        Box::new(Sequential::new(inputs, layers, loss_fn, l2))
    }

    /// Checks that the inputs feed the first layer and that every layer feeds the next one.
    fn validate(&self, inputs: &[InputSpec], layers: &[LayerSpec], l2: f32) -> Result<()> {
        let invalid = |detail: String| Err(MlErr::InvalidArchitecture(detail));

        if inputs.is_empty() {
            return invalid("the model declares no inputs".into());
        }

        let mut names = HashSet::new();
        for input in inputs {
            if input.size == 0 {
                return invalid(format!("the input `{}` has no features", input.name));
            }

            if !names.insert(input.name.as_str()) {
                return invalid(format!("the input `{}` is declared twice", input.name));
            }
        }

        if layers.is_empty() {
            return invalid("the model declares no layers".into());
        }

        if !l2.is_finite() || l2 < 0. {
            return invalid(format!("the l2 coefficient must be finite and non negative, got {l2}"));
        }

        let mut width = inputs.iter().map(|input| input.size).sum();
        for (i, layer) in layers.iter().enumerate() {
            let LayerSpec::Dense { dim: (n_in, n_out), .. } = *layer;

            if n_in != width {
                return invalid(format!(
                    "layer {i} expects {n_in} inputs but is fed {width}"
                ));
            }

            if n_out == 0 {
                return invalid(format!("layer {i} has no outputs"));
            }

            width = n_out;
        }

        Ok(())
    }
}
