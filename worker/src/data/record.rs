use std::collections::BTreeMap;

use machine_learning::data::Example;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A single example as it travels in a JSON line.
///
/// Features are keyed by input name; they are handed to the model in key order so
/// every record of a stream shares the same layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleRecord {
    pub features: BTreeMap<String, Vec<f32>>,
    pub label: Vec<f32>,
}

impl From<ExampleRecord> for Example {
    fn from(record: ExampleRecord) -> Self {
        let features = record
            .features
            .into_iter()
            .map(|(name, x)| (name, Array1::from(x)));

        Example::new(features, Array1::from(record.label))
    }
}
