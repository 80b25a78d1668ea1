use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

use crate::{MlErr, Result};

/// A single labeled example.
///
/// Features are kept as named vectors in the order they were given, the first
/// one being the primary input.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    features: Vec<(String, Array1<f32>)>,
    label: Array1<f32>,
}

impl Example {
    /// Creates a new `Example`.
    ///
    /// # Arguments
    /// * `features` - The named feature vectors of this example.
    /// * `label` - The expected output.
    ///
    /// # Returns
    /// A new `Example` instance.
    pub fn new<I, S>(features: I, label: Array1<f32>) -> Self
    where
        I: IntoIterator<Item = (S, Array1<f32>)>,
        S: Into<String>,
    {
        Self {
            features: features
                .into_iter()
                .map(|(name, x)| (name.into(), x))
                .collect(),
            label,
        }
    }

    pub fn features(&self) -> &[(String, Array1<f32>)] {
        &self.features
    }

    pub fn label(&self) -> ArrayView1<'_, f32> {
        self.label.view()
    }
}

/// A group of examples scored together.
///
/// Every feature matrix and the label matrix hold one example per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBatch {
    features: Vec<(String, Array2<f32>)>,
    labels: Array2<f32>,
}

impl LabeledBatch {
    /// Creates a new `LabeledBatch`.
    ///
    /// # Arguments
    /// * `features` - The named feature matrices, one example per row.
    /// * `labels` - The label matrix, one example per row.
    ///
    /// # Returns
    /// A new `LabeledBatch` or a `SizeMismatch` error if the matrices disagree on
    /// the amount of examples.
    pub fn new<I, S>(features: I, labels: Array2<f32>) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Array2<f32>)>,
        S: Into<String>,
    {
        let features: Vec<_> = features
            .into_iter()
            .map(|(name, x)| (name.into(), x))
            .collect();

        let rows = labels.nrows();
        if let Some((_, x)) = features.iter().find(|(_, x)| x.nrows() != rows) {
            return Err(MlErr::SizeMismatch {
                what: "batch rows",
                got: x.nrows(),
                expected: rows,
            });
        }

        Ok(Self { features, labels })
    }

    /// Returns the amount of examples in the batch.
    ///
    /// # Returns
    /// The leading dimension of the primary input.
    pub fn len(&self) -> usize {
        self.features
            .first()
            .map_or(self.labels.nrows(), |(_, x)| x.nrows())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn features(&self) -> &[(String, Array2<f32>)] {
        &self.features
    }

    /// Looks up a feature matrix by input name.
    pub fn feature(&self, name: &str) -> Option<ArrayView2<'_, f32>> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, x)| x.view())
    }

    pub fn labels(&self) -> ArrayView2<'_, f32> {
        self.labels.view()
    }

    /// Whether both batches have the same input names, in the same order, with the
    /// same widths, and the same label width.
    pub fn same_schema(&self, other: &Self) -> bool {
        self.labels.ncols() == other.labels.ncols()
            && self.features.len() == other.features.len()
            && self
                .features
                .iter()
                .zip(&other.features)
                .all(|((a, x), (b, y))| a == b && x.ncols() == y.ncols())
    }

    /// Splits the batch in two, the first part holding the first `rows` examples.
    ///
    /// # Arguments
    /// * `rows` - The amount of examples to keep in the first part, clamped to `len`.
    ///
    /// # Returns
    /// The head and the tail of this batch.
    pub fn split_at(self, rows: usize) -> (Self, Self) {
        let rows = rows.min(self.len());

        let split = |x: &Array2<f32>| {
            (
                x.slice(s![..rows, ..]).to_owned(),
                x.slice(s![rows.., ..]).to_owned(),
            )
        };

        let (mut head, mut tail) = (Vec::new(), Vec::new());
        for (name, x) in &self.features {
            let (h, t) = split(x);
            head.push((name.clone(), h));
            tail.push((name.clone(), t));
        }

        let (head_labels, tail_labels) = split(&self.labels);

        (
            Self {
                features: head,
                labels: head_labels,
            },
            Self {
                features: tail,
                labels: tail_labels,
            },
        )
    }

    /// Stacks several batches sharing the same schema into a single one, in order.
    ///
    /// # Arguments
    /// * `parts` - The batches to stack, must not be empty.
    ///
    /// # Returns
    /// The stacked batch or an error if `parts` is empty or the schemas differ.
    pub fn concat(parts: &[Self]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(MlErr::SizeMismatch {
                what: "batch parts",
                got: 0,
                expected: 1,
            });
        };

        let mut row = 0;
        for part in parts {
            if !first.same_schema(part) {
                return Err(MlErr::SchemaMismatch { row });
            }
            row += part.len();
        }

        let stack = |views: Vec<ArrayView2<f32>>| {
            ndarray::concatenate(Axis(0), &views).map_err(|_| MlErr::SizeMismatch {
                what: "stacked batch",
                got: views.len(),
                expected: parts.len(),
            })
        };

        let mut features = Vec::with_capacity(first.features.len());
        for (i, (name, _)) in first.features.iter().enumerate() {
            let views = parts.iter().map(|p| p.features[i].1.view()).collect();
            features.push((name.clone(), stack(views)?));
        }

        let labels = stack(parts.iter().map(|p| p.labels.view()).collect())?;
        Ok(Self { features, labels })
    }
}

impl From<Example> for LabeledBatch {
    fn from(example: Example) -> Self {
        let features = example
            .features
            .into_iter()
            .map(|(name, x)| (name, x.insert_axis(Axis(0))))
            .collect();

        Self {
            features,
            labels: example.label.insert_axis(Axis(0)),
        }
    }
}
