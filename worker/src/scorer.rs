use std::sync::{Arc, OnceLock};

use log::{debug, info};
use machine_learning::{arch::Model, data::LabeledBatch};
use parking_lot::Mutex;

use crate::{
    aggregation::PartialResult,
    broadcast::Broadcast,
    config::WorkerConfig,
    data::Batches,
    error::{Result, WorkerErr},
    execution::{self, NumericBackend},
    model::instantiate,
};

type Slot = Arc<OnceLock<Result<f32>>>;

/// Scores the partitions handed to a worker.
///
/// The architecture and parameters are the same for every partition of a job, each
/// partition gets its own model instance built out of them.
///
/// A scorer drives a single backend, so it should score one partition at a time: a
/// `commit` waits for every job dispatched through the backend, including those of a
/// partition being scored concurrently on another thread. Use one scorer per thread.
pub struct PartitionScorer {
    architecture: String,
    params: Broadcast<[f32]>,
    config: WorkerConfig,
    backend: Box<dyn NumericBackend>,
}

impl PartitionScorer {
    /// Creates a new `PartitionScorer` using the execution mode of `config`.
    ///
    /// # Args
    /// * `architecture` - The JSON architecture descriptor.
    /// * `params` - The broadcast parameter vector.
    /// * `config` - The scoring bounds.
    ///
    /// # Errors
    /// `Executor` if the configured backend can't be started.
    pub fn new(
        architecture: impl Into<String>,
        params: Broadcast<[f32]>,
        config: WorkerConfig,
    ) -> Result<Self> {
        let backend = execution::from_spec(config.execution())?;
        Ok(Self::with_backend(architecture, params, config, backend))
    }

    /// Creates a new `PartitionScorer` driven by `backend`.
    pub fn with_backend(
        architecture: impl Into<String>,
        params: Broadcast<[f32]>,
        config: WorkerConfig,
        backend: Box<dyn NumericBackend>,
    ) -> Self {
        Self {
            architecture: architecture.into(),
            params,
            config,
            backend,
        }
    }

    /// Scores one partition of the evaluation set.
    ///
    /// Nothing is learned: the model's parameters are the broadcast ones for every batch.
    ///
    /// # Args
    /// * `examples` - The partition's examples, or small batches of them, in order.
    ///
    /// # Returns
    /// One `PartialResult` per batch, in order, or `[PartialResult::EMPTY]` for an empty
    /// partition.
    ///
    /// # Errors
    /// `Architecture` or `ParameterShapeMismatch` before any example is consumed,
    /// `BatchShape` if an example doesn't fit the stream or the model.
    pub fn score_partition<I, T>(&self, examples: I) -> Result<Vec<PartialResult>>
    where
        I: IntoIterator<Item = T>,
        T: Into<LabeledBatch>,
    {
        // Items without rows hold no example, a partition made only of them is empty.
        let mut examples = examples
            .into_iter()
            .map(Into::into)
            .filter(|item: &LabeledBatch| !item.is_empty())
            .peekable();

        if examples.peek().is_none() {
            debug!("empty partition");
            return Ok(vec![PartialResult::EMPTY]);
        }

        let model = instantiate(&self.architecture, self.params.value())?;
        let model = Arc::new(Mutex::new(model));

        let mut batches = Batches::new(examples, self.config.minibatch_size());
        let dispatched = self.dispatch_all(&mut batches, &model);
        let committed = self.backend.commit();

        let slots = dispatched?;
        committed?;

        let results = collect(slots)?;
        info!(
            batches = results.len(),
            examples = batches.yielded();
            "scored partition"
        );

        Ok(results)
    }

    fn dispatch_all<I>(
        &self,
        batches: &mut Batches<I>,
        model: &Arc<Mutex<Box<dyn Model>>>,
    ) -> Result<Vec<(usize, Slot)>>
    where
        Batches<I>: Iterator<Item = Result<LabeledBatch>>,
    {
        let mut slots = Vec::new();

        for batch in batches {
            let batch = batch?;
            let count = batch.len();
            let slot = Slot::default();

            let (model, out) = (Arc::clone(model), Arc::clone(&slot));
            self.backend.dispatch(Box::new(move || {
                let score = model.lock().score(&batch).map_err(WorkerErr::BatchShape);
                let _ = out.set(score);
            }))?;

            slots.push((count, slot));
        }

        Ok(slots)
    }
}

/// Reads every batch score once the backend committed.
fn collect(slots: Vec<(usize, Slot)>) -> Result<Vec<PartialResult>> {
    slots
        .into_iter()
        .enumerate()
        .map(|(batch, (count, slot))| -> Result<PartialResult> {
            let score = Arc::into_inner(slot)
                .and_then(OnceLock::into_inner)
                .ok_or(WorkerErr::Incomplete { batch })??;

            Ok(PartialResult::from_score(count, score))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use machine_learning::data::Example;
    use ndarray::{Array2, arr1};

    use super::*;
    use crate::execution::Job;

    const LINEAR: &str = r#"{
        "sequential": {
            "inputs": [{ "name": "x", "size": 2 }],
            "layers": [{ "dense": { "dim": [2, 1], "act_fn": null } }],
            "loss": "mse"
        }
    }"#;

    /// Accepts jobs but never runs them.
    struct Lazy;

    impl NumericBackend for Lazy {
        fn dispatch(&self, _job: Job) -> Result<()> {
            Ok(())
        }

        fn commit(&self) -> Result<()> {
            Ok(())
        }
    }

    fn scorer(size: usize) -> PartitionScorer {
        let config = WorkerConfig::new(NonZeroUsize::new(size).unwrap());
        PartitionScorer::new(LINEAR, vec![2., 3., 1.].into(), config).unwrap()
    }

    fn example(a: f32, b: f32, y: f32) -> Example {
        Example::new([("x", arr1(&[a, b]))], arr1(&[y]))
    }

    #[test]
    fn empty_partition_reports_sentinel() {
        let results = scorer(4).score_partition(Vec::<Example>::new()).unwrap();
        assert_eq!(results, vec![PartialResult::EMPTY]);
    }

    #[test]
    fn perfect_predictions_score_zero() {
        let examples = (0..5).map(|i| {
            let (a, b) = (i as f32, 1. - i as f32);
            example(a, b, 2. * a + 3. * b + 1.)
        });

        let results = scorer(2).score_partition(examples).unwrap();
        let counts: Vec<_> = results.iter().map(|r| r.count).collect();

        assert_eq!(counts, vec![2, 2, 1]);
        assert!(results.iter().all(|r| r.weighted_sum == 0.));
    }

    #[test]
    fn weighted_sum_is_score_times_count() {
        // Predictions are 6 and 1, both off by one.
        let examples = [example(1., 1., 7.), example(0., 0., 0.)];
        let results = scorer(8).score_partition(examples).unwrap();

        assert_eq!(results, vec![PartialResult::from_score(2, 1.)]);
    }

    #[test]
    fn partition_of_rowless_batches_is_empty() {
        let rowless = || LabeledBatch::new([("x", Array2::zeros((0, 2)))], Array2::zeros((0, 1)));
        let config = WorkerConfig::new(NonZeroUsize::new(4).unwrap());

        let results = scorer(4)
            .score_partition([rowless().unwrap(), rowless().unwrap()])
            .unwrap();
        assert_eq!(results, vec![PartialResult::EMPTY]);

        // Wrong parameters would fail instantiation.
        let results = PartitionScorer::new(LINEAR, vec![0.; 7].into(), config)
            .unwrap()
            .score_partition([rowless().unwrap()])
            .unwrap();
        assert_eq!(results, vec![PartialResult::EMPTY]);
    }

    #[test]
    fn rowless_batches_are_skipped() {
        let rowless = LabeledBatch::new([("x", Array2::zeros((0, 2)))], Array2::zeros((0, 1)));
        let items = [
            rowless.clone().unwrap(),
            example(1., 1., 7.).into(),
            rowless.unwrap(),
            example(0., 0., 0.).into(),
        ];

        let results = scorer(8).score_partition(items).unwrap();
        assert_eq!(results, vec![PartialResult::from_score(2, 1.)]);
    }

    #[test]
    fn malformed_example_fails_the_partition() {
        let examples = [
            example(0., 0., 1.),
            Example::new([("x", arr1(&[0.]))], arr1(&[1.])),
        ];

        let res = scorer(1).score_partition(examples);
        assert!(matches!(res, Err(WorkerErr::BatchShape(_))));
    }

    #[test]
    fn unscored_batches_are_reported() {
        let config = WorkerConfig::new(NonZeroUsize::new(1).unwrap());
        let scorer =
            PartitionScorer::with_backend(LINEAR, vec![2., 3., 1.].into(), config, Box::new(Lazy));

        let res = scorer.score_partition([example(0., 0., 1.)]);
        assert!(matches!(res, Err(WorkerErr::Incomplete { batch: 0 })));
    }
}
