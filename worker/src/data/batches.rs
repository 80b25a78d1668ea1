use std::num::NonZeroUsize;

use log::trace;
use machine_learning::{MlErr, data::LabeledBatch};

use crate::error::{Result, WorkerErr};

/// Streaming loader regrouping a partition's examples into minibatches.
///
/// Every batch holds exactly `minibatch_size` examples except possibly the last one.
/// Items are taken lazily; besides the batch under construction only the leftover rows
/// of a single oversized item are kept around.
pub struct Batches<I> {
    items: I,
    minibatch_size: usize,
    schema: Option<LabeledBatch>,
    leftover: Option<LabeledBatch>,
    cursor: usize, // examples already yielded
    done: bool,
}

impl<I, T> Batches<I>
where
    I: Iterator<Item = T>,
    T: Into<LabeledBatch>,
{
    /// Creates a new `Batches` iterator.
    ///
    /// # Args
    /// * `items` - The partition's examples or small batches, in order.
    /// * `minibatch_size` - The amount of examples per batch.
    ///
    /// # Returns
    /// A `Batches` instance.
    pub fn new<It>(items: It, minibatch_size: NonZeroUsize) -> Self
    where
        It: IntoIterator<IntoIter = I>,
    {
        Self {
            items: items.into_iter(),
            minibatch_size: minibatch_size.get(),
            schema: None,
            leftover: None,
            cursor: 0,
            done: false,
        }
    }

    /// Returns the amount of examples yielded so far.
    pub fn yielded(&self) -> usize {
        self.cursor
    }

    fn next_item(&mut self) -> Option<LabeledBatch> {
        self.leftover
            .take()
            .or_else(|| self.items.next().map(Into::into))
    }

    /// Checks `item` against the schema of the first item of the stream.
    fn check_schema(&mut self, item: LabeledBatch, row: usize) -> Result<LabeledBatch> {
        match &self.schema {
            Some(schema) if !schema.same_schema(&item) => {
                Err(WorkerErr::BatchShape(MlErr::SchemaMismatch { row }))
            }
            Some(_) => Ok(item),
            None => {
                let (schema, item) = item.split_at(0);
                self.schema = Some(schema);
                Ok(item)
            }
        }
    }

    fn assemble(&mut self) -> Option<Result<LabeledBatch>> {
        let mut parts = Vec::new();
        let mut rows = 0;

        while rows < self.minibatch_size {
            let Some(item) = self.next_item() else {
                break;
            };

            let item = match self.check_schema(item, self.cursor + rows) {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };

            let room = self.minibatch_size - rows;
            if item.len() > room {
                let (head, tail) = item.split_at(room);
                self.leftover = Some(tail);
                rows += head.len();
                parts.push(head);
            } else if !item.is_empty() {
                rows += item.len();
                parts.push(item);
            }
        }

        if parts.is_empty() {
            return None;
        }

        trace!(rows = rows, parts = parts.len(); "assembled batch");
        self.cursor += rows;

        match parts.len() {
            1 => parts.pop().map(Ok),
            _ => Some(LabeledBatch::concat(&parts).map_err(WorkerErr::BatchShape)),
        }
    }
}

impl<I, T> Iterator for Batches<I>
where
    I: Iterator<Item = T>,
    T: Into<LabeledBatch>,
{
    type Item = Result<LabeledBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let next = self.assemble();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use machine_learning::data::Example;
    use ndarray::{Array2, arr1, arr2};

    use super::*;

    fn example(i: usize) -> Example {
        let v = i as f32;
        Example::new([("x", arr1(&[v, -v]))], arr1(&[v]))
    }

    fn batches(n: usize, size: usize) -> Batches<impl Iterator<Item = Example>> {
        Batches::new((0..n).map(example), NonZeroUsize::new(size).unwrap())
    }

    fn sizes<I: Iterator<Item = Result<LabeledBatch>>>(it: I) -> Vec<usize> {
        it.map(|b| b.unwrap().len()).collect()
    }

    #[test]
    fn full_batches_then_remainder() {
        assert_eq!(sizes(batches(250, 100)), vec![100, 100, 50]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_batch() {
        assert_eq!(sizes(batches(200, 100)), vec![100, 100]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(batches(0, 8).count(), 0);
    }

    #[test]
    fn preserves_order_across_batches() {
        let labels: Vec<f32> = batches(7, 3)
            .flat_map(|b| b.unwrap().labels().iter().copied().collect::<Vec<_>>())
            .collect();

        assert_eq!(labels, (0..7).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn splits_oversized_items() {
        let item = |rows: usize, start: f32| {
            let labels = Array2::from_shape_fn((rows, 1), |(i, _)| start + i as f32);
            LabeledBatch::new([("x", labels.clone())], labels).unwrap()
        };

        let mut it = Batches::new(
            [item(5, 0.), item(1, 5.), item(4, 6.)],
            NonZeroUsize::new(4).unwrap(),
        );

        let first = it.next().unwrap().unwrap();
        assert_eq!(first.labels(), arr2(&[[0.], [1.], [2.], [3.]]));

        let second = it.next().unwrap().unwrap();
        assert_eq!(second.labels(), arr2(&[[4.], [5.], [6.], [7.]]));

        let third = it.next().unwrap().unwrap();
        assert_eq!(third.labels(), arr2(&[[8.], [9.]]));

        assert!(it.next().is_none());
        assert_eq!(it.yielded(), 10);
    }

    #[test]
    fn schema_change_fails_and_fuses() {
        let odd = Example::new([("x", arr1(&[1., 2., 3.]))], arr1(&[1.]));
        let items = (0..3).map(example).chain([odd]).chain((0..3).map(example));
        let mut it = Batches::new(items, NonZeroUsize::new(2).unwrap());

        assert_eq!(it.next().unwrap().unwrap().len(), 2);
        assert!(matches!(
            it.next(),
            Some(Err(WorkerErr::BatchShape(MlErr::SchemaMismatch { row: 3 })))
        ));
        assert!(it.next().is_none());
    }
}
