//! Partial results and their reduction into a job-wide score.
//!
//! Every scored batch produces a `PartialResult`. Reducing them with `combine` is
//! associative and commutative, so results can be merged in any order and grouping.

use std::{
    iter::Sum,
    mem,
    ops::{Add, AddAssign},
};

use bytemuck::{Pod, Zeroable};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkerErr};

/// The contribution of a single batch to the job-wide average score.
///
/// `weighted_sum` is the batch score times the amount of examples scored.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct PartialResult {
    pub count: u64,
    pub weighted_sum: f64,
}

impl PartialResult {
    /// What an empty partition reports, also the identity of `combine`.
    pub const EMPTY: Self = Self {
        count: 0,
        weighted_sum: 0.,
    };

    /// Creates the result of a batch of `count` examples that scored `score`.
    pub fn from_score(count: usize, score: f32) -> Self {
        Self {
            count: count as u64,
            weighted_sum: score as f64 * count as f64,
        }
    }

    /// Merges two partial results.
    pub fn combine(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            weighted_sum: self.weighted_sum + other.weighted_sum,
        }
    }

    /// The average score over every example accounted for, `NaN` if there are none.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }

        self.weighted_sum / self.count as f64
    }
}

impl Add for PartialResult {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(rhs)
    }
}

impl AddAssign for PartialResult {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.combine(rhs);
    }
}

impl Sum for PartialResult {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::EMPTY, Self::combine)
    }
}

impl<'a> Sum<&'a PartialResult> for PartialResult {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Folds every partial result into one.
pub fn reduce<I>(results: I) -> PartialResult
where
    I: IntoIterator<Item = PartialResult>,
{
    results.into_iter().sum()
}

/// The average score of every example in `results`.
///
/// # Returns
/// `Σ weighted_sum / Σ count`, `NaN` if no example was scored.
pub fn average<I>(results: I) -> f64
where
    I: IntoIterator<Item = PartialResult>,
{
    reduce(results).mean()
}

/// Reinterprets a list of results as raw bytes, ready to be shipped to the reducer.
pub fn encode(results: &[PartialResult]) -> &[u8] {
    bytemuck::cast_slice(results)
}

/// Reads back a list of results produced by `encode`.
///
/// # Errors
/// `InvalidResults` if `bytes` doesn't hold a whole number of results.
pub fn decode(bytes: &[u8]) -> Result<Vec<PartialResult>> {
    if bytes.len() % mem::size_of::<PartialResult>() != 0 {
        return Err(WorkerErr::InvalidResults { len: bytes.len() });
    }

    Ok(bytemuck::pod_collect_to_vec(bytes))
}

/// Reduces the results of a job whose partitions report one by one.
///
/// The reduction is only trusted once every partition of the job has reported, a job that
/// lost a partition along the way must fail instead of averaging what's left.
#[derive(Debug)]
pub struct Reduction {
    expected: usize,
    reported: usize,
    acc: PartialResult,
}

impl Reduction {
    /// Creates a new `Reduction`.
    ///
    /// # Arguments
    /// * `expected` - The amount of partitions of the job.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            reported: 0,
            acc: PartialResult::EMPTY,
        }
    }

    /// Accounts for the results of one partition.
    pub fn push(&mut self, results: &[PartialResult]) {
        self.reported += 1;
        self.acc += results.iter().sum::<PartialResult>();
    }

    /// Finishes the reduction.
    ///
    /// # Errors
    /// `MissingPartitions` unless exactly the expected amount of partitions reported.
    pub fn finish(self) -> Result<PartialResult> {
        if self.reported != self.expected {
            warn!(expected = self.expected, got = self.reported; "discarding incomplete job");
            return Err(WorkerErr::MissingPartitions {
                expected: self.expected,
                got: self.reported,
            });
        }

        Ok(self.acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(count: u64, weighted_sum: f64) -> PartialResult {
        PartialResult {
            count,
            weighted_sum,
        }
    }

    #[test]
    fn from_score_weights_by_count() {
        let r = PartialResult::from_score(4, 0.5);
        assert_eq!(r, pr(4, 2.));
        assert_eq!(r.mean(), 0.5);
    }

    #[test]
    fn empty_is_identity() {
        let r = pr(3, 1.5);
        assert_eq!(r + PartialResult::EMPTY, r);
        assert_eq!(PartialResult::EMPTY + r, r);
    }

    #[test]
    fn grouping_does_not_matter() {
        let (a, b, c) = (pr(1, 0.25), pr(2, 1.), pr(5, 2.5));
        assert_eq!((a + b) + c, a + (b + c));
        assert_eq!(a + b, b + a);
    }

    #[test]
    fn average_of_results() {
        let avg = average([pr(100, 50.), pr(100, 30.), pr(50, 20.)]);
        assert_eq!(avg, 100. / 250.);
    }

    #[test]
    fn average_without_examples_is_nan() {
        assert!(average([PartialResult::EMPTY]).is_nan());
        assert!(average([]).is_nan());
    }

    #[test]
    fn bytes_round_trip() {
        let results = [pr(100, 12.5), PartialResult::EMPTY];
        let bytes = encode(&results).to_vec();

        assert_eq!(bytes.len(), 32);
        assert_eq!(decode(&bytes).unwrap(), results);
    }

    #[test]
    fn decode_rejects_truncated_buffers() {
        let res = decode(&[0; 20]);
        assert!(matches!(res, Err(WorkerErr::InvalidResults { len: 20 })));
    }

    #[test]
    fn reduction_requires_every_partition() {
        let mut reduction = Reduction::new(3);
        reduction.push(&[pr(2, 1.)]);
        reduction.push(&[PartialResult::EMPTY]);

        assert!(matches!(
            reduction.finish(),
            Err(WorkerErr::MissingPartitions {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn complete_reduction() {
        let mut reduction = Reduction::new(2);
        reduction.push(&[pr(2, 1.), pr(1, 2.)]);
        reduction.push(&[PartialResult::EMPTY]);

        assert_eq!(reduction.finish().unwrap(), pr(3, 3.));
    }
}
