use std::{num::NonZeroUsize, sync::Arc};

use log::{error, trace};
use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{Job, NumericBackend};
use crate::error::{Result, WorkerErr};

/// Counts the jobs that were dispatched but haven't finished yet.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    changed: Condvar,
}

/// Marks a job as finished when dropped, even if the job panicked.
struct Finished(Arc<InFlight>);

impl Drop for Finished {
    fn drop(&mut self) {
        let mut count = self.0.count.lock();
        *count -= 1;
        self.0.changed.notify_all();
    }
}

/// Runs jobs on a dedicated thread while the caller keeps producing the next ones.
///
/// Jobs are run one at a time in dispatch order. `dispatch` blocks while
/// `max_in_flight` jobs are pending.
pub struct Deferred {
    pool: ThreadPool,
    max_in_flight: usize,
    in_flight: Arc<InFlight>,
}

impl Deferred {
    /// Creates a new `Deferred` backend.
    ///
    /// # Arguments
    /// * `max_in_flight` - The maximum amount of pending jobs.
    ///
    /// # Errors
    /// `Executor` if the scoring thread can't be spawned.
    pub fn new(max_in_flight: NonZeroUsize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|i| format!("scoring-{i}"))
            .panic_handler(|_| error!("a scoring job panicked"))
            .build()
            .map_err(|e| WorkerErr::Executor(e.to_string()))?;

        Ok(Self {
            pool,
            max_in_flight: max_in_flight.get(),
            in_flight: Arc::default(),
        })
    }
}

impl NumericBackend for Deferred {
    fn dispatch(&self, job: Job) -> Result<()> {
        {
            let mut count = self.in_flight.count.lock();
            while *count >= self.max_in_flight {
                self.in_flight.changed.wait(&mut count);
            }
            *count += 1;
            trace!(in_flight = *count; "dispatching job");
        }

        let finished = Finished(Arc::clone(&self.in_flight));
        self.pool.spawn_fifo(move || {
            let _finished = finished;
            job();
        });

        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut count = self.in_flight.count.lock();
        while *count > 0 {
            self.in_flight.changed.wait(&mut count);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    fn deferred(max_in_flight: usize) -> Deferred {
        Deferred::new(NonZeroUsize::new(max_in_flight).unwrap()).unwrap()
    }

    #[test]
    fn commit_waits_for_every_job() {
        let backend = deferred(2);
        let out = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let out = Arc::clone(&out);
            backend
                .dispatch(Box::new(move || {
                    thread::sleep(Duration::from_millis(5));
                    out.lock().push(i);
                }))
                .unwrap();
        }

        backend.commit().unwrap();
        assert_eq!(*out.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn in_flight_is_bounded() {
        let backend = deferred(1);
        let peak = Arc::new(Mutex::new(0));

        for _ in 0..4 {
            let (in_flight, peak) = (Arc::clone(&backend.in_flight), Arc::clone(&peak));
            backend
                .dispatch(Box::new(move || {
                    let mut peak = peak.lock();
                    *peak = (*peak).max(*in_flight.count.lock());
                }))
                .unwrap();
        }

        backend.commit().unwrap();
        assert_eq!(*peak.lock(), 1);
    }

    #[test]
    fn panicking_job_does_not_hang_commit() {
        let backend = deferred(1);

        backend.dispatch(Box::new(|| panic!("boom"))).unwrap();
        backend.commit().unwrap();
        assert_eq!(*backend.in_flight.count.lock(), 0);
    }
}
