//! Worker-Pool Coordinator
//!
//! Partitions a stage's work items ahead of time and hands the partitions to
//! a fixed-size worker pool. Progress ticks flow through a bounded channel
//! drained by a single aggregator thread that renders the overall bar, so no
//! lock primitives cross worker boundaries.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::sync::mpsc::{self, SyncSender};
use std::thread;
use thiserror::Error;

/// Capacity of the progress channel. Producers block only while the
/// aggregator catches up; the aggregator drains until every sender drops,
/// so a full queue delays but never deadlocks.
const PROGRESS_QUEUE_CAPACITY: usize = 1024;

/// Errors from pool coordination itself (work errors are the caller's type)
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The rayon pool could not be constructed
    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),
}

/// Cloneable per-worker handle for reporting completed items
#[derive(Clone)]
pub struct ProgressHandle {
    tx: Option<SyncSender<()>>,
}

impl ProgressHandle {
    fn new(tx: SyncSender<()>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Handle that discards ticks; used when no aggregator is running
    pub fn noop() -> Self {
        Self { tx: None }
    }

    /// Record one completed work item.
    ///
    /// A closed channel (aggregator already gone) is not an error for the
    /// producer; the tick is simply dropped.
    pub fn tick(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(());
        }
    }
}

/// Fixed-size pool running pre-partitioned work to completion
pub struct WorkerPool {
    jobs: usize,
}

impl WorkerPool {
    /// Pool with `jobs` workers (clamped to at least one)
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    /// Number of workers
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run `work` over every item, partitioned round-robin into at most
    /// `jobs` chunks executed in parallel.
    ///
    /// Within one partition items run in order; across partitions there is no
    /// ordering guarantee. Every partition runs to completion even when
    /// another partition fails; the first error (in partition order) is then
    /// returned.
    pub fn run<T, E, F>(&self, label: &str, items: Vec<T>, work: F) -> Result<(), E>
    where
        T: Send,
        E: Send + From<SupervisorError>,
        F: Fn(T, &ProgressHandle) -> Result<(), E> + Send + Sync,
    {
        let total = items.len();
        if total == 0 {
            return Ok(());
        }

        let worker_count = self.jobs.min(total);
        let mut shards: Vec<Vec<T>> = (0..worker_count).map(|_| Vec::new()).collect();
        for (position, item) in items.into_iter().enumerate() {
            shards[position % worker_count].push(item);
        }

        let (tx, rx) = mpsc::sync_channel::<()>(PROGRESS_QUEUE_CAPACITY);
        let bar_label = label.to_string();
        let aggregator = thread::spawn(move || {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.set_message(bar_label.clone());
            while rx.recv().is_ok() {
                pb.inc(1);
            }
            pb.finish_with_message(format!("{} complete", bar_label));
        });

        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build()
            .map_err(|e| SupervisorError::PoolBuild(e.to_string()))?;

        let handle = ProgressHandle::new(tx.clone());
        let outcomes: Vec<Result<(), E>> = pool.install(|| {
            shards
                .into_par_iter()
                .map_with(handle, |handle, shard| {
                    for item in shard {
                        work(item, handle)?;
                    }
                    Ok(())
                })
                .collect()
        });

        // All producer clones are gone after the pool joins; dropping the
        // original sender lets the aggregator drain and exit.
        drop(tx);
        let _ = aggregator.join();

        for outcome in outcomes {
            outcome?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Error)]
    enum TestError {
        #[error("boom on {0}")]
        Boom(usize),
        #[error(transparent)]
        Supervisor(#[from] SupervisorError),
    }

    #[test]
    fn runs_every_item_exactly_once() {
        let pool = WorkerPool::new(4);
        let counter = AtomicUsize::new(0);

        let result: Result<(), TestError> =
            pool.run("test", (0..100).collect(), |_, handle| {
                counter.fetch_add(1, Ordering::SeqCst);
                handle.tick();
                Ok(())
            });

        result.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn empty_work_is_a_noop() {
        let pool = WorkerPool::new(2);
        let result: Result<(), TestError> = pool.run("test", Vec::<usize>::new(), |_, _| Ok(()));
        result.unwrap();
    }

    #[test]
    fn first_error_propagates_after_pool_finishes() {
        let pool = WorkerPool::new(2);
        let seen = Mutex::new(Vec::new());

        let result: Result<(), TestError> = pool.run("test", (0..10).collect(), |item, _| {
            seen.lock().unwrap().push(item);
            if item == 3 { Err(TestError::Boom(item)) } else { Ok(()) }
        });

        assert!(matches!(result, Err(TestError::Boom(3))));
        // Items from the other partition still ran (pool joined)
        assert!(seen.lock().unwrap().len() >= 5);
    }

    #[test]
    fn preserves_order_within_partition() {
        let pool = WorkerPool::new(1);
        let seen = Mutex::new(Vec::new());

        let result: Result<(), TestError> = pool.run("test", (0..20).collect(), |item, _| {
            seen.lock().unwrap().push(item);
            Ok(())
        });

        result.unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<usize>>());
    }

    #[test]
    fn jobs_clamped_to_one() {
        assert_eq!(WorkerPool::new(0).jobs(), 1);
    }
}
