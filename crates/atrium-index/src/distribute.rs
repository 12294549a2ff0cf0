//! Bounded-parallel work distribution.
//!
//! [`WorkDistributor`] splits a finite slice into contiguous, disjoint
//! per-worker ranges and processes them on scoped threads. Ranges never
//! overlap, so workers need no coordination on the data itself; a single
//! mutex guards only the shared progress counter. Each range is walked in
//! bounded sub-batches so a worker never holds more than
//! [`MAX_BATCH_SIZE`] items' worth of intermediate state at once.

use std::{
    fmt,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

/// Upper bound on the number of items a worker takes per sub-batch.
pub const MAX_BATCH_SIZE: usize = 1_000;

/// Callback for observing bulk-processing progress.
///
/// Called under no lock ordering guarantees beyond the counter itself:
/// `processed` is monotonically increasing across all calls, but calls from
/// different workers may interleave.
pub trait ProgressReporter: Sync {
    /// Called after each item attempt with the running totals.
    fn on_progress(&self, processed: usize, total: usize);
}

/// A no-op reporter for silent bulk runs.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn on_progress(&self, _processed: usize, _total: usize) {}
}

/// One item that failed during a rescue-mode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Position of the item in the input slice.
    pub index: usize,
    /// Rendered error message.
    pub message: String,
}

/// Splits work across a bounded pool of scoped worker threads.
#[derive(Debug, Clone, Copy)]
pub struct WorkDistributor {
    /// Requested worker count; clamped to the item count per run.
    workers: usize,
}

impl WorkDistributor {
    /// Creates a distributor with the given worker count.
    ///
    /// A count of zero behaves as one worker.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Processes every item exactly once across the worker pool.
    ///
    /// Items are partitioned into `ceil(total / workers)`-sized contiguous
    /// ranges, one per worker. When `rescue_errors` is false, the first
    /// failure raises the abort flag, remaining work is skipped and that
    /// error is returned. When true, failures are collected per item (in
    /// input order) and the run continues to completion.
    ///
    /// An empty input is a no-op, not an error.
    pub fn run<T, E, F>(
        &self,
        items: &[T],
        rescue_errors: bool,
        reporter: &dyn ProgressReporter,
        process: F,
    ) -> Result<Vec<ItemFailure>, E>
    where
        T: Sync,
        E: Send + fmt::Display,
        F: Fn(&T) -> Result<(), E> + Sync,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let workers = self.workers.min(total);
        let range_size = total.div_ceil(workers);

        let progress = Mutex::new(0_usize);
        let failures = Mutex::new(Vec::new());
        let abort = AtomicBool::new(false);
        let first_error: Mutex<Option<E>> = Mutex::new(None);

        thread::scope(|scope| {
            let progress = &progress;
            let failures = &failures;
            let abort = &abort;
            let first_error = &first_error;
            let process = &process;

            for (worker, range) in items.chunks(range_size).enumerate() {
                let base = worker * range_size;
                scope.spawn(move || {
                    let mut offset = 0;
                    for batch in range.chunks(MAX_BATCH_SIZE) {
                        for (position, item) in batch.iter().enumerate() {
                            if abort.load(Ordering::Relaxed) {
                                return;
                            }
                            if let Err(error) = process(item) {
                                if rescue_errors {
                                    failures.lock().unwrap().push(ItemFailure {
                                        index: base + offset + position,
                                        message: error.to_string(),
                                    });
                                } else {
                                    abort.store(true, Ordering::Relaxed);
                                    let mut slot = first_error.lock().unwrap();
                                    if slot.is_none() {
                                        *slot = Some(error);
                                    }
                                    return;
                                }
                            }
                            let mut done = progress.lock().unwrap();
                            *done += 1;
                            reporter.on_progress(*done, total);
                        }
                        offset += batch.len();
                    }
                });
            }
        });

        if let Some(error) = first_error.into_inner().unwrap() {
            return Err(error);
        }

        let mut failures = failures.into_inner().unwrap();
        failures.sort_by_key(|failure| failure.index);
        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Reporter that records every reported progress count.
    #[derive(Default)]
    struct CountingReporter {
        counts: Mutex<Vec<usize>>,
    }

    impl ProgressReporter for CountingReporter {
        fn on_progress(&self, processed: usize, _total: usize) {
            self.counts.lock().unwrap().push(processed);
        }
    }

    fn run_and_collect(total: usize, workers: usize) -> Vec<usize> {
        let items: Vec<usize> = (0..total).collect();
        let seen = Mutex::new(Vec::new());

        WorkDistributor::new(workers)
            .run(&items, false, &NullReporter, |item| {
                seen.lock().unwrap().push(*item);
                Ok::<(), String>(())
            })
            .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        seen
    }

    #[test]
    fn every_item_is_processed_exactly_once() {
        for (total, workers) in [(1, 1), (7, 3), (23, 4), (100, 8), (5, 5)] {
            let seen = run_and_collect(total, workers);
            assert_eq!(seen, (0..total).collect::<Vec<_>>());
        }
    }

    #[test]
    fn workers_exceeding_items_are_clamped() {
        let seen = run_and_collect(3, 16);
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn empty_input_is_a_noop() {
        let items: Vec<usize> = Vec::new();
        let failures = WorkDistributor::new(4)
            .run(&items, false, &NullReporter, |_| -> Result<(), String> {
                panic!("must not be called")
            })
            .unwrap();
        assert!(failures.is_empty());
    }

    #[test]
    fn single_worker_preserves_input_order() {
        let items: Vec<usize> = (0..20).collect();
        let seen = Mutex::new(Vec::new());

        WorkDistributor::new(1)
            .run(&items, false, &NullReporter, |item| {
                seen.lock().unwrap().push(*item);
                Ok::<(), String>(())
            })
            .unwrap();

        assert_eq!(seen.into_inner().unwrap(), items);
    }

    #[test]
    fn first_error_aborts_the_run() {
        let items: Vec<usize> = (0..1000).collect();
        let attempts = AtomicUsize::new(0);

        let result = WorkDistributor::new(2).run(&items, false, &NullReporter, |item| {
            attempts.fetch_add(1, Ordering::Relaxed);
            if *item == 3 {
                Err("item 3 is broken".to_string())
            } else {
                Ok(())
            }
        });

        assert_eq!(result.unwrap_err(), "item 3 is broken");
        assert!(attempts.load(Ordering::Relaxed) < items.len());
    }

    #[test]
    fn rescue_mode_collects_failures_and_finishes() {
        let items: Vec<usize> = (0..30).collect();
        let attempts = AtomicUsize::new(0);

        let failures = WorkDistributor::new(3)
            .run(&items, true, &NullReporter, |item| {
                attempts.fetch_add(1, Ordering::Relaxed);
                if item % 10 == 0 {
                    Err(format!("item {item} is broken"))
                } else {
                    Ok(())
                }
            })
            .unwrap();

        assert_eq!(attempts.load(Ordering::Relaxed), items.len());
        let indices: Vec<usize> = failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 10, 20]);
        assert_eq!(failures[1].message, "item 10 is broken");
    }

    #[test]
    fn progress_counts_are_monotonic_and_complete() {
        let items: Vec<usize> = (0..50).collect();
        let reporter = CountingReporter::default();

        WorkDistributor::new(4)
            .run(&items, false, &reporter, |_| Ok::<(), String>(()))
            .unwrap();

        let counts = reporter.counts.into_inner().unwrap();
        assert_eq!(counts.len(), items.len());
        assert!(counts.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(counts.last(), Some(&items.len()));
    }
}
