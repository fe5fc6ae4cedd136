use crossbeam::channel::{Receiver, Sender, bounded};

use crate::error::ScanError;

/// Bounded producer/consumer executor over scoped worker threads
pub struct ParallelExecutor {
    max_workers: usize,
    buffer_size: usize,
}

impl ParallelExecutor {
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            max_workers,
            buffer_size: max_workers * 2,
        }
    }

    /// Execute work items in parallel using a producer-consumer pattern.
    ///
    /// `on_complete` runs on the calling thread once per finished item, in completion order.
    /// Returns the number of completed items. All worker threads are joined before returning.
    pub fn execute<T, R, F, C>(
        &self,
        work_items: Vec<T>,
        processor: F,
        mut on_complete: C,
    ) -> Result<usize, ScanError>
    where
        T: Send,
        R: Send,
        F: Fn(T, usize) -> R + Sync, // (item, worker_id)
        C: FnMut(R),
    {
        if work_items.is_empty() {
            return Ok(0);
        }

        let actual_workers = std::cmp::min(self.max_workers, work_items.len());
        let (work_tx, work_rx): (Sender<T>, Receiver<T>) = bounded(self.buffer_size);
        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(self.buffer_size);
        let processor = &processor;

        crossbeam::thread::scope(|s| {
            for worker_id in 0..actual_workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();

                s.spawn(move |_| {
                    while let Ok(work_item) = work_rx.recv() {
                        if result_tx.send(processor(work_item, worker_id)).is_err() {
                            break; // Collector gone
                        }
                    }
                });
            }

            // Producer thread: send work to workers
            s.spawn(move |_| {
                for work_item in work_items {
                    if work_tx.send(work_item).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            // Drop our handles so the channels close once workers finish
            drop(work_rx);
            drop(result_tx);

            let mut completed = 0;
            for result in result_rx.iter() {
                on_complete(result);
                completed += 1;
            }
            completed
        })
        .map_err(|_| ScanError::PoolExecution("worker thread panicked".to_string()))
    }
}

/// Sequential execution on the calling thread, same contract as [`ParallelExecutor`]
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn execute<T, R, F, C>(work_items: Vec<T>, processor: F, mut on_complete: C) -> usize
    where
        F: Fn(T, usize) -> R,
        C: FnMut(R),
    {
        let mut completed = 0;
        for work_item in work_items {
            on_complete(processor(work_item, 0)); // Sequential uses worker_id 0
            completed += 1;
        }
        completed
    }
}

/// Execution strategy enum for choosing between parallel and sequential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute<T, R, F, C>(
        &self,
        work_items: Vec<T>,
        processor: F,
        on_complete: C,
    ) -> Result<usize, ScanError>
    where
        T: Send,
        R: Send,
        F: Fn(T, usize) -> R + Sync,
        C: FnMut(R),
    {
        match self {
            ExecutionStrategy::Sequential => Ok(SequentialExecutor::execute(
                work_items,
                processor,
                on_complete,
            )),
            ExecutionStrategy::Parallel { workers } => {
                ParallelExecutor::new(*workers).execute(work_items, processor, on_complete)
            }
        }
    }

    /// Threshold decision between sequential and parallel execution.
    ///
    /// A single worker always runs sequentially.
    ///
    /// ```rust
    /// use scanlink::parallel::ExecutionStrategy;
    ///
    /// assert_eq!(ExecutionStrategy::auto(1, 2, 4), ExecutionStrategy::Sequential);
    /// assert_eq!(ExecutionStrategy::auto(10, 2, 1), ExecutionStrategy::Sequential);
    /// assert_eq!(
    ///     ExecutionStrategy::auto(10, 2, 4),
    ///     ExecutionStrategy::Parallel { workers: 4 }
    /// );
    /// ```
    pub fn auto(work_items_count: usize, min_items_for_parallel: usize, workers: usize) -> Self {
        if work_items_count >= min_items_for_parallel && workers > 1 {
            ExecutionStrategy::Parallel { workers }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Worker count for concurrent scans: `min(cores * scans_per_cpu, max_parallel_scans)`.
    ///
    /// `num_cpus::get()` reports at least one core when the count is undeterminable; the
    /// result is never below one.
    pub fn calculate_scan_workers(scans_per_cpu: usize, max_parallel_scans: usize) -> usize {
        Self::scan_workers_for_cores(num_cpus::get(), scans_per_cpu, max_parallel_scans)
    }

    fn scan_workers_for_cores(cores: usize, scans_per_cpu: usize, max_parallel_scans: usize) -> usize {
        let by_cpu = cores.max(1).saturating_mul(scans_per_cpu);
        std::cmp::max(1, std::cmp::min(by_cpu, max_parallel_scans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_sequential_executor() {
        let mut results = Vec::new();
        let completed =
            SequentialExecutor::execute(vec![1, 2, 3, 4, 5], |x, _worker_id| x * 2, |r| results.push(r));
        assert_eq!(completed, 5);
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_parallel_executor() {
        let executor = ParallelExecutor::new(2);
        let mut results = Vec::new();
        let completed = executor
            .execute(vec![1, 2, 3, 4, 5], |x, _worker_id| x * 2, |r| results.push(r))
            .unwrap();

        assert_eq!(completed, 5);
        // Results may be in different order due to parallel execution
        results.sort();
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_parallel_executor_borrows_from_caller() {
        let words = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let borrowed: Vec<&String> = words.iter().collect();

        let mut lengths = Vec::new();
        ParallelExecutor::new(3)
            .execute(borrowed, |word, _| word.len(), |len| lengths.push(len))
            .unwrap();

        lengths.sort();
        assert_eq!(lengths, vec![4, 5, 5]);
    }

    #[test]
    fn test_parallel_executor_bounds_concurrency() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        ParallelExecutor::new(3)
            .execute(
                (0..24).collect::<Vec<_>>(),
                |item, _| {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    item
                },
                |_| {},
            )
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_work_returns_immediately() {
        let completed = ParallelExecutor::new(4)
            .execute(Vec::<u8>::new(), |x, _| x, |_| panic!("no results expected"))
            .unwrap();
        assert_eq!(completed, 0);
    }

    #[test]
    fn test_worker_panic_surfaces_as_pool_error() {
        let result = ParallelExecutor::new(2).execute(
            vec![1, 2, 3],
            |x: i32, _| {
                if x == 2 {
                    panic!("boom");
                }
                x
            },
            |_| {},
        );
        assert!(matches!(result, Err(ScanError::PoolExecution(_))));
    }

    #[test]
    fn test_execution_strategy() {
        let mut seq_results = Vec::new();
        ExecutionStrategy::Sequential
            .execute(vec![1, 2, 3], |x, _| x * 3, |r| seq_results.push(r))
            .unwrap();
        assert_eq!(seq_results, vec![3, 6, 9]);

        let mut par_results = Vec::new();
        ExecutionStrategy::Parallel { workers: 2 }
            .execute(vec![1, 2, 3], |x, _| x * 3, |r| par_results.push(r))
            .unwrap();
        par_results.sort();
        assert_eq!(par_results, vec![3, 6, 9]);
    }

    #[test]
    fn test_auto_strategy() {
        assert_eq!(ExecutionStrategy::auto(1, 2, 8), ExecutionStrategy::Sequential);
        assert_eq!(ExecutionStrategy::auto(5, 2, 1), ExecutionStrategy::Sequential);
        assert_eq!(
            ExecutionStrategy::auto(5, 2, 8),
            ExecutionStrategy::Parallel { workers: 8 }
        );
    }

    #[test]
    fn test_scan_worker_calculation() {
        assert_eq!(ExecutionStrategy::scan_workers_for_cores(8, 1, 5), 5);
        assert_eq!(ExecutionStrategy::scan_workers_for_cores(2, 1, 5), 2);
        assert_eq!(ExecutionStrategy::scan_workers_for_cores(2, 2, 5), 4);
        assert_eq!(ExecutionStrategy::scan_workers_for_cores(0, 1, 5), 1);
        assert_eq!(ExecutionStrategy::scan_workers_for_cores(4, 0, 5), 1);

        let workers = ExecutionStrategy::calculate_scan_workers(1, 5);
        assert!((1..=5).contains(&workers));
    }
}
