//! Generic parallel execution framework
//!
//! Provides the bounded worker pool the dispatcher fans batches out on, and the section-based
//! progress reporters it updates.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores using `num_cpus::get()`
//! - **Resource Calculation**: Caps workers at `min(cores * scans_per_cpu, max_parallel_scans)`
//! - **Execution Strategy**: Sequential vs Parallel execution with worker management
//! - **Thread Safety**: crossbeam scoped threads and bounded channels; thread-safe progress sinks
//!
//! ## What This Module Does NOT Do:
//! - **Domain Logic**: Knows nothing about documents, batches or scan types
//! - **Cancellation**: Work items run to completion; timeouts belong inside the processor
//!
//! # Example Usage
//!
//! ```rust
//! use scanlink::parallel::ExecutionStrategy;
//!
//! let workers = ExecutionStrategy::calculate_scan_workers(1, 5);
//! let strategy = ExecutionStrategy::auto(10, 2, workers);
//!
//! let mut total = 0;
//! strategy
//!     .execute(vec![1, 2, 3], |x, _worker_id| x * 2, |r| total += r)
//!     .unwrap();
//! assert_eq!(total, 12);
//! ```

pub mod core;
pub mod progress;

pub use self::core::{ExecutionStrategy, ParallelExecutor, SequentialExecutor};
pub use self::progress::{CountingProgress, ProgressReporter, ProgressSection, ScanProgressBar};
