use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::batch::{Batch, Document, split_documents_into_batches};
use crate::config::BatchConfig;
use crate::error::ScanError;
use crate::parallel::{ExecutionStrategy, ProgressReporter, ProgressSection};

use super::scanner::BatchScanner;
use super::types::{CliError, ScanOutcome, ScanType};

/// Merged outcomes of one dispatch, in arrival order
#[derive(Debug)]
pub struct DispatchOutcome<R> {
    /// Batch errors keyed by the batch id reported by the scanner
    pub errors: HashMap<String, CliError>,
    pub results: Vec<R>,
}

impl<R> DispatchOutcome<R> {
    fn new() -> Self {
        Self {
            errors: HashMap::new(),
            results: Vec::new(),
        }
    }

    fn absorb(&mut self, outcome: ScanOutcome<R>) {
        if let Some(result) = outcome.result {
            self.results.push(result);
        }
        if let Some(error) = outcome.error {
            self.errors.insert(outcome.batch_id, error);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Splits documents into batches and scans them on a bounded worker pool
pub struct BatchDispatcher<'a> {
    config: &'a BatchConfig,
}

impl<'a> BatchDispatcher<'a> {
    pub fn new(config: &'a BatchConfig) -> Self {
        Self { config }
    }

    /// Scan every document of `documents` exactly once.
    ///
    /// Limits are resolved before anything is dispatched, so a configuration error never
    /// leaves a partial scan behind. A panic inside `scanner` is recorded as a
    /// `scan_panicked` error for that batch; the remaining batches still run. Blocks until
    /// every worker has been joined.
    pub fn run<S, P>(
        &self,
        scanner: &S,
        scan_type: ScanType,
        documents: &[Document],
        progress: &P,
    ) -> Result<DispatchOutcome<S::Output>, ScanError>
    where
        S: BatchScanner + ?Sized,
        P: ProgressReporter + ?Sized,
    {
        let limits = self.config.limits_for(scan_type)?;
        let batches = split_documents_into_batches(documents, limits);
        let batch_count = batches.len();

        progress.set_section_length(ProgressSection::Scan, batch_count);

        let workers = ExecutionStrategy::calculate_scan_workers(
            self.config.scans_per_cpu,
            self.config.max_parallel_scans,
        );
        let strategy = ExecutionStrategy::auto(batch_count, 2, workers);
        tracing::info!(
            "Scanning {} documents in {} {} batches ({:?})",
            documents.len(),
            batch_count,
            scan_type,
            strategy
        );

        let mut outcome = DispatchOutcome::new();
        let completed = strategy.execute(
            batches,
            |batch, worker_id| scan_one(scanner, batch, worker_id),
            |scan_outcome| {
                outcome.absorb(scan_outcome);
                progress.update(ProgressSection::Scan);
            },
        )?;

        tracing::debug!(
            "Dispatch finished: {}/{} batches, {} results, {} errors",
            completed,
            batch_count,
            outcome.results.len(),
            outcome.errors.len()
        );
        Ok(outcome)
    }
}

fn scan_one<S>(scanner: &S, batch: Batch<'_>, worker_id: usize) -> ScanOutcome<S::Output>
where
    S: BatchScanner + ?Sized,
{
    tracing::debug!(
        "[worker {}] scanning batch {} ({} files, {} bytes)",
        worker_id,
        batch.id(),
        batch.len(),
        batch.total_bytes()
    );

    match catch_unwind(AssertUnwindSafe(|| scanner.scan_batch(&batch))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let error = CliError::from_panic(payload);
            tracing::error!("[worker {}] batch {} panicked: {}", worker_id, batch.id(), error);
            ScanOutcome::failure(batch.id(), error)
        }
    }
}
