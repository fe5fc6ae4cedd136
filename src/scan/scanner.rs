use std::thread;
use std::time::{Duration, Instant};

use crate::batch::Batch;
use crate::client::ScanClient;
use crate::client::archive::InMemoryZip;
use crate::client::models::{Detection, ScanDetailsResponse};
use crate::config::{PollingConfig, ScanFlowConfig};
use crate::error::ScanError;

use super::types::{CliError, LocalScanResult, ScanOutcome, ScanType};

/// Scans one batch. Called concurrently from several worker threads.
///
/// Expected failures are reported through [`ScanOutcome::error`], never by panicking.
pub trait BatchScanner: Sync {
    type Output: Send;

    fn scan_batch(&self, batch: &Batch<'_>) -> ScanOutcome<Self::Output>;
}

impl<F, R> BatchScanner for F
where
    F: Fn(&Batch<'_>) -> ScanOutcome<R> + Sync,
    R: Send,
{
    type Output = R;

    fn scan_batch(&self, batch: &Batch<'_>) -> ScanOutcome<R> {
        self(batch)
    }
}

/// (scan id, detections, report url)
type RemoteScan = (String, Vec<Detection>, Option<String>);

/// Uploads each batch as a zip archive and waits for its detections
pub struct RemoteBatchScanner<'a> {
    client: &'a ScanClient,
    scan_type: ScanType,
    flow: ScanFlowConfig,
    polling: PollingConfig,
}

impl<'a> RemoteBatchScanner<'a> {
    pub fn new(
        client: &'a ScanClient,
        scan_type: ScanType,
        flow: ScanFlowConfig,
        polling: PollingConfig,
    ) -> Self {
        Self {
            client,
            scan_type,
            flow,
            polling,
        }
    }

    fn scan_parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "scan_type": self.scan_type.as_str(),
            "report": self.flow.report,
        })
    }

    fn run(&self, batch: &Batch<'_>) -> Result<LocalScanResult, ScanError> {
        let zip = InMemoryZip::from_batch(batch)?;

        let (scan_id, detections, report_url) = if self.flow.use_sync_flow {
            self.scan_sync(&zip)?
        } else {
            self.scan_async(&zip)?
        };

        Ok(LocalScanResult {
            scan_id,
            scan_type: self.scan_type,
            documents_count: batch.len(),
            issue_detected: !detections.is_empty(),
            detections,
            report_url,
        })
    }

    fn scan_sync(&self, zip: &InMemoryZip) -> Result<RemoteScan, ScanError> {
        let response = self.client.zipped_file_scan_sync(
            zip,
            self.scan_type,
            self.scan_parameters(),
            self.flow.is_git_diff,
        )?;
        let detections = response
            .detection_messages
            .into_iter()
            .map(Detection::from_raw)
            .collect();
        Ok((response.id, detections, None))
    }

    fn scan_async(&self, zip: &InMemoryZip) -> Result<RemoteScan, ScanError> {
        let init = self.client.zipped_file_scan_async(
            zip,
            self.scan_type,
            self.scan_parameters(),
            self.flow.is_git_diff,
            false,
        )?;
        let scan_id = init.into_scan_id()?;
        let details = self.wait_for_completion(&scan_id)?;
        tracing::debug!(
            "Scan {} completed with {:?} results",
            scan_id,
            details.results_count
        );

        let detections = self
            .client
            .scan_raw_detections(self.scan_type, &scan_id)?
            .into_iter()
            .map(Detection::from_raw)
            .collect();
        let report_url = if self.flow.report {
            Some(self.client.scan_report_url(&scan_id, self.scan_type)?.report_url)
        } else {
            None
        };
        Ok((scan_id, detections, report_url))
    }

    fn wait_for_completion(&self, scan_id: &str) -> Result<ScanDetailsResponse, ScanError> {
        let started = Instant::now();
        let timeout = Duration::from_secs(self.polling.timeout_secs);
        let interval = Duration::from_millis(self.polling.interval_ms);

        loop {
            let details = self.client.scan_details(self.scan_type, scan_id)?;
            if details.is_completed() {
                return Ok(details);
            }
            if details.is_failed() {
                return Err(ScanError::ScanFailed {
                    scan_id: scan_id.to_string(),
                    message: details
                        .message
                        .unwrap_or_else(|| details.scan_status.clone()),
                });
            }

            if started.elapsed() >= timeout {
                return Err(ScanError::PollTimeout {
                    scan_id: scan_id.to_string(),
                    timeout_secs: self.polling.timeout_secs,
                });
            }
            tracing::trace!("Scan {} is {}, polling again", scan_id, details.scan_status);
            thread::sleep(interval);
        }
    }
}

impl BatchScanner for RemoteBatchScanner<'_> {
    type Output = LocalScanResult;

    fn scan_batch(&self, batch: &Batch<'_>) -> ScanOutcome<LocalScanResult> {
        match self.run(batch) {
            Ok(result) => ScanOutcome::success(result.scan_id.clone(), result),
            Err(err) => {
                tracing::warn!("Batch {} failed: {}", batch.id(), err);
                ScanOutcome::failure(batch.id(), CliError::from(&err))
            }
        }
    }
}
