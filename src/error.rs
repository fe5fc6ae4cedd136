//! Error types shared by the batching core and the scan client.

use thiserror::Error;

/// Errors raised by scanlink operations.
///
/// Per-batch scan failures are not represented here at the dispatch level: they are
/// carried as [`CliError`](crate::scan::types::CliError) values inside a
/// [`ScanOutcome`](crate::scan::types::ScanOutcome). A `ScanError` returned from
/// [`BatchDispatcher::run`](crate::scan::BatchDispatcher::run) always means the whole
/// dispatch failed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("unknown scan type '{0}' (expected one of: secret, iac, sca, sast)")]
    UnknownScanType(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("worker pool failed: {0}")]
    PoolExecution(String),

    #[error("request to '{path}' failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status} for '{path}': {body}")]
    Status { path: String, status: u16, body: String },

    #[error("failed to decode response from '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build upload archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("scan {scan_id} did not complete within {timeout_secs}s")]
    PollTimeout { scan_id: String, timeout_secs: u64 },

    #[error("scan {scan_id} failed: {message}")]
    ScanFailed { scan_id: String, message: String },
}

impl ScanError {
    /// The service refused this batch's payload (too large, unprocessable content). Other
    /// batches are unaffected, so the failure is reported without failing the run.
    pub fn is_batch_rejection(&self) -> bool {
        matches!(self, ScanError::Status { status: 413 | 422, .. })
    }

    /// Short machine-readable code used when the error is reported per batch.
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::UnknownScanType(_) | ScanError::Configuration(_) => "configuration",
            ScanError::PoolExecution(_) => "pool_execution",
            ScanError::Transport { .. } => "transport",
            ScanError::Status { .. } => "http_status",
            ScanError::Decode { .. } => "decode",
            ScanError::Archive(_) => "archive",
            ScanError::Io(_) => "io",
            ScanError::PollTimeout { .. } => "scan_timeout",
            ScanError::ScanFailed { .. } => "scan_failed",
        }
    }
}
