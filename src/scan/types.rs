use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::str::FromStr;

use crate::client::models::Detection;
use crate::error::ScanError;

/// Category of analysis; selects the batch size limit and the service endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Secret,
    Iac,
    Sca,
    Sast,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Secret => "secret",
            ScanType::Iac => "iac",
            ScanType::Sca => "sca",
            ScanType::Sast => "sast",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secret" => Ok(ScanType::Secret),
            "iac" => Ok(ScanType::Iac),
            "sca" => Ok(ScanType::Sca),
            "sast" => Ok(ScanType::Sast),
            _ => Err(ScanError::UnknownScanType(s.to_string())),
        }
    }
}

/// A reportable per-batch failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    /// Failure should be reported but not fail the run
    pub soft_fail: bool,
}

impl CliError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            soft_fail: false,
        }
    }

    pub fn soft(mut self) -> Self {
        self.soft_fail = true;
        self
    }

    /// Convert a caught panic payload into a batch error
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "scan panicked".to_string()
        };
        Self::new("scan_panicked", message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

impl From<&ScanError> for CliError {
    fn from(err: &ScanError) -> Self {
        let error = CliError::new(err.code(), err.to_string());
        if err.is_batch_rejection() { error.soft() } else { error }
    }
}

/// What a scanner hands back for one batch
#[derive(Debug, Clone)]
pub struct ScanOutcome<R> {
    pub batch_id: String,
    pub error: Option<CliError>,
    pub result: Option<R>,
}

impl<R> ScanOutcome<R> {
    pub fn success(batch_id: impl Into<String>, result: R) -> Self {
        Self {
            batch_id: batch_id.into(),
            error: None,
            result: Some(result),
        }
    }

    pub fn failure(batch_id: impl Into<String>, error: CliError) -> Self {
        Self {
            batch_id: batch_id.into(),
            error: Some(error),
            result: None,
        }
    }
}

/// Result of one remotely scanned batch
#[derive(Debug, Clone, Serialize)]
pub struct LocalScanResult {
    pub scan_id: String,
    pub scan_type: ScanType,
    pub documents_count: usize,
    pub detections: Vec<Detection>,
    pub report_url: Option<String>,
    pub issue_detected: bool,
}
