//! Response models of the scan service
//!
//! Unknown fields are ignored and most fields default, so older and newer service versions
//! both decode.

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// One finding reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection {
    pub id: Option<String>,
    pub message: String,
    #[serde(rename = "type")]
    pub detection_type: Option<String>,
    pub severity: Option<String>,
    pub detection_rule_id: Option<String>,
    pub detection_details: serde_json::Value,
}

impl Detection {
    /// Lenient conversion from a raw detection object; undecodable entries keep their raw
    /// payload in `detection_details`
    pub fn from_raw(raw: serde_json::Value) -> Self {
        match serde_json::from_value::<Detection>(raw.clone()) {
            Ok(detection) => detection,
            Err(_) => Detection {
                detection_details: raw,
                ..Detection::default()
            },
        }
    }

    /// File the detection points at, when the service reports one
    pub fn file_path(&self) -> Option<&str> {
        self.detection_details
            .get("file_path")
            .or_else(|| self.detection_details.get("file_name"))
            .and_then(|value| value.as_str())
    }
}

/// Response of the single-content scan endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanResult {
    pub did_detect: bool,
    pub scan_id: String,
    pub detections: Option<Vec<Detection>>,
    pub err: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectionsPerFile {
    pub file_name: String,
    pub commit_id: Option<String>,
    pub detections: Vec<Detection>,
}

/// Response of the legacy zipped-file scan endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ZippedFileScanResult {
    pub did_detect: bool,
    pub detections_per_file: Vec<DetectionsPerFile>,
    pub report_url: Option<String>,
    pub scan_id: Option<String>,
    pub err: Option<String>,
}

/// Response of the async upload endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanInitializationResponse {
    pub scan_id: Option<String>,
    pub err: Option<String>,
}

impl ScanInitializationResponse {
    pub fn into_scan_id(self) -> Result<String, ScanError> {
        match (self.scan_id, self.err) {
            (Some(scan_id), None) => Ok(scan_id),
            (scan_id, err) => Err(ScanError::ScanFailed {
                scan_id: scan_id.unwrap_or_default(),
                message: err.unwrap_or_else(|| "service did not return a scan id".to_string()),
            }),
        }
    }
}

/// Response of the sync upload endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanResultsSyncFlow {
    pub id: String,
    pub detection_messages: Vec<serde_json::Value>,
}

/// Scan status as polled during the async flow
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanDetailsResponse {
    pub id: Option<String>,
    pub scan_status: String,
    pub results_count: Option<u64>,
    pub metadata: Option<String>,
    pub message: Option<String>,
    pub scan_update_at: Option<String>,
    pub err: Option<String>,
}

impl ScanDetailsResponse {
    pub const STATUS_COMPLETED: &'static str = "Completed";
    pub const STATUS_ERROR: &'static str = "Error";

    pub fn is_completed(&self) -> bool {
        self.scan_status == Self::STATUS_COMPLETED
    }

    pub fn is_failed(&self) -> bool {
        self.scan_status == Self::STATUS_ERROR || self.err.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanReportUrlResponse {
    pub report_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassificationData {
    pub severity: Option<String>,
    pub classification_rule_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectionRule {
    pub detection_rule_id: String,
    pub classification_data: Vec<ClassificationData>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub policy_name: Option<String>,
    pub remediation_guidelines: Option<String>,
    pub custom_remediation_guidelines: Option<String>,
}

/// Scan modules enabled for the tenant
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupportedModulesPreferences {
    pub secret_scanning: bool,
    pub leak_scanning: bool,
    pub iac_scanning: bool,
    pub sca_scanning: bool,
    pub ci_cd_scanning: bool,
    pub sast_scanning: bool,
    pub container_scanning: bool,
    pub access_review: bool,
    pub asoc: bool,
    pub cimon: bool,
    pub ai_machine_learning: bool,
    pub ai_large_language_model: bool,
}
