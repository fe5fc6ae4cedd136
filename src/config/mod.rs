//! Configuration management for scanlink
//!
//! Typed configuration sections, loaded and layered by [`ScanlinkConfig::load`]. The defaults
//! below mirror `default-config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::batch::BatchLimits;
use crate::error::ScanError;
use crate::scan::ScanType;

pub mod core;

pub use self::core::ScanlinkConfig;

/// Connection settings for the scan service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,

    /// Bearer token; never serialized back out
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub timeout_secs: u64,

    /// Request timeout for the synchronous scan flow
    pub sync_scan_timeout_secs: u64,

    pub ai_remediation_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            token: None,
            timeout_secs: 60,
            sync_scan_timeout_secs: 180,
            ai_remediation_timeout_secs: 60,
        }
    }
}

/// Batch ceilings and worker pool sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Byte ceiling for scan types without an entry in `max_size_in_bytes`
    pub default_max_size_in_bytes: Option<u64>,

    /// Per-scan-type byte ceilings, keyed by scan type name
    pub max_size_in_bytes: BTreeMap<String, u64>,

    pub max_files_count: usize,
    pub scans_per_cpu: usize,
    pub max_parallel_scans: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_max_size_in_bytes: Some(9 * 1024 * 1024),
            max_size_in_bytes: BTreeMap::from([(ScanType::Sast.to_string(), 50 * 1024 * 1024)]),
            max_files_count: 1000,
            scans_per_cpu: 1,
            max_parallel_scans: 5,
        }
    }
}

impl BatchConfig {
    /// Resolve the batch limits for `scan_type`, falling back to the default byte ceiling
    pub fn limits_for(&self, scan_type: ScanType) -> Result<BatchLimits, ScanError> {
        let max_bytes = self
            .max_size_in_bytes
            .get(scan_type.as_str())
            .copied()
            .or(self.default_max_size_in_bytes)
            .ok_or_else(|| {
                ScanError::Configuration(format!(
                    "no batch size limit configured for scan type '{scan_type}' and no default"
                ))
            })?;

        BatchLimits::new(max_bytes, self.max_files_count)
    }
}

/// Scan status polling for the asynchronous flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            timeout_secs: 3600,
        }
    }
}

/// Which upload flow to use and how
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanFlowConfig {
    pub use_sync_flow: bool,
    pub is_git_diff: bool,
    /// Ask the service for a report url per batch
    pub report: bool,
}

/// File collection limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    pub max_file_size_bytes: u64,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * 1024 * 1024,
        }
    }
}
