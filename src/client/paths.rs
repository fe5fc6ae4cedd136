//! URL path construction for the scan service endpoints

use crate::scan::ScanType;

const SCAN_SERVICE_CONTROLLER_PATH: &str = "api/v1/scan";
const SCAN_SERVICE_CLI_CONTROLLER_PATH: &str = "api/v1/cli-scan";
const DETECTIONS_SERVICE_CONTROLLER_PATH: &str = "api/v1/detections";
const DETECTIONS_SERVICE_CLI_CONTROLLER_PATH: &str = "api/v1/detections/cli";
const POLICIES_SERVICE_CONTROLLER_PATH_V3: &str = "api/v3/policies";
const DETECTIONS_PREFIX: &str = "detections";

/// Builds relative endpoint paths; the transport joins them onto the base url
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicePaths;

impl ServicePaths {
    pub fn service_name(&self, scan_type: ScanType, use_scan_service: bool) -> &'static str {
        if use_scan_service {
            return "scans";
        }
        match scan_type {
            ScanType::Secret => "secret",
            ScanType::Iac => "iac",
            ScanType::Sca | ScanType::Sast => "scans",
        }
    }

    pub fn scan_controller_path(&self, scan_type: ScanType, use_scan_service: bool) -> &'static str {
        match scan_type {
            // IaC has no async flow; secret scans that hit the detector directly skip the CLI controller
            ScanType::Iac | ScanType::Secret if !use_scan_service => SCAN_SERVICE_CONTROLLER_PATH,
            _ => SCAN_SERVICE_CLI_CONTROLLER_PATH,
        }
    }

    pub fn detections_controller_path(&self, scan_type: ScanType) -> &'static str {
        match scan_type {
            ScanType::Iac => DETECTIONS_SERVICE_CONTROLLER_PATH,
            _ => DETECTIONS_SERVICE_CLI_CONTROLLER_PATH,
        }
    }

    pub fn scan_flow_type(&self, use_sync_flow: bool) -> &'static str {
        if use_sync_flow { "/sync" } else { "" }
    }

    /// `{service}/{controller}{flow}`
    pub fn scan_service_url_path(
        &self,
        scan_type: ScanType,
        use_scan_service: bool,
        use_sync_flow: bool,
    ) -> String {
        format!(
            "{}/{}{}",
            self.service_name(scan_type, use_scan_service),
            self.scan_controller_path(scan_type, use_scan_service),
            self.scan_flow_type(use_sync_flow)
        )
    }

    /// Server-side name of the scan type in the async endpoints
    pub fn async_scan_type(&self, scan_type: ScanType) -> String {
        match scan_type {
            ScanType::Secret => "Secrets".to_string(),
            ScanType::Iac => "InfraConfiguration".to_string(),
            other => other.as_str().to_uppercase(),
        }
    }

    pub fn async_entity_type(&self, scan_type: ScanType) -> &'static str {
        match scan_type {
            ScanType::Secret => "zippedfile",
            _ => "repository",
        }
    }

    pub fn content_scan_path(&self, scan_type: ScanType) -> String {
        format!("{}/content", self.scan_service_url_path(scan_type, false, false))
    }

    pub fn zipped_file_scan_path(&self, scan_type: ScanType) -> String {
        format!("{}/zipped-file", self.scan_service_url_path(scan_type, false, false))
    }

    pub fn zipped_file_scan_async_path(&self, scan_type: ScanType, use_sync_flow: bool) -> String {
        format!(
            "{}/{}/{}",
            self.scan_service_url_path(scan_type, true, use_sync_flow),
            self.async_scan_type(scan_type),
            self.async_entity_type(scan_type)
        )
    }

    pub fn zipped_file_scan_sync_path(&self, scan_type: ScanType) -> String {
        format!(
            "{}/{}/repository",
            self.scan_service_url_path(scan_type, true, true),
            self.async_scan_type(scan_type)
        )
    }

    pub fn commit_range_scan_async_path(&self, scan_type: ScanType) -> String {
        format!(
            "{}/{}/repository/commit-range",
            self.scan_service_url_path(scan_type, false, false),
            scan_type
        )
    }

    pub fn commit_range_zipped_file_scan_path(&self, scan_type: ScanType) -> String {
        format!(
            "{}/commit-range-zipped-file",
            self.scan_service_url_path(scan_type, false, false)
        )
    }

    pub fn scan_details_path(&self, scan_type: ScanType, scan_id: &str) -> String {
        format!("{}/{scan_id}", self.scan_service_url_path(scan_type, true, false))
    }

    pub fn scan_report_url_path(&self, scan_id: &str, scan_type: ScanType) -> String {
        format!(
            "{}/reportUrl/{scan_id}",
            self.scan_service_url_path(scan_type, true, false)
        )
    }

    pub fn scan_aggregation_report_url_path(&self, aggregation_id: &str, scan_type: ScanType) -> String {
        format!(
            "{}/reportUrlByAggregationId/{aggregation_id}",
            self.scan_service_url_path(scan_type, true, false)
        )
    }

    pub fn report_scan_status_path(
        &self,
        scan_type: ScanType,
        scan_id: &str,
        use_scan_service: bool,
    ) -> String {
        format!(
            "{}/{scan_id}/status",
            self.scan_service_url_path(scan_type, use_scan_service, false)
        )
    }

    pub fn detection_rules_path(&self) -> String {
        format!("{DETECTIONS_PREFIX}/{POLICIES_SERVICE_CONTROLLER_PATH_V3}/detection_rules/byIds")
    }

    pub fn scan_detections_path(&self, scan_type: ScanType) -> String {
        format!("{DETECTIONS_PREFIX}/{}", self.detections_controller_path(scan_type))
    }

    pub fn scan_detections_list_path(&self, scan_type: ScanType) -> String {
        let suffix = match scan_type {
            ScanType::Iac => "",
            _ => "/detections",
        };
        format!("{}{suffix}", self.scan_detections_path(scan_type))
    }

    pub fn supported_modules_path(&self) -> &'static str {
        "preferences/api/v1/supportedmodules"
    }

    pub fn ai_remediation_path(&self, detection_id: &str) -> String {
        format!("scm-remediator/api/v1/ContentRemediation/preview/{detection_id}")
    }
}
