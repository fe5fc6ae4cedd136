//! REST client for the scan service
//!
//! [`ScanClient`] builds endpoint paths, uploads zipped batches, reads scan status and pages
//! through detections. HTTP goes through the [`HttpTransport`] seam so everything above the
//! wire can be exercised without a server.

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ScanError;
use crate::scan::ScanType;

pub mod archive;
pub mod models;
pub mod paths;
pub mod transport;

use archive::InMemoryZip;
use models::{
    DetectionRule, ScanDetailsResponse, ScanInitializationResponse, ScanReportUrlResponse,
    ScanResult, ScanResultsSyncFlow, SupportedModulesPreferences, ZippedFileScanResult,
};
pub use paths::ServicePaths;
pub use transport::{HttpTransport, ReqwestTransport, UploadForm};

/// Page size used when listing detections
pub const DETECTIONS_PAGE_SIZE: usize = 200;

pub struct ScanClient {
    transport: Box<dyn HttpTransport>,
    paths: ServicePaths,
    sync_scan_timeout: Duration,
    ai_remediation_timeout: Duration,
}

impl ScanClient {
    pub fn new(transport: Box<dyn HttpTransport>) -> Self {
        Self {
            transport,
            paths: ServicePaths,
            sync_scan_timeout: Duration::from_secs(180),
            ai_remediation_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_sync_scan_timeout(mut self, timeout: Duration) -> Self {
        self.sync_scan_timeout = timeout;
        self
    }

    pub fn with_ai_remediation_timeout(mut self, timeout: Duration) -> Self {
        self.ai_remediation_timeout = timeout;
        self
    }

    pub fn paths(&self) -> &ServicePaths {
        &self.paths
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ScanError> {
        serde_json::from_str(body).map_err(|source| ScanError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<T, ScanError> {
        let body = self.transport.get(path, query)?;
        Self::decode(path, &body)
    }

    fn upload<T: DeserializeOwned>(&self, path: &str, form: UploadForm) -> Result<T, ScanError> {
        let body = self.transport.post_multipart(path, form)?;
        Self::decode(path, &body)
    }

    fn zip_form(zip: &InMemoryZip) -> UploadForm {
        UploadForm::default().file("file", InMemoryZip::UPLOAD_FILE_NAME, zip.to_vec())
    }

    /// Scan a single file's content in one request
    pub fn content_scan(
        &self,
        scan_type: ScanType,
        file_name: &str,
        content: &str,
        is_git_diff: bool,
    ) -> Result<ScanResult, ScanError> {
        let path = self.paths.content_scan_path(scan_type);
        let body = serde_json::json!({
            "name": file_name,
            "content": content,
            "is_git_diff": is_git_diff,
        });
        let response = self.transport.post_json(&path, &body)?;
        Self::decode(&path, &response)
    }

    pub fn zipped_file_scan(
        &self,
        scan_type: ScanType,
        zip: &InMemoryZip,
        scan_id: &str,
        scan_parameters: &serde_json::Value,
        is_git_diff: bool,
    ) -> Result<ZippedFileScanResult, ScanError> {
        let form = Self::zip_form(zip)
            .field("scan_id", scan_id)
            .field("is_git_diff", is_git_diff)
            .field("scan_parameters", scan_parameters);
        self.upload(&self.paths.zipped_file_scan_path(scan_type), form)
    }

    pub fn zipped_file_scan_async(
        &self,
        zip: &InMemoryZip,
        scan_type: ScanType,
        scan_parameters: serde_json::Value,
        is_git_diff: bool,
        is_commit_range: bool,
    ) -> Result<ScanInitializationResponse, ScanError> {
        let form = Self::zip_form(zip)
            .field("is_git_diff", is_git_diff)
            .field("scan_parameters", scan_parameters)
            .field("is_commit_range", is_commit_range);
        self.upload(&self.paths.zipped_file_scan_async_path(scan_type, false), form)
    }

    /// Upload and wait for detections in the same request.
    ///
    /// The service rejects a `report` key in the sync flow, so it is stripped.
    pub fn zipped_file_scan_sync(
        &self,
        zip: &InMemoryZip,
        scan_type: ScanType,
        mut scan_parameters: serde_json::Value,
        is_git_diff: bool,
    ) -> Result<ScanResultsSyncFlow, ScanError> {
        if let Some(parameters) = scan_parameters.as_object_mut() {
            parameters.remove("report");
        }

        let form = Self::zip_form(zip)
            .field("is_git_diff", is_git_diff)
            .field("scan_parameters", scan_parameters)
            .timeout(self.sync_scan_timeout);
        self.upload(&self.paths.zipped_file_scan_sync_path(scan_type), form)
    }

    /// Commit-range scan of two snapshots
    pub fn multiple_zipped_file_scan_async(
        &self,
        from_commit_zip: &InMemoryZip,
        to_commit_zip: &InMemoryZip,
        scan_type: ScanType,
        scan_parameters: &serde_json::Value,
        is_git_diff: bool,
    ) -> Result<ScanInitializationResponse, ScanError> {
        let form = UploadForm::default()
            .file("file_from_commit", InMemoryZip::UPLOAD_FILE_NAME, from_commit_zip.to_vec())
            .file("file_to_commit", InMemoryZip::UPLOAD_FILE_NAME, to_commit_zip.to_vec())
            .field("is_git_diff", is_git_diff)
            .field("scan_parameters", scan_parameters);
        self.upload(&self.paths.commit_range_scan_async_path(scan_type), form)
    }

    pub fn commit_range_zipped_file_scan(
        &self,
        scan_type: ScanType,
        zip: &InMemoryZip,
        scan_id: &str,
    ) -> Result<ZippedFileScanResult, ScanError> {
        let form = Self::zip_form(zip).field("scan_id", scan_id);
        self.upload(&self.paths.commit_range_zipped_file_scan_path(scan_type), form)
    }

    pub fn scan_details(&self, scan_type: ScanType, scan_id: &str) -> Result<ScanDetailsResponse, ScanError> {
        self.get_json(&self.paths.scan_details_path(scan_type, scan_id), &[])
    }

    pub fn scan_report_url(&self, scan_id: &str, scan_type: ScanType) -> Result<ScanReportUrlResponse, ScanError> {
        self.get_json(&self.paths.scan_report_url_path(scan_id, scan_type), &[])
    }

    pub fn scan_aggregation_report_url(
        &self,
        aggregation_id: &str,
        scan_type: ScanType,
    ) -> Result<ScanReportUrlResponse, ScanError> {
        self.get_json(
            &self.paths.scan_aggregation_report_url_path(aggregation_id, scan_type),
            &[],
        )
    }

    pub fn detection_rules<I, S>(&self, detection_rule_ids: I) -> Result<Vec<DetectionRule>, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let query: Vec<(String, String)> = detection_rule_ids
            .into_iter()
            .map(|id| ("ids".to_string(), id.into()))
            .collect();
        self.get_json(&self.paths.detection_rules_path(), &query)
    }

    pub fn supported_modules_preferences(&self) -> Result<SupportedModulesPreferences, ScanError> {
        self.get_json(self.paths.supported_modules_path(), &[])
    }

    /// Remediation guidance for one detection, as plain text.
    ///
    /// With `fix` the service replies with the proposed fix itself instead of remediation details.
    pub fn ai_remediation(&self, detection_id: &str, fix: bool) -> Result<String, ScanError> {
        let path = self.paths.ai_remediation_path(detection_id);

        let mut resolving_parameters = serde_json::json!({
            "get_diff": true,
            "use_code_snippet": true,
            "add_diff_header": true,
        });
        if !fix {
            resolving_parameters["remediation_action"] =
                serde_json::Value::from("ReplyWithRemediationDetails");
        }
        let body = serde_json::json!({ "resolving_parameters": resolving_parameters });

        let response = self
            .transport
            .get_with_body(&path, &body, Some(self.ai_remediation_timeout))?;
        Ok(response.trim().to_string())
    }

    /// All raw detections of a scan, fetched page by page until a short page arrives
    pub fn scan_raw_detections(
        &self,
        scan_type: ScanType,
        scan_id: &str,
    ) -> Result<Vec<serde_json::Value>, ScanError> {
        let path = self.paths.scan_detections_list_path(scan_type);
        let mut raw_detections = Vec::new();

        let mut page_number = 0;
        loop {
            let query = vec![
                ("scan_id".to_string(), scan_id.to_string()),
                ("page_size".to_string(), DETECTIONS_PAGE_SIZE.to_string()),
                ("page_number".to_string(), page_number.to_string()),
            ];
            let page: Vec<serde_json::Value> = self.get_json(&path, &query)?;
            let page_len = page.len();
            raw_detections.extend(page);

            tracing::trace!("Detections page {} of scan {}: {} items", page_number, scan_id, page_len);
            if page_len < DETECTIONS_PAGE_SIZE {
                break;
            }
            page_number += 1;
        }

        Ok(raw_detections)
    }

    pub fn report_scan_status(
        &self,
        scan_type: ScanType,
        scan_id: &str,
        scan_status: &serde_json::Value,
        use_scan_service: bool,
    ) -> Result<(), ScanError> {
        let path = self
            .paths
            .report_scan_status_path(scan_type, scan_id, use_scan_service);
        self.transport.post_json(&path, scan_status)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A recorded request: (method, path, query or form fields)
    pub type Recorded = (String, String, Vec<(String, String)>);

    /// Transport answering from a queue of canned bodies and recording every request
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, ScanError>>>,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl ScriptedTransport {
        pub fn new<I: IntoIterator<Item = Result<String, ScanError>>>(responses: I) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn next(&self, method: &str, path: &str, params: Vec<(String, String)>) -> Result<String, ScanError> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), path.to_string(), params));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted response left for {method} {path}"))
        }
    }

    impl HttpTransport for std::sync::Arc<ScriptedTransport> {
        fn get(&self, path: &str, query: &[(String, String)]) -> Result<String, ScanError> {
            self.next("GET", path, query.to_vec())
        }

        fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String, ScanError> {
            self.next("POST", path, vec![("body".to_string(), body.to_string())])
        }

        fn get_with_body(
            &self,
            path: &str,
            body: &serde_json::Value,
            timeout: Option<std::time::Duration>,
        ) -> Result<String, ScanError> {
            let mut params = vec![("body".to_string(), body.to_string())];
            if let Some(timeout) = timeout {
                params.push(("timeout".to_string(), timeout.as_secs().to_string()));
            }
            self.next("GET", path, params)
        }

        fn post_multipart(&self, path: &str, form: UploadForm) -> Result<String, ScanError> {
            let mut fields = form.fields;
            fields.extend(
                form.files
                    .into_iter()
                    .map(|file| (format!("file:{}", file.field), file.file_name)),
            );
            self.next("UPLOAD", path, fields)
        }
    }
}
