use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, multipart};

use crate::config::ApiConfig;
use crate::error::ScanError;

/// A file part of a multipart upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Multipart form body
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadFile>,
    /// Overrides the transport's default timeout for this request
    pub timeout: Option<Duration>,
}

impl UploadForm {
    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    pub fn file(mut self, field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.push(UploadFile {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Blocking HTTP seam. Paths are relative to the service base url; implementations return the
/// response body of a 2xx response and map anything else to a [`ScanError`].
pub trait HttpTransport: Send + Sync {
    fn get(&self, path: &str, query: &[(String, String)]) -> Result<String, ScanError>;

    fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String, ScanError>;

    /// GET carrying a JSON body, with an optional per-request timeout
    fn get_with_body(
        &self,
        path: &str,
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<String, ScanError>;

    fn post_multipart(&self, path: &str, form: UploadForm) -> Result<String, ScanError>;
}

/// reqwest-backed transport with bearer authentication
pub struct ReqwestTransport {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ScanError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ScanError::Transport {
                path: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(&self, path: &str, request: RequestBuilder) -> Result<String, ScanError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        tracing::debug!("Sending request to {}", path);
        let response = request.send().map_err(|source| ScanError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().map_err(|source| ScanError::Transport {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(ScanError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        tracing::trace!("Response from {}: {} ({} bytes)", path, status, body.len());
        Ok(body)
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, path: &str, query: &[(String, String)]) -> Result<String, ScanError> {
        self.send(path, self.http.get(self.url(path)).query(query))
    }

    fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String, ScanError> {
        let request = self
            .http
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(path, request)
    }

    fn get_with_body(
        &self,
        path: &str,
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<String, ScanError> {
        let mut request = self
            .http
            .get(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        self.send(path, request)
    }

    fn post_multipart(&self, path: &str, form: UploadForm) -> Result<String, ScanError> {
        let mut multipart_form = multipart::Form::new();
        for (name, value) in form.fields {
            multipart_form = multipart_form.text(name, value);
        }
        for file in form.files {
            let part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
            multipart_form = multipart_form.part(file.field, part);
        }

        let mut request = self.http.post(self.url(path)).multipart(multipart_form);
        if let Some(timeout) = form.timeout {
            request = request.timeout(timeout);
        }
        self.send(path, request)
    }
}
