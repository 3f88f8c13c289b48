//! Client for the remote format-generation service.

use crate::error::DelegateError;
use crate::protocol::{
    BatchExportRequest, BatchResponse, BimExportRequest, CadExportRequest, DelegateResponse,
    ProgressStatus,
};
use crate::FormatService;
use serde::de::DeserializeOwned;
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `BIMDRAFT_EXPORT_URL` and `BIMDRAFT_EXPORT_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("BIMDRAFT_EXPORT_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout_secs = std::env::var("BIMDRAFT_EXPORT_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            timeout: Duration::from_secs(timeout_secs),
            ..Self::new(&base_url)
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

pub struct HttpFormatService {
    config: ServiceConfig,
    http: reqwest::Client,
}

impl HttpFormatService {
    pub fn new(config: ServiceConfig) -> Result<Self, DelegateError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DelegateError::Transport(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// `{base}/api/export/<segments>`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, DelegateError> {
        let base = &self.config.base_url;
        let mut url = Url::parse(base)
            .map_err(|e| DelegateError::Transport(format!("invalid service url {base:?}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| {
                DelegateError::Transport(format!("service url cannot carry a path: {base}"))
            })?
            .pop_if_empty()
            .extend(["api", "export"])
            .extend(segments);
        Ok(url)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, DelegateError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(&[path])?;
        tracing::debug!(%url, "posting export request");
        let resp = self.http.post(url).json(body).send().await?;
        read_json(resp).await
    }
}

async fn read_json<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, DelegateError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(DelegateError::Status {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| status.to_string()),
        });
    }
    resp.json()
        .await
        .map_err(|e| DelegateError::Decode(e.to_string()))
}

/// Pulls `error` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}

impl FormatService for HttpFormatService {
    async fn export_cad(
        &self,
        request: &CadExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        tracing::info!(objects = request.objects.len(), format = "dxf", "delegating export");
        self.post("dxf", request).await
    }

    async fn export_bim(
        &self,
        request: &BimExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        tracing::info!(objects = request.objects.len(), format = "ifc", "delegating export");
        self.post("ifc", request).await
    }

    async fn export_batch(
        &self,
        request: &BatchExportRequest,
    ) -> Result<BatchResponse, DelegateError> {
        tracing::info!(items = request.items.len(), "delegating batch export");
        self.post("batch", request).await
    }

    async fn progress(&self, job_id: &str) -> Result<ProgressStatus, DelegateError> {
        let url = self.url(&["progress", job_id])?;
        tracing::debug!(%url, "polling export progress");
        let resp = self.http.get(url).send().await?;
        read_json(resp).await
    }
}
