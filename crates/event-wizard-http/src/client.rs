//! reqwest-backed EventApi

use async_trait::async_trait;
use event_wizard_core::{
    EventApi, FileAsset, SubmissionError, SubmissionPhase, SubmissionRecord, SubmissionResult,
    UploadMethod, UploadTarget,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Presign endpoint path
pub const DEFAULT_PRESIGN_PATH: &str = "/api/presign";

/// Event creation endpoint path
pub const DEFAULT_CREATE_PATH: &str = "/api/event/create/aws";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while building the client
#[derive(Error, Debug)]
pub enum HttpApiError {
    /// The base URL is not an absolute http(s) URL
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Body returned by the presign endpoint
#[derive(Debug, Deserialize)]
struct PresignResponse {
    url: String,
    #[serde(default)]
    method: Option<String>,
}

/// EventApi over HTTP
#[derive(Debug, Clone)]
pub struct HttpEventApi {
    /// Base URL of the event backend, without trailing slash
    api_base_url: String,

    /// Path of the presign endpoint
    presign_path: String,

    /// Path of the create endpoint
    create_path: String,

    /// HTTP client
    client: Client,
}

impl HttpEventApi {
    /// Client for the backend at `base_url` with the default timeout
    pub fn new(base_url: &str) -> Result<Self, HttpApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Client for the backend at `base_url`, giving up on any call after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, HttpApiError> {
        let parsed = Url::parse(base_url).map_err(|e| HttpApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            presign_path: DEFAULT_PRESIGN_PATH.to_string(),
            create_path: DEFAULT_CREATE_PATH.to_string(),
            client,
        })
    }

    /// Use another presign endpoint path
    pub fn with_presign_path(mut self, path: impl Into<String>) -> Self {
        self.presign_path = path.into();
        self
    }

    /// Use another create endpoint path
    pub fn with_create_path(mut self, path: impl Into<String>) -> Self {
        self.create_path = path.into();
        self
    }

    /// Base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }
}

/// Response body as JSON, or as a JSON string when it is not JSON
async fn body_value(response: Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl EventApi for HttpEventApi {
    async fn presign(&self, filename: &str, media_type: &str) -> SubmissionResult<UploadTarget> {
        let url = self.endpoint(&self.presign_path);
        debug!("Requesting upload URL for {} ({})", filename, media_type);

        let response = self
            .client
            .get(&url)
            .query(&[("file", filename), ("fileType", media_type)])
            .send()
            .await
            .map_err(|e| SubmissionError::transport(SubmissionPhase::Presign, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Presign request failed: {}", error_text);
            return Err(SubmissionError::Presign(format!(
                "presign endpoint returned status {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: PresignResponse = response
            .json()
            .await
            .map_err(|e| SubmissionError::Presign(format!("invalid presign response: {}", e)))?;

        UploadTarget::parse(&body.url, body.method.as_deref())
    }

    async fn upload(&self, target: &UploadTarget, asset: &FileAsset) -> SubmissionResult<()> {
        debug!(
            "Uploading {} bytes to {}",
            asset.len(),
            target.public_url()
        );

        let request = match target.method {
            UploadMethod::Put => self.client.put(target.url.clone()),
            UploadMethod::Post => self.client.post(target.url.clone()),
        };
        let response = request
            .header(CONTENT_TYPE, asset.media_type())
            .body(asset.bytes().to_vec())
            .send()
            .await
            .map_err(|e| SubmissionError::transport(SubmissionPhase::Upload, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Upload failed: Status {}, Error: {}", status, error_text);
            return Err(SubmissionError::Upload {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }

    async fn create(&self, record: &SubmissionRecord) -> SubmissionResult<Value> {
        let url = self.endpoint(&self.create_path);
        debug!("Creating event record at {}", url);

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| SubmissionError::transport(SubmissionPhase::Create, e))?;

        let status = response.status();
        let body = body_value(response).await;
        if !status.is_success() {
            error!("Create request failed: Status {}, Body: {}", status, body);
            return Err(SubmissionError::Create {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
