//! Terminal submission pipeline.
//!
//! Three strictly sequential phases: presign an upload target for the asset,
//! upload the bytes, then create the event record pointing at the uploaded
//! asset. The first failing phase aborts the attempt. A cancellation token is
//! checked before each phase.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use crate::error::{SubmissionError, SubmissionPhase, SubmissionResult};
use crate::values::{FileAsset, FormValues};

/// HTTP method used to transfer the asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMethod {
    /// `PUT` the raw bytes (S3-style presigned URL)
    #[default]
    Put,
    /// `POST` the raw bytes
    Post,
}

impl UploadMethod {
    /// Parse a method name; only PUT and POST are meaningful for uploads
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "PUT" => Some(UploadMethod::Put),
            "POST" => Some(UploadMethod::Post),
            _ => None,
        }
    }

    /// Method name
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMethod::Put => "PUT",
            UploadMethod::Post => "POST",
        }
    }
}

/// Where and how to upload the asset, as returned by the presign call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Signed upload URL
    pub url: Url,
    /// Transfer method
    pub method: UploadMethod,
}

impl UploadTarget {
    /// Target using the default method
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: UploadMethod::default(),
        }
    }

    /// Parse a presign answer: the URL must be absolute with a host, and the
    /// method, when given, must be PUT or POST.
    pub fn parse(url: &str, method: Option<&str>) -> SubmissionResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| SubmissionError::Presign(format!("invalid upload URL '{}': {}", url, e)))?;
        if !url.has_host() {
            return Err(SubmissionError::Presign(format!(
                "upload URL '{}' has no host",
                url
            )));
        }

        let method = match method {
            Some(m) => UploadMethod::parse(m).ok_or_else(|| {
                SubmissionError::Presign(format!("unsupported upload method '{}'", m))
            })?,
            None => UploadMethod::default(),
        };

        Ok(Self { url, method })
    }

    /// Durable public reference to the uploaded asset
    pub fn public_url(&self) -> String {
        derive_asset_url(&self.url)
    }
}

/// Origin and path of a signed URL, without query string or fragment
pub fn derive_asset_url(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}

/// Coordinates attached to the created event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude, as expected by the create endpoint
    pub latitude: String,
    /// Longitude, as expected by the create endpoint
    pub longitude: String,
}

impl Default for GeoLocation {
    fn default() -> Self {
        // Placeholder until the wizard collects real coordinates
        Self {
            latitude: "00000000.4444444".to_string(),
            longitude: "00000000.4444444".to_string(),
        }
    }
}

/// Fixed fields required by the create endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDefaults {
    /// Category identifier
    #[serde(default = "default_category_id")]
    pub category_id: u32,
    /// Location sent with every event
    #[serde(default)]
    pub location: GeoLocation,
}

fn default_category_id() -> u32 {
    1
}

impl Default for SubmissionDefaults {
    fn default() -> Self {
        Self {
            category_id: default_category_id(),
            location: GeoLocation::default(),
        }
    }
}

/// The event record sent to the create endpoint.
///
/// Built once per attempt from the accumulated form values; computed fields
/// override form fields of the same name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionRecord(Map<String, Value>);

impl SubmissionRecord {
    /// Compose the record
    pub fn compose(
        values: &FormValues,
        asset_field: &str,
        asset_url: &str,
        defaults: &SubmissionDefaults,
        owner_id: &str,
    ) -> Self {
        let mut record: Map<String, Value> = values
            .iter()
            .filter_map(|(field, value)| value.to_json().map(|json| (field.to_string(), json)))
            .collect();

        record.insert(asset_field.to_string(), Value::String(asset_url.to_string()));
        record.insert(
            "latitude".to_string(),
            Value::String(defaults.location.latitude.clone()),
        );
        record.insert(
            "longitude".to_string(),
            Value::String(defaults.location.longitude.clone()),
        );
        record.insert("categoryId".to_string(), Value::from(defaults.category_id));
        record.insert("userId".to_string(), Value::String(owner_id.to_string()));

        Self(record)
    }

    /// Field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the JSON object
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.0
    }

    /// JSON value of the record
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// Public URL of the uploaded asset
    pub asset_url: String,
    /// Record that was created
    pub record: SubmissionRecord,
    /// Body returned by the create endpoint (`Null` when empty)
    pub response: Value,
}

/// Remote calls needed by the pipeline
#[async_trait]
pub trait EventApi: Send + Sync + Debug {
    /// Request an upload target for a file
    async fn presign(&self, filename: &str, media_type: &str) -> SubmissionResult<UploadTarget>;

    /// Transfer the asset to the target
    async fn upload(&self, target: &UploadTarget, asset: &FileAsset) -> SubmissionResult<()>;

    /// Create the event record
    async fn create(&self, record: &SubmissionRecord) -> SubmissionResult<Value>;
}

/// Orchestrates presign, upload and create
#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    api: Arc<dyn EventApi>,
    asset_field: String,
    defaults: SubmissionDefaults,
}

impl SubmissionPipeline {
    /// Create a pipeline uploading the file found in `asset_field`
    pub fn new(api: Arc<dyn EventApi>, asset_field: impl Into<String>) -> Self {
        Self {
            api,
            asset_field: asset_field.into(),
            defaults: SubmissionDefaults::default(),
        }
    }

    /// Override the fixed record fields
    pub fn with_defaults(mut self, defaults: SubmissionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Fixed record fields in use
    pub fn defaults(&self) -> &SubmissionDefaults {
        &self.defaults
    }

    /// Run one submission attempt
    pub async fn submit(
        &self,
        values: &FormValues,
        owner_id: &str,
        cancel: &CancellationToken,
    ) -> SubmissionResult<SubmissionReceipt> {
        let asset = values
            .get(&self.asset_field)
            .and_then(|v| v.as_file())
            .ok_or_else(|| SubmissionError::MissingAsset(self.asset_field.clone()))?;

        checkpoint(cancel, SubmissionPhase::Presign)?;
        debug!(
            filename = asset.name(),
            media_type = asset.media_type(),
            "Requesting upload target"
        );
        let target = self
            .api
            .presign(asset.name(), asset.media_type())
            .await
            .map_err(|e| log_failure(SubmissionPhase::Presign, e))?;

        checkpoint(cancel, SubmissionPhase::Upload)?;
        debug!(method = target.method.as_str(), bytes = asset.len(), "Uploading asset");
        self.api
            .upload(&target, asset)
            .await
            .map_err(|e| log_failure(SubmissionPhase::Upload, e))?;

        checkpoint(cancel, SubmissionPhase::Create)?;
        let asset_url = target.public_url();
        let record = SubmissionRecord::compose(
            values,
            &self.asset_field,
            &asset_url,
            &self.defaults,
            owner_id,
        );
        debug!(asset_url = %asset_url, "Creating event record");
        let response = self
            .api
            .create(&record)
            .await
            .map_err(|e| log_failure(SubmissionPhase::Create, e))?;

        info!(asset_url = %asset_url, "Event created");
        Ok(SubmissionReceipt {
            asset_url,
            record,
            response,
        })
    }
}

fn checkpoint(cancel: &CancellationToken, phase: SubmissionPhase) -> SubmissionResult<()> {
    if cancel.is_cancelled() {
        info!(%phase, "Submission cancelled");
        return Err(SubmissionError::Cancelled { phase });
    }
    Ok(())
}

fn log_failure(phase: SubmissionPhase, err: SubmissionError) -> SubmissionError {
    error!(%phase, error = %err, "Submission phase failed");
    err
}
