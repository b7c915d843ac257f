//! Recording implementation of the EventApi trait.

use async_trait::async_trait;
use event_wizard_core::{
    EventApi, FileAsset, SubmissionError, SubmissionPhase, SubmissionRecord, SubmissionResult,
    UploadTarget,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::data_generators::UPLOAD_URL;

/// One recorded upload
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    /// Target the bytes were sent to
    pub target: UploadTarget,
    /// File name
    pub filename: String,
    /// Declared media type
    pub media_type: String,
    /// Number of bytes sent
    pub len: usize,
}

#[derive(Debug, Default)]
struct CallLog {
    presigns: Vec<(String, String)>,
    uploads: Vec<RecordedUpload>,
    creates: Vec<SubmissionRecord>,
}

/// Holds presign calls until released
#[derive(Debug, Clone)]
pub struct ApiGate(Arc<Semaphore>);

impl ApiGate {
    /// Let blocked (and future) presign calls through
    pub fn release(&self) {
        self.0.add_permits(1024);
    }
}

/// EventApi fake that records every call and can fail at a chosen phase
#[derive(Debug)]
pub struct RecordingEventApi {
    upload_url: String,
    upload_method: Option<String>,
    fail_at: Mutex<Option<SubmissionPhase>>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<CallLog>,
}

impl Default for RecordingEventApi {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEventApi {
    /// Fake answering every call successfully
    pub fn new() -> Self {
        Self {
            upload_url: UPLOAD_URL.to_string(),
            upload_method: None,
            fail_at: Mutex::new(None),
            gate: None,
            calls: Mutex::new(CallLog::default()),
        }
    }

    /// Answer presign calls with this upload URL
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    /// Answer presign calls with this upload method
    pub fn with_upload_method(mut self, method: impl Into<String>) -> Self {
        self.upload_method = Some(method.into());
        self
    }

    /// Fail every call of the given phase
    pub fn failing_at(self, phase: SubmissionPhase) -> Self {
        *self.fail_at.lock() = Some(phase);
        self
    }

    /// Block presign calls until the returned gate is released
    pub fn gated(mut self) -> (Self, ApiGate) {
        let semaphore = Arc::new(Semaphore::new(0));
        self.gate = Some(semaphore.clone());
        (self, ApiGate(semaphore))
    }

    /// Change the failing phase between attempts
    pub fn set_failure(&self, phase: Option<SubmissionPhase>) {
        *self.fail_at.lock() = phase;
    }

    /// Number of presign calls
    pub fn presign_calls(&self) -> usize {
        self.calls.lock().presigns.len()
    }

    /// Number of upload calls
    pub fn upload_calls(&self) -> usize {
        self.calls.lock().uploads.len()
    }

    /// Number of create calls
    pub fn create_calls(&self) -> usize {
        self.calls.lock().creates.len()
    }

    /// `(filename, media type)` of every presign call
    pub fn presign_requests(&self) -> Vec<(String, String)> {
        self.calls.lock().presigns.clone()
    }

    /// Every upload
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.calls.lock().uploads.clone()
    }

    /// Every record sent to create
    pub fn created_records(&self) -> Vec<SubmissionRecord> {
        self.calls.lock().creates.clone()
    }

    fn fails_at(&self, phase: SubmissionPhase) -> bool {
        *self.fail_at.lock() == Some(phase)
    }
}

#[async_trait]
impl EventApi for RecordingEventApi {
    async fn presign(&self, filename: &str, media_type: &str) -> SubmissionResult<UploadTarget> {
        self.calls
            .lock()
            .presigns
            .push((filename.to_string(), media_type.to_string()));

        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| SubmissionError::transport(SubmissionPhase::Presign, e))?;
        }

        if self.fails_at(SubmissionPhase::Presign) {
            return Err(SubmissionError::Presign(
                "presign endpoint returned status 500".to_string(),
            ));
        }
        UploadTarget::parse(&self.upload_url, self.upload_method.as_deref())
    }

    async fn upload(&self, target: &UploadTarget, asset: &FileAsset) -> SubmissionResult<()> {
        self.calls.lock().uploads.push(RecordedUpload {
            target: target.clone(),
            filename: asset.name().to_string(),
            media_type: asset.media_type().to_string(),
            len: asset.len(),
        });

        if self.fails_at(SubmissionPhase::Upload) {
            return Err(SubmissionError::Upload {
                status: 403,
                message: "SignatureDoesNotMatch".to_string(),
            });
        }
        Ok(())
    }

    async fn create(&self, record: &SubmissionRecord) -> SubmissionResult<Value> {
        let id = {
            let mut calls = self.calls.lock();
            calls.creates.push(record.clone());
            calls.creates.len()
        };

        if self.fails_at(SubmissionPhase::Create) {
            return Err(SubmissionError::Create {
                status: 422,
                body: json!({"error": "invalid event"}),
            });
        }
        Ok(json!({"id": id}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_generators::png_asset;

    #[tokio::test]
    async fn test_records_calls() {
        let api = RecordingEventApi::new();
        let target = api.presign("poster.png", "image/png").await.unwrap();
        api.upload(&target, &png_asset()).await.unwrap();

        assert_eq!(api.presign_calls(), 1);
        assert_eq!(api.upload_calls(), 1);
        assert_eq!(api.create_calls(), 0);
        assert_eq!(
            api.presign_requests(),
            vec![("poster.png".to_string(), "image/png".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failing_phase() {
        let api = RecordingEventApi::new().failing_at(SubmissionPhase::Upload);
        let target = api.presign("poster.png", "image/png").await.unwrap();
        let err = api.upload(&target, &png_asset()).await.unwrap_err();
        assert_eq!(err.phase(), SubmissionPhase::Upload);

        api.set_failure(None);
        assert!(api.upload(&target, &png_asset()).await.is_ok());
    }
}
