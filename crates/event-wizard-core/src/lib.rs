//!
//! Event Wizard Core - step/validation/submission engine
//!
//! This crate holds everything with real logic in the event creation wizard:
//! the immutable step registry, the per-step validation engine, the wizard
//! state machine and the terminal submission pipeline (presign, upload,
//! create). Rendering is left to a [`PresentationShell`] implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error types
pub mod error;

/// Form values and file assets
pub mod values;

/// Field rules
pub mod schema;

/// Step definitions and the step registry
pub mod steps;

/// Validation engine scoped to a single step
pub mod validation;

/// Terminal submission pipeline
pub mod submission;

/// Wizard state machine and presentation contract
pub mod wizard;

// Re-export key types
pub use error::{SubmissionError, SubmissionPhase, SubmissionResult, WizardError, WizardResult};
pub use schema::{FieldRule, FieldSchema, ViolationKind, ALLOWED_IMAGE_TYPES};
pub use steps::{
    event_steps, fields, FieldWidget, RenderContract, StepDefinition, StepLayout, StepRegistry,
    WidgetKind,
};
pub use submission::{
    derive_asset_url, EventApi, GeoLocation, SubmissionDefaults, SubmissionPipeline,
    SubmissionReceipt, SubmissionRecord, UploadMethod, UploadTarget,
};
pub use validation::{FieldError, FieldErrors, StepValidator, ValidatedValues, ValidationEngine};
pub use values::{FieldValue, FileAsset, FormValues};
pub use wizard::{
    AdvanceOutcome, Direction, PresentationShell, ShellAction, Wizard, WizardState, WizardView,
};

pub use tokio_util::sync::CancellationToken;
