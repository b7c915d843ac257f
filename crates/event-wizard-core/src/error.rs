use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::validation::FieldErrors;

/// The phase of a submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionPhase {
    /// Requesting a signed upload target
    Presign,
    /// Transferring the asset bytes
    Upload,
    /// Submitting the composed record
    Create,
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionPhase::Presign => "presign",
            SubmissionPhase::Upload => "upload",
            SubmissionPhase::Create => "create",
        };
        write!(f, "{}", name)
    }
}

/// Errors raised by a single submission attempt.
///
/// Every variant maps to exactly one [`SubmissionPhase`] so callers can tell
/// where the attempt stopped. None of them is fatal to the wizard: the user
/// retries the terminal step as a whole.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The presign endpoint refused the request or answered without a usable URL
    #[error("Presign request failed: {0}")]
    Presign(String),

    /// The storage endpoint did not report success for the asset transfer
    #[error("Upload failed with status {status}: {message}")]
    Upload {
        /// HTTP status returned by the upload target
        status: u16,
        /// Response text, if any
        message: String,
    },

    /// The create endpoint did not report success
    #[error("Create request failed with status {status}: {body}")]
    Create {
        /// HTTP status returned by the create endpoint
        status: u16,
        /// Error payload returned by the endpoint, kept for diagnostics
        body: serde_json::Value,
    },

    /// Network-level failure, distinct from a non-OK response
    #[error("Transport error during {phase}: {message}")]
    Transport {
        /// Phase during which the transport failed
        phase: SubmissionPhase,
        /// Underlying error message
        message: String,
    },

    /// The attempt was cancelled at a phase boundary
    #[error("Submission cancelled before {phase}")]
    Cancelled {
        /// Phase that was about to start
        phase: SubmissionPhase,
    },

    /// The form values carry no file asset to upload
    #[error("No file asset found in field '{0}'")]
    MissingAsset(String),

    /// Record could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SubmissionError {
    /// The phase this error belongs to
    pub fn phase(&self) -> SubmissionPhase {
        match self {
            SubmissionError::Presign(_) | SubmissionError::MissingAsset(_) => {
                SubmissionPhase::Presign
            }
            SubmissionError::Upload { .. } => SubmissionPhase::Upload,
            SubmissionError::Create { .. } | SubmissionError::Serialization(_) => {
                SubmissionPhase::Create
            }
            SubmissionError::Transport { phase, .. } | SubmissionError::Cancelled { phase } => {
                *phase
            }
        }
    }

    /// Build a transport error for the given phase
    pub fn transport(phase: SubmissionPhase, err: impl fmt::Display) -> Self {
        SubmissionError::Transport {
            phase,
            message: err.to_string(),
        }
    }
}

/// Result type for submission operations
pub type SubmissionResult<T> = Result<T, SubmissionError>;

/// Errors surfaced by the wizard to its caller
#[derive(Error, Debug)]
pub enum WizardError {
    /// The step table violates a registry invariant
    #[error("Invalid step registry: {0}")]
    InvalidRegistry(String),

    /// A step index outside the registry was requested
    #[error("Step {index} does not exist (wizard has {count} steps)")]
    UnknownStep {
        /// Requested index
        index: usize,
        /// Number of steps in the registry
        count: usize,
    },

    /// The active step's candidate values were rejected
    #[error("{0}")]
    Validation(#[from] FieldErrors),

    /// The terminal submission failed
    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),
}

impl WizardError {
    /// Field errors, when this is a validation failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            WizardError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type for wizard operations
pub type WizardResult<T> = Result<T, WizardError>;
