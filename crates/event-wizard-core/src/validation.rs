//! Validation engine.
//!
//! Only the active step is ever validated: a user must not be blocked by
//! fields that are not on screen yet. The engine compiles the step's schema
//! into a [`StepValidator`] and runs it against the candidate values.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::error::WizardResult;
use crate::schema::{FieldSchema, ViolationKind};
use crate::steps::StepRegistry;
use crate::values::{FieldValue, FormValues};

/// A rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Failure kind
    pub kind: ViolationKind,
    /// User-facing message
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind.code(), self.message, self.field)
    }
}

/// All rejected fields of one step, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// No errors
    pub fn new() -> Self {
        Self::default()
    }

    /// Error for a given field
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Message for a given field
    pub fn message(&self, field: &str) -> Option<&str> {
        self.get(field).map(|e| e.message.as_str())
    }

    /// Whether the field was rejected
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Iterate over errors
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Number of rejected fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was rejected
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "No validation errors"),
            [single] => write!(f, "Validation error: {}", single),
            errors => {
                write!(f, "Multiple validation errors ({} issues):", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    write!(f, "\n  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for FieldErrors {}

/// Values accepted by a step validator, normalized.
///
/// Only the validator can build one, so the state machine never merges
/// unchecked input. Optional fields submitted blank are listed as cleared;
/// fields absent from the candidate are left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedValues {
    values: FormValues,
    cleared: Vec<String>,
}

impl ValidatedValues {
    /// Borrow the values
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Fields of the step that were submitted blank and must be forgotten
    pub fn cleared(&self) -> &[String] {
        &self.cleared
    }

    /// Take the values
    pub fn into_inner(self) -> FormValues {
        self.values
    }

    /// Write the step's outcome into accumulated values: cleared fields are
    /// removed, accepted ones inserted or overwritten.
    pub fn apply_to(self, target: &mut FormValues) {
        for field in &self.cleared {
            target.remove(field);
        }
        target.merge(self.values);
    }
}

/// The compiled contract of one step
#[derive(Debug, Clone, Copy)]
pub struct StepValidator<'a> {
    step_index: usize,
    fields: &'a [FieldSchema],
}

impl<'a> StepValidator<'a> {
    /// Index of the step this validator checks
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Check the candidate. Fields of other steps are ignored and never
    /// appear in the output.
    pub fn validate(&self, candidate: &FormValues) -> Result<ValidatedValues, FieldErrors> {
        let mut accepted: Vec<(String, FieldValue)> = Vec::with_capacity(self.fields.len());
        let mut cleared = Vec::new();
        let mut errors = FieldErrors::new();

        for schema in self.fields {
            match schema.rule.check(candidate.get(schema.name)) {
                Ok(Some(value)) => accepted.push((schema.name.to_string(), value)),
                Ok(None) if candidate.contains(schema.name) => {
                    cleared.push(schema.name.to_string())
                }
                Ok(None) => {}
                Err(violation) => errors.push(FieldError {
                    field: schema.name.to_string(),
                    kind: violation.kind,
                    message: violation.message.to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(ValidatedValues {
                values: accepted.into_iter().collect(),
                cleared,
            })
        } else {
            Err(errors)
        }
    }
}

/// Validation engine over a step registry
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    registry: Arc<StepRegistry>,
}

impl ValidationEngine {
    /// Create an engine for the given registry
    pub fn new(registry: Arc<StepRegistry>) -> Self {
        Self { registry }
    }

    /// Compile the contract of the step at `step_index`
    pub fn compile(&self, step_index: usize) -> WizardResult<StepValidator<'_>> {
        let step = self.registry.get(step_index)?;
        Ok(StepValidator {
            step_index,
            fields: &step.fields,
        })
    }

    /// Validate `candidate` against the step at `step_index`
    pub fn validate(&self, step_index: usize, candidate: &FormValues) -> WizardResult<ValidatedValues> {
        let validator = self.compile(step_index)?;
        Ok(validator.validate(candidate)?)
    }
}
