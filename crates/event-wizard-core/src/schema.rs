//! Field rules.
//!
//! A [`FieldRule`] is a tagged description of what a single field accepts.
//! Rules are plain data so the step table can live in a static; checking a
//! rule is a pure function of the candidate value.

use crate::values::FieldValue;

/// Media types accepted for image fields
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Required value absent or empty
    Required,
    /// Value present but malformed
    Format,
    /// Value could not be parsed as a number
    NotANumber,
    /// Number below the rule's minimum
    BelowMinimum,
    /// Value is not a binary file
    NotAFile,
    /// File media type not in the allowed set
    UnsupportedMediaType,
    /// Custom predicate returned false
    Predicate,
}

impl ViolationKind {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::Required => "ERR_FIELD_REQUIRED",
            ViolationKind::Format => "ERR_FIELD_FORMAT",
            ViolationKind::NotANumber => "ERR_FIELD_NOT_A_NUMBER",
            ViolationKind::BelowMinimum => "ERR_FIELD_BELOW_MINIMUM",
            ViolationKind::NotAFile => "ERR_FIELD_NOT_A_FILE",
            ViolationKind::UnsupportedMediaType => "ERR_FIELD_UNSUPPORTED_MEDIA_TYPE",
            ViolationKind::Predicate => "ERR_FIELD_PREDICATE",
        }
    }
}

/// A rejected value: the kind of failure plus the message to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    /// Failure kind
    pub kind: ViolationKind,
    /// User-facing message
    pub message: &'static str,
}

impl RuleViolation {
    fn new(kind: ViolationKind, message: &'static str) -> Self {
        Self { kind, message }
    }
}

/// Validation rule for one field
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Non-empty text
    RequiredText {
        /// Message when absent or empty
        message: &'static str,
    },

    /// Text that may be left empty; empty values are dropped
    OptionalText,

    /// Exactly five ASCII digits
    PostalCode {
        /// Message when absent, empty or malformed
        message: &'static str,
    },

    /// Decimal number accepting `.` or `,` as separator
    Decimal {
        /// Inclusive minimum
        min: f64,
        /// Message when the value is not a number
        type_message: &'static str,
        /// Message when the value is below `min`
        min_message: &'static str,
    },

    /// Binary file with a restricted media type
    Image {
        /// Message when absent
        required_message: &'static str,
        /// Message when the value is not a file
        invalid_message: &'static str,
        /// Message when the media type is not allowed
        type_message: &'static str,
        /// Allowed media types
        allowed_types: &'static [&'static str],
    },

    /// Arbitrary predicate over the raw value
    Custom {
        /// Whether an absent value is rejected
        required: bool,
        /// Message when required and absent
        required_message: &'static str,
        /// Acceptance predicate
        predicate: fn(&FieldValue) -> bool,
        /// Message when the predicate fails
        message: &'static str,
    },
}

impl FieldRule {
    /// Image rule with the default allowed media types
    pub fn image(
        required_message: &'static str,
        invalid_message: &'static str,
        type_message: &'static str,
    ) -> Self {
        FieldRule::Image {
            required_message,
            invalid_message,
            type_message,
            allowed_types: ALLOWED_IMAGE_TYPES,
        }
    }

    /// Whether an absent value fails this rule
    pub fn is_required(&self) -> bool {
        match self {
            FieldRule::OptionalText => false,
            FieldRule::Custom { required, .. } => *required,
            _ => true,
        }
    }

    /// Whether the rule expects a file
    pub fn expects_file(&self) -> bool {
        matches!(self, FieldRule::Image { .. })
    }

    /// Check a candidate value.
    ///
    /// Returns the normalized value to keep (`None` when an optional field
    /// is left empty) or the first violation.
    pub fn check(&self, value: Option<&FieldValue>) -> Result<Option<FieldValue>, RuleViolation> {
        // Blank text behaves like an absent value for every rule
        let value = value.filter(|v| !v.is_blank());

        match self {
            FieldRule::RequiredText { message } => match value {
                Some(FieldValue::Text(text)) => Ok(Some(FieldValue::Text(text.clone()))),
                Some(FieldValue::Number(number)) => Ok(Some(FieldValue::Text(number.to_string()))),
                _ => Err(RuleViolation::new(ViolationKind::Required, message)),
            },

            FieldRule::OptionalText => match value {
                Some(FieldValue::Text(text)) => Ok(Some(FieldValue::Text(text.clone()))),
                Some(FieldValue::Number(number)) => Ok(Some(FieldValue::Text(number.to_string()))),
                _ => Ok(None),
            },

            FieldRule::PostalCode { message } => match value {
                None => Err(RuleViolation::new(ViolationKind::Required, message)),
                Some(FieldValue::Text(text)) if is_postal_code(text) => {
                    Ok(Some(FieldValue::Text(text.clone())))
                }
                Some(_) => Err(RuleViolation::new(ViolationKind::Format, message)),
            },

            FieldRule::Decimal {
                min,
                type_message,
                min_message,
            } => {
                let number = match value {
                    Some(FieldValue::Number(number)) => Some(*number),
                    Some(FieldValue::Text(text)) => parse_decimal(text),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| RuleViolation::new(ViolationKind::NotANumber, type_message))?;

                if number < *min {
                    return Err(RuleViolation::new(ViolationKind::BelowMinimum, min_message));
                }
                Ok(Some(FieldValue::Number(number)))
            }

            FieldRule::Image {
                required_message,
                invalid_message,
                type_message,
                allowed_types,
            } => match value {
                None => Err(RuleViolation::new(ViolationKind::Required, required_message)),
                Some(FieldValue::File(file)) => {
                    if allowed_types.contains(&file.media_type()) {
                        Ok(Some(FieldValue::File(file.clone())))
                    } else {
                        Err(RuleViolation::new(
                            ViolationKind::UnsupportedMediaType,
                            type_message,
                        ))
                    }
                }
                Some(_) => Err(RuleViolation::new(ViolationKind::NotAFile, invalid_message)),
            },

            FieldRule::Custom {
                required,
                required_message,
                predicate,
                message,
            } => match value {
                None if *required => Err(RuleViolation::new(ViolationKind::Required, required_message)),
                None => Ok(None),
                Some(v) if predicate(v) => Ok(Some(v.clone())),
                Some(_) => Err(RuleViolation::new(ViolationKind::Predicate, message)),
            },
        }
    }
}

/// A named field and its rule
#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Field name, unique across the whole registry
    pub name: &'static str,
    /// Rule applied to the field
    pub rule: FieldRule,
}

impl FieldSchema {
    /// Create a new field schema
    pub fn new(name: &'static str, rule: FieldRule) -> Self {
        Self { name, rule }
    }
}

fn is_postal_code(text: &str) -> bool {
    text.len() == 5 && text.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a decimal typed with either `.` or `,` as separator
pub(crate) fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().replacen(',', ".", 1).parse::<f64>().ok()
}
