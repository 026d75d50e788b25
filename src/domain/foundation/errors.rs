//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' exceeds {max} characters (got {actual})")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a too long validation error.
    pub fn too_long(field: impl Into<String>, max: usize, actual: usize) -> Self {
        ValidationError::TooLong {
            field: field.into(),
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome kinds of a conversational turn that did not go as planned.
///
/// Only [`FlowError::StorageTransient`] escapes `process_message` as an
/// `Err`; the rest are recovered into response descriptors or logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Input matched no intent pattern.
    #[error("input did not match any intent")]
    UnrecognizedIntent,

    /// Intent recognized but no transition's conditions held.
    #[error("intent '{intent}' requires context that is not present")]
    RequiredContextMissing {
        intent: String,
        condition: Option<String>,
    },

    /// Stored state is not part of the business unit's transition table.
    #[error("conversation is in unknown state '{state}'")]
    UnknownState { state: String },

    /// Storage timed out or failed transiently; nothing was committed.
    #[error("storage temporarily unavailable: {0}")]
    StorageTransient(String),

    /// Business unit configuration is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Operator request addressed a business unit with no flow.
    #[error("business unit '{business_unit}' is not configured")]
    UnknownBusinessUnit { business_unit: String },
}

impl FlowError {
    /// Stable machine-readable code used in response descriptors.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::UnrecognizedIntent => "unrecognized_intent",
            FlowError::RequiredContextMissing { .. } => "required_context",
            FlowError::UnknownState { .. } => "unknown_state",
            FlowError::StorageTransient(_) => "storage_transient",
            FlowError::Configuration(_) => "configuration_error",
            FlowError::UnknownBusinessUnit { .. } => "unknown_business_unit",
        }
    }

    /// True when the caller may retry the same message.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::StorageTransient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("person_id");
        assert_eq!(format!("{}", err), "Field 'person_id' cannot be empty");
    }

    #[test]
    fn validation_error_too_long_displays_correctly() {
        let err = ValidationError::too_long("business_unit", 128, 200);
        assert_eq!(
            format!("{}", err),
            "Field 'business_unit' exceeds 128 characters (got 200)"
        );
    }

    #[test]
    fn flow_error_codes_are_stable() {
        assert_eq!(FlowError::UnrecognizedIntent.code(), "unrecognized_intent");
        assert_eq!(
            FlowError::RequiredContextMissing {
                intent: "profile".into(),
                condition: None
            }
            .code(),
            "required_context"
        );
        assert_eq!(
            FlowError::UnknownState { state: "x".into() }.code(),
            "unknown_state"
        );
        assert_eq!(
            FlowError::StorageTransient("timeout".into()).code(),
            "storage_transient"
        );
        assert_eq!(
            FlowError::Configuration("empty".into()).code(),
            "configuration_error"
        );
        assert_eq!(
            FlowError::UnknownBusinessUnit {
                business_unit: "acme".into()
            }
            .code(),
            "unknown_business_unit"
        );
    }

    #[test]
    fn only_storage_errors_are_retryable() {
        assert!(FlowError::StorageTransient("timeout".into()).is_retryable());
        assert!(!FlowError::UnrecognizedIntent.is_retryable());
        assert!(!FlowError::Configuration("x".into()).is_retryable());
    }
}
