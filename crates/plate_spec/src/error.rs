//! Error types for the spec module.

use std::fmt;

use thiserror::Error;

use crate::schema::SchemaVersion;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while building, activating or validating a collection.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Schema definition error in {location}: {message}")]
    SchemaDefinition { location: String, message: String },

    #[error("Unsupported schema version {declared} (supported up to {supported})")]
    UnsupportedSchema {
        declared: SchemaVersion,
        supported: SchemaVersion,
    },

    #[error("Circular section dependency: {}", cycle.join(" -> "))]
    CircularSectionDependency { cycle: Vec<String> },

    #[error("{0}")]
    Validation(ValidationErrors),
}

impl SpecError {
    pub(crate) fn definition(location: impl Into<String>, message: impl Into<String>) -> Self {
        SpecError::SchemaDefinition {
            location: location.into(),
            message: message.into(),
        }
    }

    /// The collected variable failures, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            SpecError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Why a single variable failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The value could not be coerced to the declared type.
    InvalidType,
    /// The value does not match the format grammar (email, url, hostname).
    InvalidFormat,
    /// The value is not one of the enum options.
    NotInOptions,
    /// No value was supplied and the variable is not optional.
    MissingValue,
    /// An empty value was supplied for a required variable.
    EmptyRequired,
}

/// A per-variable validation failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{variable}: {message}")]
pub struct VariableValidationError {
    pub variable: String,
    /// Offending raw value, masked for sensitive variables.
    pub value: Option<String>,
    pub failure: ValidationFailure,
    pub message: String,
}

/// All validation failures from one pass, in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    pub errors: Vec<VariableValidationError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Find the failure reported for a variable.
    pub fn for_variable(&self, name: &str) -> Option<&VariableValidationError> {
        self.errors.iter().find(|e| e.variable == name)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} variable(s) failed validation", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
