//! Error types for the core module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while resolving or configuring generation.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Invalid module definition for '{module}': {source}")]
    InvalidModule {
        module: String,
        #[source]
        source: plate_spec::SpecError,
    },

    #[error("Configuration error in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("Cannot generate a value for '{variable}': {message}")]
    Generation { variable: String, message: String },

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Spec error: {0}")]
    Spec(#[from] plate_spec::SpecError),

    #[error("Template error: {0}")]
    Template(#[from] plate_templates::TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_yaml::Error> for CoreError {
    fn from(e: serde_yaml::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl CoreError {
    /// The collected variable failures, if resolution stopped at validation.
    pub fn validation_errors(&self) -> Option<&plate_spec::ValidationErrors> {
        match self {
            CoreError::Spec(e) => e.validation_errors(),
            _ => None,
        }
    }
}
