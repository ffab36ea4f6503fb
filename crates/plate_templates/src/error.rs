//! Error types for templates and libraries.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while locating, loading or rendering templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: '{identifier}' (searched: {})", format_searched(.searched))]
    NotFound {
        identifier: String,
        /// Libraries that were searched, in priority order.
        searched: Vec<String>,
    },

    #[error("Template '{identifier}' not found in library '{library}'")]
    NotFoundInLibrary { identifier: String, library: String },

    #[error("Unknown library '{0}'")]
    UnknownLibrary(String),

    #[error("Invalid template identifier '{identifier}': {message}")]
    InvalidIdentifier { identifier: String, message: String },

    #[error("Invalid manifest in template {template}: {message}")]
    InvalidManifest { template: String, message: String },

    #[error("Invalid library configuration for '{library}': {message}")]
    InvalidLibrary { library: String, message: String },

    #[error("Library sync failed for '{library}': {message}")]
    SyncFailed { library: String, message: String },

    #[error("Template rendering failed for {path}: {message}")]
    RenderingFailed { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Spec error: {0}")]
    Spec(#[from] plate_spec::SpecError),
}

fn format_searched(searched: &[String]) -> String {
    if searched.is_empty() {
        "no libraries configured".to_string()
    } else {
        searched.join(", ")
    }
}
