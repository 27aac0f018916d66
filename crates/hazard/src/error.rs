//! Error types for the hazard workflows

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by classification, pipeline and workspace operations
#[derive(Error, Debug)]
pub enum HazardError {
    #[error(transparent)]
    Core(#[from] geohaz_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid rule catalog: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Field '{field}' not found in {dataset}")]
    MissingField { field: String, dataset: String },

    #[error("Output {} already exists and overwrite is disabled", .0.display())]
    OutputExists(PathBuf),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// Result type alias for hazard operations
pub type Result<T> = std::result::Result<T, HazardError>;
