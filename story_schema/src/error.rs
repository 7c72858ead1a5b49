use std::path::PathBuf;

use thiserror::Error;

use crate::definition::ValidationErrors;

/// Errors from reading and validating definition files.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported definition file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl SchemaError {
    /// The validation problems, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            SchemaError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
