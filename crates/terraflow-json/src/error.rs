//! Error types for configuration fragments and documents

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, merging or rendering Terraform JSON
#[derive(Error, Debug)]
pub enum JsonError {
    /// A document without a mapping root, or with an unknown top-level key
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The rendered document could not be written to its destination
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JsonError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        JsonError::InvalidFragment(message.into())
    }

    /// Whether the error happened while producing the output file
    pub fn is_serialization(&self) -> bool {
        matches!(self, JsonError::Serialization(_) | JsonError::Write { .. })
    }
}

pub type Result<T> = std::result::Result<T, JsonError>;
