//! Terraform runner error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("Unsupported platform for terraform binaries: {os}-{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Failed to download terraform from {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Failed to extract terraform binary: {0}")]
    ExtractFailed(String),

    #[error("terraform {command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("{command} timed out after {}s", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("Could not find a version number in: {0}")]
    VersionParse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration document error: {0}")]
    Document(#[from] terraflow_json::JsonError),

    #[error("Configuration error: {0}")]
    Config(#[from] terraflow_config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TerraformError>;
