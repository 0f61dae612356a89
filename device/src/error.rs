//! Start-up errors of the relay binary.
//!
//! Failures inside a running cycle are [`pipeline::CycleError`]s and never
//! reach this type; everything here stops the process before the tasks run.

use std::path::PathBuf;

use pipeline::ConfigError;
use thiserror::Error;

/// Errors that prevent the relay from starting
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No JPEG frames found in {0}")]
    NoFrames(PathBuf),
    #[error("Frame {path} is not a readable JPEG: {reason}")]
    InvalidFrame { path: String, reason: String },
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
