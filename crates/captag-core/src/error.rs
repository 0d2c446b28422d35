//! Error types for the captag pipeline.
//!
//! Errors are organized by stage so that every per-file failure can be turned
//! into a short, tagged reason in the run report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for captag operations.
#[derive(Error, Debug)]
pub enum CaptagError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-file pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Network, HTTP status, or response-shape failure while querying the model
    #[error("{message}")]
    Transport {
        message: String,
        status_code: Option<u16>,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// Model text did not yield a usable caption or enough tags
    #[error("Extraction failed for {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// Renaming to a sanitized file name failed
    #[error("Rename failed for {path}: {message}")]
    Rename { path: PathBuf, message: String },

    /// Source image could not be read or re-encoded for transport
    #[error("Encode failed for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Metadata re-encode or write failed
    #[error("Embed failed for {path}: {message}")]
    Embed { path: PathBuf, message: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

impl PipelineError {
    /// The report tag for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => FailureKind::Transport,
            Self::Extraction { .. } => FailureKind::Extraction,
            Self::Rename { .. } => FailureKind::Rename,
            Self::Encode { .. } | Self::FileNotFound(_) => FailureKind::Encode,
            Self::Embed { .. } => FailureKind::Embed,
        }
    }
}

/// Failure category attached to a per-file result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Transport,
    Extraction,
    Rename,
    Encode,
    Embed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::Extraction => "extraction",
            Self::Rename => "rename",
            Self::Encode => "encode",
            Self::Embed => "embed",
        };
        f.write_str(s)
    }
}

/// Convenience type alias for captag results.
pub type Result<T> = std::result::Result<T, CaptagError>;
