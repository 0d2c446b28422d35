//! Core data types for the captag pipeline.

use crate::error::{FailureKind, PipelineError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Container format of an image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Jpeg,
    Png,
}

impl ContainerFormat {
    /// Guess the format from a file extension. Anything that is not PNG is
    /// treated as JPEG, matching how it will be re-encoded.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => Self::Png,
            _ => Self::Jpeg,
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("jpeg"),
            Self::Png => f.write_str("png"),
        }
    }
}

/// An image discovered by the folder scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Absolute path; changes if the file is renamed
    pub path: PathBuf,
    /// File name as found on disk
    pub original_name: String,
    /// Format guessed from the extension
    pub format: ContainerFormat,
    /// File size in bytes
    pub size: u64,
}

impl ImageFile {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = ContainerFormat::from_path(&path);
        Self {
            path,
            original_name,
            format,
            size,
        }
    }

    /// Current file name (after any rename).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.original_name.clone())
    }
}

/// Why a file failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&PipelineError> for FailureReason {
    fn from(error: &PipelineError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Terminal outcome for one processed file.
///
/// Exactly one of {caption and tags, error, skipped} holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionResult {
    /// Path after any rename
    pub file_path: PathBuf,

    /// Name as discovered
    pub original_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReason>,

    pub skipped: bool,
}

impl CaptionResult {
    pub fn success(file: &ImageFile, caption: String, tags: Vec<String>) -> Self {
        Self {
            file_path: file.path.clone(),
            original_name: file.original_name.clone(),
            caption: Some(caption),
            tags: Some(tags),
            error: None,
            skipped: false,
        }
    }

    pub fn failure(file: &ImageFile, error: &PipelineError) -> Self {
        Self {
            file_path: file.path.clone(),
            original_name: file.original_name.clone(),
            caption: None,
            tags: None,
            error: Some(error.into()),
            skipped: false,
        }
    }

    pub fn skipped(file: &ImageFile) -> Self {
        Self {
            file_path: file.path.clone(),
            original_name: file.original_name.clone(),
            caption: None,
            tags: None,
            error: None,
            skipped: true,
        }
    }

    /// Current file name, used in the report.
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.original_name.clone())
    }

    pub fn is_success(&self) -> bool {
        !self.skipped && self.error.is_none() && self.caption.is_some() && self.tags.is_some()
    }
}

/// Per-run tallies, updated as each result resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunCounters {
    /// Fold one result into the tallies.
    pub fn record(&mut self, result: &CaptionResult) {
        if result.skipped {
            self.skipped += 1;
        } else if result.error.is_some() {
            self.failed += 1;
        } else {
            self.processed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

/// Everything one folder run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub folder: PathBuf,
    pub results: Vec<CaptionResult>,
    pub counters: RunCounters,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Results that ended in an error, in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &CaptionResult> {
        self.results.iter().filter(|r| r.error.is_some())
    }
}
