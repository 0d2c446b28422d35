//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};

/// Vision model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Chat completions endpoint (OpenAI-compatible)
    pub url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Bearer token (supports ${ENV_VAR} syntax). Empty means no auth header.
    pub api_key: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum number of attempts per query, including the first one
    pub max_retries: u32,

    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "mys/ggml_bakllava-1".to_string(),
            api_key: String::new(),
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Prompt texts and the sampling configuration shared by both prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Instruction used to obtain the caption
    pub caption: String,

    /// Instruction used to obtain the keyword list
    pub tags: String,

    /// Sampling temperature (0 = deterministic decoding)
    pub temperature: f32,

    /// Output length cap per completion
    pub max_tokens: u32,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            caption: "Describe the image concisely in one sentence (max 100 chars).".to_string(),
            tags: "List 7-10 specific keywords describing the main objects, themes and \
                   elements in the image. Return only comma-separated keywords, no sentences."
                .to_string(),
            temperature: 0.0,
            max_tokens: 100,
        }
    }
}

/// Folder scan and batch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Files per progress batch (does not change execution order)
    pub batch_size: usize,

    /// Supported input extensions, without the leading dot
    pub supported_formats: Vec<String>,

    /// Files smaller than this (in KiB) are left out of the scan
    pub min_file_size_kb: u64,

    /// JPEG quality of the payload sent to the model
    pub payload_quality: u8,

    /// Re-caption files that already carry a caption and keywords
    pub force_overwrite: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            supported_formats: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            min_file_size_kb: 100,
            payload_quality: 100,
            force_overwrite: true,
        }
    }
}

/// Metadata embedding and tag extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// JPEG re-encode quality when embedding EXIF
    pub jpeg_quality: u8,

    /// EXIF tag id for the caption (ImageDescription)
    pub description_tag: u16,

    /// EXIF tag id for the keywords (XPKeywords)
    pub keywords_tag: u16,

    /// Fewer surviving tags than this is an extraction failure
    pub min_tags: usize,

    /// At most this many tags are kept
    pub max_tags: usize,

    /// Longest accepted tag, in characters
    pub max_tag_length: usize,

    /// Captions are truncated to this many characters
    pub max_caption_length: usize,

    /// Write through a temp file in the same directory, then rename over the original
    pub atomic_write: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            description_tag: 270,
            keywords_tag: 40094,
            min_tags: 7,
            max_tags: 10,
            max_tag_length: 25,
            max_caption_length: 100,
            atomic_write: true,
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File name of the plain-text report written into the processed folder
    pub report_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_name: "metadata_report.txt".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
