//! Vision transport trait and request types.
//!
//! Defines the seam between the retrying client and whatever carries a
//! request to the model, plus the prompt/payload types both sides share.

use crate::config::PromptConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use base64::Engine;
use std::fmt;

/// Base64-encoded JPEG ready to send to a vision model.
///
/// Every source image is re-encoded to JPEG first, so the content type on the
/// wire is always `image/jpeg`.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Base64-encoded JPEG bytes
    pub data: String,
}

impl ImagePayload {
    /// MIME type of every payload.
    pub const MEDIA_TYPE: &'static str = "image/jpeg";

    /// Wrap already-encoded JPEG bytes.
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", Self::MEDIA_TYPE, self.data)
    }
}

/// Which of the two per-image prompts a query carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Caption,
    Tags,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caption => f.write_str("caption"),
            Self::Tags => f.write_str("tags"),
        }
    }
}

/// An immutable instruction prompt with its fixed sampling configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrompt {
    pub kind: PromptKind,
    pub text: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelPrompt {
    /// The caption prompt from config.
    pub fn caption(config: &PromptConfig) -> Self {
        Self {
            kind: PromptKind::Caption,
            text: config.caption.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// The tags prompt from config.
    pub fn tags(config: &PromptConfig) -> Self {
        Self {
            kind: PromptKind::Tags,
            text: config.tags.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// One chat request: a prompt plus an image.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// The instruction prompt and its sampling settings
    pub prompt: &'a ModelPrompt,
    /// The image being described
    pub image: &'a ImagePayload,
}

/// Carries a single request to a vision model and returns its raw text.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the client holds a `Box<dyn VisionTransport>`).
#[async_trait]
pub trait VisionTransport: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Send one request. Any network, status or response-shape problem is an error.
    async fn send(&self, request: &VisionRequest<'_>) -> Result<String, PipelineError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
