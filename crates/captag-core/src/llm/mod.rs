//! Vision model integration.
//!
//! A transport abstraction over the HTTP call, an OpenAI-compatible
//! implementation of it, and the retrying client the pipeline talks to.

pub(crate) mod client;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod retry;

pub use client::VisionClient;
pub use openai::OpenAiTransport;
pub use provider::{ImagePayload, ModelPrompt, PromptKind, VisionRequest, VisionTransport};
pub use retry::RetryPolicy;
