//! Retrying vision model client.
//!
//! Wraps a [`VisionTransport`] with a per-attempt timeout and a bounded,
//! fixed-delay retry loop. Exhausting the attempts is a recoverable outcome:
//! `query` resolves to `None` instead of an error.

use super::provider::{ImagePayload, ModelPrompt, VisionRequest, VisionTransport};
use super::retry::RetryPolicy;
use crate::error::PipelineError;
use std::time::Duration;

/// Sends prompts about one image at a time to a vision model.
pub struct VisionClient {
    transport: Box<dyn VisionTransport>,
    model: String,
    retry: RetryPolicy,
    timeout: Duration,
}

impl VisionClient {
    pub fn new(
        transport: Box<dyn VisionTransport>,
        model: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            model: model.into(),
            retry,
            timeout,
        }
    }

    /// The model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model about an image, retrying failed attempts.
    ///
    /// Returns the raw completion text, or `None` once `max_attempts`
    /// attempts have failed.
    pub async fn query(&self, image: &ImagePayload, prompt: &ModelPrompt) -> Option<String> {
        let request = VisionRequest {
            model: &self.model,
            prompt,
            image,
        };

        let mut attempt = 1;
        loop {
            let error = match self.attempt(&request).await {
                Ok(text) => return Some(text),
                Err(e) => e,
            };

            tracing::warn!(
                "{} query attempt {attempt}/{} failed: {error}",
                prompt.kind,
                self.retry.max_attempts
            );

            if !self.retry.should_retry(attempt) {
                return None;
            }
            tokio::time::sleep(self.retry.delay).await;
            attempt += 1;
        }
    }

    /// One bounded request. Running past the timeout is reported as
    /// [`PipelineError::Timeout`] for the prompt's stage.
    async fn attempt(&self, request: &VisionRequest<'_>) -> Result<String, PipelineError> {
        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                stage: request.prompt.kind.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
