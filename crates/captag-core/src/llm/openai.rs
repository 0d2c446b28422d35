//! OpenAI-compatible chat completions transport.
//!
//! Works with any server speaking the `/v1/chat/completions` dialect (LM
//! Studio, llama.cpp server, vLLM, OpenAI itself). The image travels as a
//! data URL in the user message content array.

use super::provider::{resolve_env_var, VisionRequest, VisionTransport};
use crate::config::ApiConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// HTTP transport holding one reqwest connection pool for the whole run.
pub struct OpenAiTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiTransport {
    /// Build a transport from the `[api]` config section.
    pub fn new(config: &ApiConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PipelineError::Transport {
                message: format!("Failed to build HTTP client: {e}"),
                status_code: None,
            })?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
            api_key: resolve_env_var(&config.api_key),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn build_body<'a>(request: &VisionRequest<'a>) -> ChatRequest<'a> {
    ChatRequest {
        model: request.model,
        temperature: request.prompt.temperature,
        max_tokens: request.prompt.max_tokens,
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ChatContent::Text {
                    text: request.prompt.text.clone(),
                },
                ChatContent::ImageUrl {
                    image_url: ImageUrl {
                        url: request.image.data_url(),
                    },
                },
            ],
        }],
    }
}

#[async_trait]
impl VisionTransport for OpenAiTransport {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn send(&self, request: &VisionRequest<'_>) -> Result<String, PipelineError> {
        let start = Instant::now();
        let body = build_body(request);

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| PipelineError::Transport {
            message: format!("Model request failed: {e}"),
            status_code: None,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Transport {
                message: format!("Model HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| PipelineError::Transport {
            message: format!("Failed to parse model response: {e}"),
            status_code: None,
        })?;

        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::Transport {
                message: "Model returned no choices or empty content".to_string(),
                status_code: None,
            })?;

        tracing::debug!(
            "{} {} response in {}ms ({} chars)",
            self.name(),
            request.prompt.kind,
            start.elapsed().as_millis(),
            text.len()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptConfig;
    use crate::llm::provider::{ImagePayload, ModelPrompt};

    fn api_config(url: String) -> ApiConfig {
        ApiConfig {
            url,
            timeout_ms: 5000,
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_body_shape() {
        let prompt = ModelPrompt::caption(&PromptConfig::default());
        let image = ImagePayload::from_jpeg_bytes(&[0xFF, 0xD8, 0xFF]);
        let request = VisionRequest {
            model: "llava",
            prompt: &prompt,
            image: &image,
        };

        let json = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(json["model"], "llava");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], prompt.text);
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,/9j/"
        );
    }

    #[tokio::test]
    async fn test_send_reads_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"A red car."}}]}"#)
            .create_async()
            .await;

        let transport =
            OpenAiTransport::new(&api_config(format!("{}/v1/chat/completions", server.url())))
                .unwrap();
        let prompt = ModelPrompt::caption(&PromptConfig::default());
        let image = ImagePayload::from_jpeg_bytes(&[1, 2, 3]);
        let text = transport
            .send(&VisionRequest {
                model: "llava",
                prompt: &prompt,
                image: &image,
            })
            .await
            .unwrap();

        assert_eq!(text, "A red car.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_maps_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("model loading")
            .create_async()
            .await;

        let transport =
            OpenAiTransport::new(&api_config(format!("{}/v1/chat/completions", server.url())))
                .unwrap();
        let prompt = ModelPrompt::tags(&PromptConfig::default());
        let image = ImagePayload::from_jpeg_bytes(&[1, 2, 3]);
        let err = transport
            .send(&VisionRequest {
                model: "llava",
                prompt: &prompt,
                image: &image,
            })
            .await
            .unwrap_err();

        match err {
            PipelineError::Transport {
                status_code,
                message,
            } => {
                assert_eq!(status_code, Some(503));
                assert!(message.contains("model loading"));
            }
            other => panic!("Expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let transport =
            OpenAiTransport::new(&api_config(format!("{}/v1/chat/completions", server.url())))
                .unwrap();
        let prompt = ModelPrompt::caption(&PromptConfig::default());
        let image = ImagePayload::from_jpeg_bytes(&[1, 2, 3]);
        let result = transport
            .send(&VisionRequest {
                model: "llava",
                prompt: &prompt,
                image: &image,
            })
            .await;

        assert!(matches!(result, Err(PipelineError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_send_adds_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let config = ApiConfig {
            api_key: "sk-test".to_string(),
            ..api_config(format!("{}/v1/chat/completions", server.url()))
        };
        let transport = OpenAiTransport::new(&config).unwrap();
        let prompt = ModelPrompt::caption(&PromptConfig::default());
        let image = ImagePayload::from_jpeg_bytes(&[1, 2, 3]);
        transport
            .send(&VisionRequest {
                model: "llava",
                prompt: &prompt,
                image: &image,
            })
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
