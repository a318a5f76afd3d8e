use crate::prompt::ChatMessage;
use crate::types::{AnnotateConfig, AnnotatorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Raw text returned by the model backend for one request.
///
/// An explicit value type so the normalizer never depends on any HTTP
/// client's response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
}

/// Trait for language-model backends that answer one rendered prompt.
///
/// The backend call is the pipeline's only suspension point; everything
/// else is synchronous.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Human-readable backend name, for logs.
    fn backend_name(&self) -> String;

    /// Send one multi-turn payload, return the model's free-form reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelResponse>;
}

/// Request body for Ollama `/api/chat`.
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response body from Ollama `/api/chat`.
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    content: String,
}

/// Ollama HTTP backend for local LLM inference.
pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(config: &AnnotateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn backend_name(&self) -> String {
        format!("ollama ({} at {})", self.model, self.base_url)
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelResponse> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            // Deterministic decoding: annotation output must be reproducible
            options: OllamaOptions { temperature: 0.0 },
        };

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnnotatorError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaChatResponse = response.json().await?;
        debug!("Received {} bytes from {}", parsed.message.content.len(), url);

        Ok(ModelResponse {
            text: parsed.message.content,
        })
    }
}

type StubReply = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Deterministic backend substitute for tests: maps the final user turn of
/// each request to a canned reply.
pub struct StubBackend {
    reply: Box<StubReply>,
}

impl StubBackend {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(move |input| Ok(reply(input))),
        }
    }

    /// Stub whose replies may fail, for exercising backend-error paths.
    pub fn with_results<F>(reply: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
        }
    }
}

#[async_trait]
impl ModelBackend for StubBackend {
    fn backend_name(&self) -> String {
        "stub".to_string()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelResponse> {
        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        (self.reply)(input).map(|text| ModelResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_answers_from_final_user_turn() {
        let backend = StubBackend::new(|input| format!("echo:{input}"));
        let messages = vec![
            ChatMessage::system("instruction"),
            ChatMessage::user("酸辣土豆丝"),
            ChatMessage::assistant("酸辣|土豆丝"),
            ChatMessage::user("腊味饭"),
        ];

        let response = backend.complete(&messages).await.unwrap();
        assert_eq!(response.text, "echo:腊味饭");
    }

    #[tokio::test]
    async fn stub_propagates_configured_failures() {
        let backend = StubBackend::with_results(|_| {
            Err(AnnotatorError::Backend {
                status: 503,
                body: "unavailable".to_string(),
            })
        });

        let result = backend.complete(&[ChatMessage::user("x")]).await;
        assert!(matches!(result, Err(AnnotatorError::Backend { status: 503, .. })));
    }

    #[test]
    fn ollama_backend_trims_trailing_slash() {
        let config = AnnotateConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..AnnotateConfig::default()
        };
        let backend = OllamaBackend::new(&config).unwrap();
        assert_eq!(backend.base_url, "http://localhost:11434");
    }
}
