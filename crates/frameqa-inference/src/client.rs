//! Inference service HTTP client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{InferenceError, InferenceResult};
use crate::exchange::{decode_exchange, ExchangeStream};
use crate::types::{ChatMessage, ChatRequest};

/// Prompt sent with every frame; `{question}` is replaced by the user's question.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "This image is one frame of a video. \
Answer the following question about what is visible in this frame only, in one or two sentences. \
If the frame is unrelated to the question, reply with an empty answer.\n\nQuestion: {question}";

/// Configuration for the inference client.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL of the inference service
    pub base_url: String,
    /// Vision model name
    pub model: String,
    /// Whole-request timeout; `None` waits for the stream indefinitely
    pub timeout: Option<Duration>,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Prompt template with a `{question}` placeholder
    pub prompt_template: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2-vision:latest".to_string(),
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl InferenceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("OLLAMA_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            timeout: std::env::var("INFERENCE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            connect_timeout: std::env::var("INFERENCE_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            prompt_template: std::env::var("PROMPT_TEMPLATE").unwrap_or(defaults.prompt_template),
        }
    }

    /// Render the per-frame prompt for a question.
    pub fn render_prompt(&self, question: &str) -> String {
        if self.prompt_template.contains("{question}") {
            self.prompt_template.replace("{question}", question.trim())
        } else {
            format!("{}\n\n{}", self.prompt_template, question.trim())
        }
    }
}

/// A service that answers a prompt about one image as a stream.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Open one exchange for `image_path` and `prompt`.
    async fn stream(&self, image_path: &Path, prompt: &str) -> InferenceResult<ExchangeStream>;

    /// Render the prompt sent for `question`.
    fn prompt_for(&self, question: &str) -> String {
        question.trim().to_string()
    }

    /// Whether the service is reachable.
    async fn health_check(&self) -> InferenceResult<bool> {
        Ok(true)
    }
}

/// Client for an Ollama-compatible chat endpoint.
pub struct OllamaClient {
    http: Client,
    config: InferenceConfig,
}

impl OllamaClient {
    /// Create a new client.
    pub fn new(config: InferenceConfig) -> InferenceResult<Self> {
        if config.base_url.is_empty() {
            return Err(InferenceError::Config("base URL is empty".to_string()));
        }

        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(InferenceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> InferenceResult<Self> {
        Self::new(InferenceConfig::from_env())
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
}

#[async_trait]
impl InferenceService for OllamaClient {
    async fn stream(&self, image_path: &Path, prompt: &str) -> InferenceResult<ExchangeStream> {
        let url = format!("{}/api/chat", self.config.base_url);

        let image = tokio::fs::read(image_path).await?;
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user_with_image(prompt, BASE64.encode(image))],
            stream: true,
        };

        debug!(
            url = %url,
            model = %self.config.model,
            image = %image_path.display(),
            "Opening inference stream"
        );

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_exchange(response.bytes_stream()))
    }

    fn prompt_for(&self, question: &str) -> String {
        self.config.render_prompt(question)
    }

    async fn health_check(&self) -> InferenceResult<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Inference service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Inference service health check error: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::ExchangeItem;
    use futures_util::StreamExt;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OllamaClient {
        OllamaClient::new(InferenceConfig {
            base_url: server.uri(),
            model: "test-vision".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn frame_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("1.png");
        std::fs::write(&path, b"png-bytes").unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.2-vision:latest");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_render_prompt() {
        let config = InferenceConfig {
            prompt_template: "Q: {question}".to_string(),
            ..Default::default()
        };
        assert_eq!(config.render_prompt("  cat  "), "Q: cat");

        let config = InferenceConfig {
            prompt_template: "Describe.".to_string(),
            ..Default::default()
        };
        assert_eq!(config.render_prompt("cat"), "Describe.\n\ncat");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = OllamaClient::new(InferenceConfig {
            base_url: String::new(),
            ..Default::default()
        });
        assert!(matches!(result, Err(InferenceError::Config(_))));
    }

    #[tokio::test]
    async fn test_stream_consolidates_reply() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"A cat\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\" sleeps.\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-vision",
                "stream": true,
                "messages": [{"role": "user", "content": "cat?", "images": ["cG5nLWJ5dGVz"]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let stream = client_for(&server)
            .stream(&frame_file(&dir), "cat?")
            .await
            .unwrap();
        let items: Vec<_> = stream
            .filter(|item| futures_util::future::ready(!matches!(item, Ok(ExchangeItem::Progress))))
            .collect()
            .await;

        assert_eq!(
            items[0].as_ref().unwrap(),
            &ExchangeItem::Chunk("A cat sleeps.".to_string())
        );
        assert_eq!(items[1].as_ref().unwrap(), &ExchangeItem::Done);
    }

    #[tokio::test]
    async fn test_stream_error_marker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{\"error\":\"model is loading\"}\n", "application/x-ndjson"),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let stream = client_for(&server)
            .stream(&frame_file(&dir), "cat?")
            .await
            .unwrap();
        let items: Vec<_> = stream
            .filter(|item| futures_util::future::ready(!matches!(item, Ok(ExchangeItem::Progress))))
            .collect()
            .await;

        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(InferenceError::Service(m)) if m == "model is loading"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let result = client_for(&server).stream(&frame_file(&dir), "cat?").await;

        match result {
            Err(InferenceError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected status error"),
        }
    }

    #[tokio::test]
    async fn test_missing_image_file() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let result = client_for(&server)
            .stream(&dir.path().join("nope.png"), "cat?")
            .await;
        assert!(matches!(result, Err(InferenceError::Io(_))));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"models\":[]}"))
            .mount(&server)
            .await;

        assert!(client_for(&server).health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_health_check_reports_unhealthy_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!client_for(&server).health_check().await.unwrap());
    }
}
