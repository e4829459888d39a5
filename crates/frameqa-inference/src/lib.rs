//! Streaming client for the vision inference service.
//!
//! One exchange sends a single image and prompt to an Ollama-compatible
//! `/api/chat` endpoint and decodes the newline-delimited JSON reply into
//! the consolidated answer text. The pipeline only depends on the
//! [`InferenceService`] trait so tests can substitute scripted replies.

pub mod client;
pub mod decoder;
pub mod error;
pub mod exchange;
pub mod types;

pub use client::{InferenceConfig, InferenceService, OllamaClient, DEFAULT_PROMPT_TEMPLATE};
pub use decoder::LineDecoder;
pub use error::{InferenceError, InferenceResult};
pub use exchange::{decode_exchange, ExchangeItem, ExchangeStream};
pub use types::{parse_record, ChatMessage, ChatRequest, MessageRole, StreamRecord};
