//! Inference service request/response types.

use serde::{Deserialize, Serialize};

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single chat message, optionally carrying base64-encoded images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    /// User message with one attached image.
    pub fn user_with_image(content: impl Into<String>, image_base64: String) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            images: Some(vec![image_base64]),
        }
    }
}

/// Streaming chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// One classified record of the streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRecord {
    /// Text fragment to append to the answer
    Content(String),
    /// End of the exchange; may carry a last fragment
    Done(String),
    /// Service-reported failure
    Error(String),
}

/// Wire shape of a streamed record. Accepts the chat (`message.content`),
/// generate (`response`) and bare (`content`) variants.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Parse and classify one newline-delimited record.
///
/// Error markers win over done markers, which win over plain content.
pub fn parse_record(line: &str) -> Result<StreamRecord, serde_json::Error> {
    let raw: RawRecord = serde_json::from_str(line)?;

    if let Some(error) = raw.error.filter(|e| !e.is_null()) {
        let message = match error {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        return Ok(StreamRecord::Error(message));
    }

    let text = raw
        .message
        .and_then(|m| m.content)
        .or(raw.content)
        .or(raw.response)
        .unwrap_or_default();

    if raw.done {
        Ok(StreamRecord::Done(text))
    } else {
        Ok(StreamRecord::Content(text))
    }
}
