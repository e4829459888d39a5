//! Analysis stream event types.
//!
//! One analysis session produces zero or more `image`/`text` events followed
//! by exactly one terminal event (`end`, `cancelled` or `error`).

use serde::{Deserialize, Serialize};

/// Stream event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// Frame extracted
    Image,
    /// Inference text for a frame
    Text,
    /// Session stopped by request
    Cancelled,
    /// Session failed
    Error,
    /// All frames processed
    End,
}

impl StreamEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEventType::Image => "image",
            StreamEventType::Text => "text",
            StreamEventType::Cancelled => "cancelled",
            StreamEventType::Error => "error",
            StreamEventType::End => "end",
        }
    }
}

/// Stream event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Frame extracted at second `i`
    Image { i: u32, path: String },

    /// Consolidated inference text for the frame at second `i`
    Text { i: u32, content: String },

    /// Session stopped before reaching the end of the video
    Cancelled {},

    /// Session failed
    Error { message: String },

    /// Session finished; `i` is the last processed second
    End { i: u32 },
}

impl StreamEvent {
    /// Create an image event.
    pub fn image(i: u32, path: impl Into<String>) -> Self {
        StreamEvent::Image {
            i,
            path: path.into(),
        }
    }

    /// Create a text event.
    pub fn text(i: u32, content: impl Into<String>) -> Self {
        StreamEvent::Text {
            i,
            content: content.into(),
        }
    }

    /// Create a cancelled event.
    pub fn cancelled() -> Self {
        StreamEvent::Cancelled {}
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }

    /// Create an end event.
    pub fn end(i: u32) -> Self {
        StreamEvent::End { i }
    }

    /// Get the event type.
    pub fn event_type(&self) -> StreamEventType {
        match self {
            StreamEvent::Image { .. } => StreamEventType::Image,
            StreamEvent::Text { .. } => StreamEventType::Text,
            StreamEvent::Cancelled {} => StreamEventType::Cancelled,
            StreamEvent::Error { .. } => StreamEventType::Error,
            StreamEvent::End { .. } => StreamEventType::End,
        }
    }

    /// Whether this event closes a session's event sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Cancelled {} | StreamEvent::Error { .. } | StreamEvent::End { .. }
        )
    }

    /// Frame offset carried by the event, if any.
    pub fn frame_index(&self) -> Option<u32> {
        match self {
            StreamEvent::Image { i, .. } | StreamEvent::Text { i, .. } | StreamEvent::End { i } => {
                Some(*i)
            }
            StreamEvent::Cancelled {} | StreamEvent::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_event_serialization() {
        let json = serde_json::to_string(&StreamEvent::image(1, "public/images/cat/1.png")).unwrap();
        assert_eq!(json, r#"{"type":"image","i":1,"path":"public/images/cat/1.png"}"#);
    }

    #[test]
    fn test_terminal_event_serialization() {
        assert_eq!(
            serde_json::to_string(&StreamEvent::cancelled()).unwrap(),
            r#"{"type":"cancelled"}"#
        );
        assert_eq!(
            serde_json::to_string(&StreamEvent::end(3)).unwrap(),
            r#"{"type":"end","i":3}"#
        );
    }

    #[test]
    fn test_cancelled_deserializes_without_fields() {
        let event: StreamEvent = serde_json::from_str(r#"{"type":"cancelled"}"#).unwrap();
        assert_eq!(event, StreamEvent::cancelled());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(StreamEvent::end(2).is_terminal());
        assert!(StreamEvent::error("boom").is_terminal());
        assert!(StreamEvent::cancelled().is_terminal());
        assert!(!StreamEvent::image(1, "a.png").is_terminal());
        assert!(!StreamEvent::text(1, "yes").is_terminal());
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(StreamEvent::text(4, "x").event_type().as_str(), "text");
        assert_eq!(StreamEvent::text(4, "x").frame_index(), Some(4));
        assert_eq!(StreamEvent::error("x").frame_index(), None);
    }
}
