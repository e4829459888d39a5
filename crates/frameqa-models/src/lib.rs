//! Shared data models for the FrameQA backend.
//!
//! This crate provides Serde-serializable types for:
//! - Outbound analysis stream events
//! - Video references and session keys
//! - Analyze/stop request bodies

pub mod event;
pub mod request;
pub mod video;

// Re-export common types
pub use event::{StreamEvent, StreamEventType};
pub use request::{AnalyzeRequest, RequestError, StopRequest, MAX_QUESTION_LENGTH};
pub use video::{is_valid_video_id, SessionKey, VideoRef};
