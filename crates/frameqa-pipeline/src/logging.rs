//! Structured session logging utilities.
//!
//! Provides consistent, structured logging for analysis sessions with
//! tracing spans and contextual information.

use frameqa_models::SessionKey;
use tracing::{error, info, warn, Span};

/// Session logger for structured logging with consistent formatting.
///
/// Every line carries the session key and the video identifier.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_key: String,
    video_id: String,
}

impl SessionLogger {
    /// Create a new logger for a session.
    pub fn new(session_key: &SessionKey, video_id: &str) -> Self {
        Self {
            session_key: session_key.to_string(),
            video_id: video_id.to_string(),
        }
    }

    /// Log the start of a session.
    pub fn log_start(&self, message: &str) {
        info!(
            session_key = %self.session_key,
            video_id = %self.video_id,
            "Analysis started: {}", message
        );
    }

    /// Log per-frame progress.
    pub fn log_progress(&self, second: u32, message: &str) {
        info!(
            session_key = %self.session_key,
            video_id = %self.video_id,
            second,
            "Analysis progress: {}", message
        );
    }

    /// Log a warning during the session.
    pub fn log_warning(&self, message: &str) {
        warn!(
            session_key = %self.session_key,
            video_id = %self.video_id,
            "Analysis warning: {}", message
        );
    }

    /// Log a fatal session error.
    pub fn log_error(&self, message: &str) {
        error!(
            session_key = %self.session_key,
            video_id = %self.video_id,
            "Analysis error: {}", message
        );
    }

    /// Log the end of a session.
    pub fn log_completion(&self, message: &str) {
        info!(
            session_key = %self.session_key,
            video_id = %self.video_id,
            "Analysis finished: {}", message
        );
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Create a tracing span for this session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "analysis",
            session_key = %self.session_key,
            video_id = %self.video_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_logger_creation() {
        let key = SessionKey::for_video("cat.mp4");
        let logger = SessionLogger::new(&key, "cat.mp4");

        assert_eq!(logger.session_key(), "catmp4");
        assert_eq!(logger.video_id(), "cat.mp4");
    }
}
