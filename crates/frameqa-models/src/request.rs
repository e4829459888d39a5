//! Request bodies for the analysis endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::video::is_valid_video_id;

/// Maximum question length.
pub const MAX_QUESTION_LENGTH: usize = 2000;

/// Request validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Question exceeds {max} characters")]
    QuestionTooLong { max: usize },
}

/// Request to start a frame-by-frame analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Uploaded video file name
    pub video_id: String,
    /// Natural-language question about the video's visual content
    pub question: String,
}

impl AnalyzeRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !is_valid_video_id(&self.video_id) {
            return Err(RequestError::InvalidVideoId(self.video_id.clone()));
        }
        let question = self.question.trim();
        if question.is_empty() {
            return Err(RequestError::EmptyQuestion);
        }
        if question.chars().count() > MAX_QUESTION_LENGTH {
            return Err(RequestError::QuestionTooLong {
                max: MAX_QUESTION_LENGTH,
            });
        }
        Ok(())
    }
}

/// Request to stop a running analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRequest {
    /// Video file name the analysis was started for
    pub video_id: String,
}
