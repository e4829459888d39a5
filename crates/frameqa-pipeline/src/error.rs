//! Pipeline error types.

use frameqa_inference::InferenceError;
use frameqa_media::MediaError;
use thiserror::Error;

/// Fatal session errors. Each one ends the session with a single `error` event.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Could not read video: {0}")]
    Probe(#[source] MediaError),

    #[error("Frame extraction failed at {second}s (last processed second: {last_processed}): {source}")]
    Media {
        second: u32,
        last_processed: u32,
        #[source]
        source: MediaError,
    },

    #[error("Inference failed at {second}s (last processed second: {last_processed}): {source}")]
    Inference {
        second: u32,
        last_processed: u32,
        #[source]
        source: InferenceError,
    },
}

impl PipelineError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Input(_) => "input",
            PipelineError::Probe(_) | PipelineError::Media { .. } => "media",
            PipelineError::Inference { .. } => "inference",
        }
    }

    /// Message sent to the client in the `error` event.
    pub fn client_message(&self) -> String {
        match self {
            PipelineError::Probe(source) | PipelineError::Media { source, .. } => {
                match source.stderr_tail() {
                    Some(detail) => format!("{} ({})", self, detail),
                    None => self.to_string(),
                }
            }
            _ => self.to_string(),
        }
    }
}
