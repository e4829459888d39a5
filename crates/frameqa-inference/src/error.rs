//! Inference client error types.

use thiserror::Error;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Inference service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Inference service error: {0}")]
    Service(String),

    #[error("Inference stream ended before completion")]
    Truncated,

    #[error("Invalid inference configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
