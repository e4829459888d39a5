//! Axum HTTP API server.
//!
//! This crate provides:
//! - Streamed frame-by-frame analysis over `text/event-stream`
//! - Stop requests for running analyses
//! - Video upload and static serving of extracted frames
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod sse;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
