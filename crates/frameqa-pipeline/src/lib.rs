//! Frame-by-frame analysis orchestration.
//!
//! This crate provides:
//! - The process-wide session tracker used for cooperative cancellation
//! - The analysis orchestrator state machine
//! - The event sink seam the orchestrator writes stream events into
//! - Structured session logging and pipeline metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod sink;
pub mod tracker;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use logging::SessionLogger;
pub use orchestrator::{AnalysisOrchestrator, SessionOutcome};
pub use sink::{EventSink, SinkClosed};
pub use tracker::SessionTracker;
