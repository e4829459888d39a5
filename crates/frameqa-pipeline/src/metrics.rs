//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops until the binary
//! installs a recorder.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SESSIONS_STARTED_TOTAL: &str = "frameqa_sessions_started_total";
    pub const SESSIONS_FINISHED_TOTAL: &str = "frameqa_sessions_finished_total";
    pub const SESSIONS_ACTIVE: &str = "frameqa_sessions_active";
    pub const FRAMES_ANALYZED_TOTAL: &str = "frameqa_frames_analyzed_total";
    pub const FRAME_EXTRACTION_DURATION_SECONDS: &str = "frameqa_frame_extraction_duration_seconds";
    pub const INFERENCE_DURATION_SECONDS: &str = "frameqa_inference_duration_seconds";
}

/// Record a session start.
pub fn record_session_started() {
    counter!(names::SESSIONS_STARTED_TOTAL).increment(1);
    gauge!(names::SESSIONS_ACTIVE).increment(1.0);
}

/// Record a session end by outcome (`completed`, `cancelled`, `failed`, `disconnected`).
pub fn record_session_finished(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SESSIONS_FINISHED_TOTAL, &labels).increment(1);
    gauge!(names::SESSIONS_ACTIVE).decrement(1.0);
}

/// Record one analyzed frame.
pub fn record_frame_analyzed() {
    counter!(names::FRAMES_ANALYZED_TOTAL).increment(1);
}

/// Record frame extraction duration.
pub fn record_extraction_duration(duration_secs: f64) {
    histogram!(names::FRAME_EXTRACTION_DURATION_SECONDS).record(duration_secs);
}

/// Record inference exchange duration.
pub fn record_inference_duration(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    histogram!(names::INFERENCE_DURATION_SECONDS, &labels).record(duration_secs);
}
