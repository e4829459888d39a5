//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "frameqa_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "frameqa_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "frameqa_http_requests_in_flight";

    // Event stream metrics
    pub const STREAM_EVENTS_SENT_TOTAL: &str = "frameqa_stream_events_sent_total";
    pub const STOP_REQUESTS_TOTAL: &str = "frameqa_stop_requests_total";

    // Upload metrics
    pub const UPLOADS_TOTAL: &str = "frameqa_uploads_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "frameqa_upload_bytes_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one event written to an analysis stream.
pub fn record_event_sent(event_type: &str) {
    let labels = [("type", event_type.to_string())];
    counter!(names::STREAM_EVENTS_SENT_TOTAL, &labels).increment(1);
}

/// Record a stop request and whether it matched a session.
pub fn record_stop_request(matched: bool) {
    let labels = [("matched", matched.to_string())];
    counter!(names::STOP_REQUESTS_TOTAL, &labels).increment(1);
}

/// Record a stored upload.
pub fn record_upload(bytes: u64) {
    counter!(names::UPLOADS_TOTAL).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}

fn frame_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^/images/.+$").expect("static pattern"))
}

/// Sanitize path for metrics labels (collapse per-video frame paths).
fn sanitize_path(path: &str) -> String {
    frame_pattern().replace(path, "/images/:frame").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    // For event streams this measures time to first byte, not stream length.
    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
