//! Analysis handlers: start a streamed analysis, stop a running one.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use frameqa_models::{AnalyzeRequest, SessionKey, StopRequest};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::sse;
use crate::state::AppState;

/// Start a frame-by-frame analysis and stream its events.
///
/// Body problems are rejected with 400 before the stream opens; everything
/// after that is reported in-stream.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    info!(video_id = %request.video_id, "Analysis requested");

    let (mut writer, body) = sse::channel();
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let outcome = orchestrator.run(&request, &mut writer).await;
        debug!(video_id = %request.video_id, outcome = ?outcome, "Analysis stream closed");
    });

    Ok(sse::response(body))
}

/// Stop the analysis running for a video.
///
/// Always answers 204; stopping an unknown or finished session is a no-op.
pub async fn stop(
    State(state): State<AppState>,
    payload: Result<Json<StopRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let key = SessionKey::for_video(&request.video_id);
    let matched = state.tracker.stop(&key);
    metrics::record_stop_request(matched);

    if matched {
        info!(session_key = %key, "Stop requested");
    } else {
        debug!(session_key = %key, "Stop requested for unknown session");
    }

    Ok(StatusCode::NO_CONTENT)
}
