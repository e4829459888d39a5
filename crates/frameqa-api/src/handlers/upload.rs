//! Video upload handler.

use std::path::Path;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use frameqa_models::is_valid_video_id;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the video.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub video_id: String,
}

/// Store an uploaded video under its original file name.
///
/// The file name becomes the video identifier used by `/api/analyze`.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("Uploaded file has no name"))?;
        if !is_valid_video_id(&file_name) {
            warn!(file_name = %file_name, "Rejected upload with unsafe file name");
            return Err(ApiError::bad_request(format!("Invalid file name: {}", file_name)));
        }

        let videos_dir = &state.pipeline().videos_dir;
        tokio::fs::create_dir_all(videos_dir).await?;
        let path = videos_dir.join(&file_name);

        let written = match write_field(&mut field, &path).await {
            Ok(written) => written,
            Err(e) => {
                // A partial file would later fail as a corrupt video.
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    warn!(error = %remove_err, path = %path.display(), "Failed to remove partial upload");
                }
                warn!(video_id = %file_name, error = %e, "Upload aborted");
                return Err(e);
            }
        };

        metrics::record_upload(written);
        info!(video_id = %file_name, bytes = written, "Video uploaded");

        return Ok(Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            video_id: file_name,
        }));
    }

    Err(ApiError::bad_request(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

/// Stream one multipart field to `path`, returning the bytes written.
async fn write_field(field: &mut Field<'_>, path: &Path) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
