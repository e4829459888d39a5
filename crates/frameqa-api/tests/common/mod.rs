//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use futures_util::stream;
use tempfile::TempDir;
use tower::ServiceExt;

use frameqa_api::{create_router, ApiConfig, AppState};
use frameqa_inference::{decode_exchange, ExchangeStream, InferenceResult, InferenceService};
use frameqa_media::{Frame, FrameSource, MediaResult};
use frameqa_pipeline::PipelineConfig;

/// Frame source with a fixed duration that writes placeholder frames.
pub struct StubFrames {
    pub duration: f64,
}

#[async_trait]
impl FrameSource for StubFrames {
    async fn duration(&self, _video_path: &Path) -> MediaResult<f64> {
        Ok(self.duration)
    }

    async fn prepare_output_dir(&self, images_root: &Path, stem: &str) -> MediaResult<PathBuf> {
        let dir = images_root.join(stem);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    async fn extract_frame(
        &self,
        _video_path: &Path,
        second: u32,
        output_dir: &Path,
    ) -> MediaResult<Frame> {
        let path = output_dir.join(format!("{}.png", second));
        tokio::fs::write(&path, b"png").await?;
        Ok(Frame {
            index: second,
            path,
        })
    }
}

/// Inference service answering every frame with the same text.
pub struct StubInference {
    pub answer: &'static str,
}

#[async_trait]
impl InferenceService for StubInference {
    async fn stream(&self, _image_path: &Path, _prompt: &str) -> InferenceResult<ExchangeStream> {
        let lines = vec![
            Ok::<_, std::io::Error>(
                format!("{{\"message\":{{\"content\":\"{}\"}},\"done\":false}}\n", self.answer)
                    .into_bytes(),
            ),
            Ok(b"{\"done\":true}\n".to_vec()),
        ];
        Ok(decode_exchange(stream::iter(lines)))
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn videos_dir(&self) -> PathBuf {
        self.dir.path().join("videos")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.path().join("images")
    }

    /// Place a (fake) video in the video store.
    pub fn add_video(&self, name: &str) {
        std::fs::write(self.videos_dir().join(name), b"video").unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Build the full router over stub backends and a temporary store.
pub fn build_test_app(duration: f64) -> TestApp {
    let dir = TempDir::new().unwrap();
    let videos = dir.path().join("videos");
    let images = dir.path().join("images");
    std::fs::create_dir_all(&videos).unwrap();
    std::fs::create_dir_all(&images).unwrap();

    let state = AppState::with_backends(
        ApiConfig::default(),
        PipelineConfig::default().with_dirs(videos, images),
        Arc::new(StubFrames { duration }),
        Arc::new(StubInference { answer: "A cat." }),
    );
    let router = create_router(state.clone(), None);

    TestApp { dir, state, router }
}

pub fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
