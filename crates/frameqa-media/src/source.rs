//! Frame source abstraction used by the analysis pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::frame::{self, Frame};
use crate::probe;

/// Access to a video's timeline.
///
/// Both operations may block for as long as the underlying tool runs.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Total duration of the video in seconds.
    async fn duration(&self, video_path: &Path) -> MediaResult<f64>;

    /// Create (if needed) the directory frames of `stem` are written to.
    async fn prepare_output_dir(&self, images_root: &Path, stem: &str) -> MediaResult<PathBuf>;

    /// Extract the frame at `second` into `output_dir`.
    async fn extract_frame(
        &self,
        video_path: &Path,
        second: u32,
        output_dir: &Path,
    ) -> MediaResult<Frame>;
}

/// `FrameSource` backed by the `ffmpeg`/`ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameSource {
    runner: FfmpegRunner,
}

impl FfmpegFrameSource {
    /// Create a new source with no extraction timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill extractions that run longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// Create from environment variables (`FFMPEG_TIMEOUT_SECS`).
    pub fn from_env() -> Self {
        match std::env::var("FFMPEG_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            Some(secs) => Self::new().with_timeout(secs),
            None => Self::new(),
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn duration(&self, video_path: &Path) -> MediaResult<f64> {
        probe::probe_duration(video_path).await
    }

    async fn prepare_output_dir(&self, images_root: &Path, stem: &str) -> MediaResult<PathBuf> {
        frame::prepare_output_dir(images_root, stem).await
    }

    async fn extract_frame(
        &self,
        video_path: &Path,
        second: u32,
        output_dir: &Path,
    ) -> MediaResult<Frame> {
        frame::extract_frame(&self.runner, video_path, second, output_dir).await
    }
}
