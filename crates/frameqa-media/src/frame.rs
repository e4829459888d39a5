//! Keyframe extraction.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// A single frame extracted at a whole-second offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Second offset (1-indexed)
    pub index: u32,
    /// Extracted image location
    pub path: PathBuf,
}

/// Directory holding the frames of one video: `<images_root>/<stem>`.
pub fn frame_output_dir(images_root: impl AsRef<Path>, stem: &str) -> PathBuf {
    images_root.as_ref().join(stem)
}

/// Create the frame directory for a video if it does not exist yet.
pub async fn prepare_output_dir(images_root: impl AsRef<Path>, stem: &str) -> MediaResult<PathBuf> {
    let dir = frame_output_dir(images_root, stem);
    fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Extract the frame at `second` into `<output_dir>/<second>.png`.
pub async fn extract_frame(
    runner: &FfmpegRunner,
    video_path: impl AsRef<Path>,
    second: u32,
    output_dir: impl AsRef<Path>,
) -> MediaResult<Frame> {
    let video_path = video_path.as_ref();
    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let output_path = output_dir.as_ref().join(format!("{}.png", second));

    let cmd = FfmpegCommand::new(video_path, &output_path)
        .seek(f64::from(second))
        .single_frame()
        .log_level("error");

    runner.run(&cmd).await?;

    // ffmpeg exits 0 without writing anything when seeking past the last frame
    if !fs::try_exists(&output_path).await.unwrap_or(false) {
        return Err(MediaError::ffmpeg_failed(
            format!("No frame produced at {}s", second),
            None,
            Some(0),
        ));
    }

    debug!(
        video = %video_path.display(),
        second,
        frame = %output_path.display(),
        "Extracted keyframe"
    );

    Ok(Frame {
        index: second,
        path: output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_frame_output_dir() {
        assert_eq!(
            frame_output_dir("public/images", "cat"),
            PathBuf::from("public/images/cat")
        );
    }

    #[tokio::test]
    async fn test_prepare_output_dir_is_idempotent() {
        let root = TempDir::new().unwrap();
        let first = prepare_output_dir(root.path(), "cat").await.unwrap();
        let second = prepare_output_dir(root.path(), "cat").await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[tokio::test]
    async fn test_extract_frame_missing_video() {
        let root = TempDir::new().unwrap();
        let result = extract_frame(
            &FfmpegRunner::new(),
            root.path().join("missing.mp4"),
            1,
            root.path(),
        )
        .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
