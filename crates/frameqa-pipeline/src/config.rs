//! Pipeline configuration.

use std::path::{Component, Path, PathBuf};

/// Where videos are read from and frames are written to.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding uploaded videos
    pub videos_dir: PathBuf,
    /// Root directory for extracted frames
    pub images_dir: PathBuf,
    /// URL path `images_dir` is served under
    pub images_url_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from("public/videos"),
            images_dir: PathBuf::from("public/images"),
            images_url_prefix: "/images".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            videos_dir: std::env::var("VIDEOS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.videos_dir),
            images_dir: std::env::var("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            images_url_prefix: defaults.images_url_prefix,
        }
    }

    /// Set both storage directories.
    pub fn with_dirs(mut self, videos_dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        self.videos_dir = videos_dir.into();
        self.images_dir = images_dir.into();
        self
    }

    /// Client-facing location of an extracted frame.
    ///
    /// Frames under `images_dir` map to their served URL path; anything else
    /// is reported as a filesystem path.
    pub fn frame_url(&self, frame_path: &Path) -> String {
        match frame_path.strip_prefix(&self.images_dir) {
            Ok(relative) => {
                let segments: Vec<String> = relative
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect();
                format!(
                    "{}/{}",
                    self.images_url_prefix.trim_end_matches('/'),
                    segments.join("/")
                )
            }
            Err(_) => frame_path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_url_under_images_dir() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.frame_url(Path::new("public/images/cat/3.png")),
            "/images/cat/3.png"
        );
    }

    #[test]
    fn test_frame_url_outside_images_dir() {
        let config = PipelineConfig::default().with_dirs("/data/videos", "/data/images");
        assert_eq!(config.frame_url(Path::new("/tmp/cat/1.png")), "/tmp/cat/1.png");
    }
}
