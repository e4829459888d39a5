//! Video references and session keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Maximum video identifier length.
const MAX_VIDEO_ID_LENGTH: usize = 255;

/// Key identifying an analysis session in the session tracker.
///
/// Derived from the video identifier by dropping every `.`, so
/// `cat.mp4` and `catmp4` share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Derive the session key for a video identifier.
    pub fn for_video(video_id: &str) -> Self {
        Self(video_id.replace('.', ""))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an uploaded video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    /// File name with extension, as uploaded
    pub video_id: String,
    /// Location of the file in the video store
    pub path: PathBuf,
}

impl VideoRef {
    /// Resolve a video identifier inside the videos directory.
    pub fn resolve(videos_dir: impl AsRef<Path>, video_id: impl Into<String>) -> Self {
        let video_id = video_id.into();
        let path = videos_dir.as_ref().join(&video_id);
        Self { video_id, path }
    }

    /// Session key for this video.
    pub fn session_key(&self) -> SessionKey {
        SessionKey::for_video(&self.video_id)
    }

    /// File name without its extension, used to name the frame directory.
    pub fn stem(&self) -> &str {
        match self.video_id.rfind('.') {
            Some(idx) if idx > 0 => &self.video_id[..idx],
            _ => &self.video_id,
        }
    }
}

/// Validate a video identifier.
///
/// Valid format: a plain file name (no path separators, no `..`), made of
/// alphanumerics, `-`, `_`, `.` and spaces, at most 255 chars.
pub fn is_valid_video_id(id: &str) -> bool {
    if id.trim().is_empty() || id.len() > MAX_VIDEO_ID_LENGTH {
        return false;
    }
    if id.contains("..") || id.contains('/') || id.contains('\\') {
        return false;
    }
    id.chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.' || c == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_drops_dots() {
        assert_eq!(SessionKey::for_video("my.cat.mp4").as_str(), "mycatmp4");
        assert_eq!(
            SessionKey::for_video("cat.mp4"),
            SessionKey::for_video("cat.mp4")
        );
    }

    #[test]
    fn test_video_ref_resolve() {
        let video = VideoRef::resolve("public/videos", "cat.mp4");
        assert_eq!(video.path, PathBuf::from("public/videos/cat.mp4"));
        assert_eq!(video.stem(), "cat");
        assert_eq!(video.session_key().as_str(), "catmp4");
    }

    #[test]
    fn test_stem_without_extension() {
        assert_eq!(VideoRef::resolve("v", "clip").stem(), "clip");
        assert_eq!(VideoRef::resolve("v", ".hidden").stem(), ".hidden");
        assert_eq!(VideoRef::resolve("v", "a.b.mov").stem(), "a.b");
    }

    #[test]
    fn test_video_id_validation() {
        assert!(is_valid_video_id("cat.mp4"));
        assert!(is_valid_video_id("holiday clip_01-final.mov"));
        assert!(!is_valid_video_id(""));
        assert!(!is_valid_video_id("../etc/passwd"));
        assert!(!is_valid_video_id("path/to/file.mp4"));
        assert!(!is_valid_video_id("evil\\file.mp4"));
        assert!(!is_valid_video_id(&"a".repeat(300)));
    }
}
