//! FFprobe duration lookup.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a video file for its duration in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe could not read {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let duration = parse_duration(&output.stdout)?;
    debug!(path = %path.display(), duration, "Probed video duration");
    Ok(duration)
}

/// Extract `format.duration` from FFprobe JSON output.
pub fn parse_duration(stdout: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .ok_or_else(|| MediaError::invalid_video("No parseable duration"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let json = br#"{"format":{"filename":"cat.mp4","duration":"3.700000"}}"#;
        assert!((parse_duration(json).unwrap() - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_missing() {
        assert!(matches!(
            parse_duration(br#"{"format":{}}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(
            parse_duration(br#"{}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(
            parse_duration(br#"{"format":{"duration":"N/A"}}"#),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[test]
    fn test_parse_duration_garbage() {
        assert!(matches!(
            parse_duration(b"not json"),
            Err(MediaError::JsonParse(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = probe_duration("/definitely/not/here.mp4").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
