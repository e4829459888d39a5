#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for frame extraction.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Duration probing via FFprobe
//! - Single-frame extraction at a second offset
//! - The `FrameSource` seam used by the analysis pipeline

pub mod command;
pub mod error;
pub mod frame;
pub mod probe;
pub mod source;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frame::{extract_frame, frame_output_dir, prepare_output_dir, Frame};
pub use probe::{parse_duration, probe_duration};
pub use source::{FfmpegFrameSource, FrameSource};
