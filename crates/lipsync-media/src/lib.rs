//! FFmpeg and inference CLI wrappers for the chunked lip-sync pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe frame rate / frame count probing
//! - Frame-index chunk extraction and stream-copy concatenation
//! - The lip-sync inference subprocess contract
//! - Capability traits the pipeline is written against

pub mod command;
pub mod concat;
pub mod core;
pub mod error;
pub mod extract;
pub mod fs_utils;
pub mod inference;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_stream_copy, write_manifest};
pub use crate::core::{Concatenator, FfmpegToolchain, FrameExtractor, LipSyncEngine, MediaProbe, Wav2LipEngine};
pub use error::{MediaError, MediaResult};
pub use extract::extract_frame_range;
pub use fs_utils::{ensure_dir, ensure_output_written, remove_empty_dir, remove_files};
pub use inference::{InferenceCommand, InferenceRunner};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
