//! Capability interfaces for the external tools the pipeline drives.
//!
//! Each trait wraps one black-box collaborator and reports its outcome as a
//! `MediaResult`. The pipeline only talks to these traits, which keeps the
//! stages testable without FFmpeg or a GPU.

use std::path::Path;

use async_trait::async_trait;
use lipsync_models::FrameRange;

use crate::command::FfmpegRunner;
use crate::concat::concat_stream_copy;
use crate::error::MediaResult;
use crate::extract::extract_frame_range;
use crate::inference::{InferenceCommand, InferenceRunner};
use crate::probe::{probe_video, VideoInfo};

/// Reads frame rate and frame count from a video.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, video: &Path) -> MediaResult<VideoInfo>;
}

/// Writes the frames of `range` from `video` into a standalone file.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract(&self, video: &Path, range: FrameRange, output: &Path) -> MediaResult<()>;
}

/// Produces a lip-synced video from a face video and an audio track.
#[async_trait]
pub trait LipSyncEngine: Send + Sync {
    async fn sync(
        &self,
        checkpoint: &Path,
        face: &Path,
        audio: &Path,
        output: &Path,
    ) -> MediaResult<()>;
}

/// Concatenates the files named in a concat manifest without re-encoding.
#[async_trait]
pub trait Concatenator: Send + Sync {
    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()>;
}

/// FFmpeg/FFprobe backed probe, extraction and concatenation.
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolchain {
    runner: FfmpegRunner,
}

impl FfmpegToolchain {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MediaProbe for FfmpegToolchain {
    async fn probe(&self, video: &Path) -> MediaResult<VideoInfo> {
        probe_video(video, self.runner.timeout_secs()).await
    }
}

#[async_trait]
impl FrameExtractor for FfmpegToolchain {
    async fn extract(&self, video: &Path, range: FrameRange, output: &Path) -> MediaResult<()> {
        extract_frame_range(&self.runner, video, output, range).await
    }
}

#[async_trait]
impl Concatenator for FfmpegToolchain {
    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        concat_stream_copy(&self.runner, manifest, output).await
    }
}

/// Wav2Lip's `inference.py`, launched as a subprocess.
#[derive(Debug, Clone, Default)]
pub struct Wav2LipEngine {
    runner: InferenceRunner,
}

impl Wav2LipEngine {
    pub fn new(runner: InferenceRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl LipSyncEngine for Wav2LipEngine {
    async fn sync(
        &self,
        checkpoint: &Path,
        face: &Path,
        audio: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = InferenceCommand::new(checkpoint, face, audio, output);
        self.runner.run(&cmd).await
    }
}
