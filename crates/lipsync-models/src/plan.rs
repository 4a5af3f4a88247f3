//! Chunk boundary planning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::FrameRange;

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Reasons a chunk plan cannot be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("Chunk duration must be a positive number of seconds, got {0}")]
    InvalidChunkDuration(f64),

    #[error("Frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),

    #[error("Video contains no frames")]
    EmptyVideo,

    #[error("Chunk duration of {duration}s at {frame_rate} fps is shorter than one frame")]
    ChunkTooShort { duration: f64, frame_rate: f64 },
}

/// Partition of `[0, total_frames)` into consecutive fixed-size windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPlan {
    /// Frames per second of the source video
    pub frame_rate: f64,
    /// Total number of frames in the source video
    pub total_frames: u64,
    /// Frames per chunk; the final chunk may be shorter
    pub chunk_frames: u64,
    /// Ordered windows, index == chunk ordinal
    pub ranges: Vec<FrameRange>,
}

impl ChunkPlan {
    /// Compute the plan for a video of `total_frames` at `frame_rate`.
    ///
    /// `chunk_frames = floor(chunk_duration * frame_rate)`.
    pub fn new(total_frames: u64, frame_rate: f64, chunk_duration: f64) -> PlanResult<Self> {
        if !chunk_duration.is_finite() || chunk_duration <= 0.0 {
            return Err(PlanError::InvalidChunkDuration(chunk_duration));
        }
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(PlanError::InvalidFrameRate(frame_rate));
        }
        if total_frames == 0 {
            return Err(PlanError::EmptyVideo);
        }

        let chunk_frames = (chunk_duration * frame_rate).floor() as u64;
        if chunk_frames == 0 {
            return Err(PlanError::ChunkTooShort {
                duration: chunk_duration,
                frame_rate,
            });
        }

        let ranges = (0..total_frames)
            .step_by(chunk_frames as usize)
            .map(|start| FrameRange::new(start, (start + chunk_frames).min(total_frames)))
            .collect();

        Ok(Self {
            frame_rate,
            total_frames,
            chunk_frames,
            ranges,
        })
    }

    /// Number of chunks in the plan.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Duration of the source video in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.total_frames as f64 / self.frame_rate
    }

    /// Iterate `(ordinal, range)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, FrameRange)> + '_ {
        self.ranges.iter().copied().enumerate()
    }
}
