//! Pipeline error types.

use std::fmt;
use thiserror::Error;

use lipsync_media::MediaError;
use lipsync_models::{PlanError, Stage};

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Position of a chunk within its run, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRef {
    /// Zero-based ordinal
    pub ordinal: usize,
    /// Number of chunks in the run
    pub total: usize,
}

impl ChunkRef {
    pub fn new(ordinal: usize, total: usize) -> Self {
        Self { ordinal, total }
    }
}

impl fmt::Display for ChunkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk {}/{}", self.ordinal + 1, self.total)
    }
}

fn at_chunk(chunk: &Option<ChunkRef>) -> String {
    match chunk {
        Some(chunk) => format!(" at {}", chunk),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot plan chunks: {0}")]
    Plan(#[from] PlanError),

    #[error("{stage} stage failed{}: {source}", at_chunk(.chunk))]
    Stage {
        stage: Stage,
        chunk: Option<ChunkRef>,
        source: MediaError,
    },

    #[error("Cleanup failed: {0}")]
    Cleanup(#[source] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Attribute a media failure to `stage`, optionally at a specific chunk.
    pub fn stage(stage: Stage, chunk: Option<ChunkRef>, source: MediaError) -> Self {
        Self::Stage {
            stage,
            chunk,
            source,
        }
    }

    /// Stage the failure happened in, if it came from one.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::Plan(_) => Some(Stage::Probe),
            PipelineError::Cleanup(_) => Some(Stage::Cleanup),
            PipelineError::Config(_) | PipelineError::Io(_) => None,
        }
    }

    /// Zero-based ordinal of the failing chunk, for per-chunk failures.
    pub fn chunk_ordinal(&self) -> Option<usize> {
        match self {
            PipelineError::Stage {
                chunk: Some(chunk), ..
            } => Some(chunk.ordinal),
            _ => None,
        }
    }

    /// Captured stderr of the external tool that failed, if any.
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            PipelineError::Stage { source, .. } | PipelineError::Cleanup(source) => source.stderr(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_stage_error_names_stage_and_chunk() {
        let err = PipelineError::stage(
            Stage::Process,
            Some(ChunkRef::new(1, 3)),
            MediaError::inference_failed("Inference exited with non-zero status", None, Some(1)),
        );

        let msg = err.to_string();
        assert!(msg.starts_with("process stage failed at chunk 2/3:"), "{}", msg);
        assert_eq!(err.failed_stage(), Some(Stage::Process));
        assert_eq!(err.chunk_ordinal(), Some(1));
    }

    #[test]
    fn test_stage_error_without_chunk() {
        let err = PipelineError::stage(
            Stage::Merge,
            None,
            MediaError::MissingOutput(PathBuf::from("out.mp4")),
        );
        assert_eq!(
            err.to_string(),
            "merge stage failed: Expected output was not produced: out.mp4"
        );
        assert_eq!(err.chunk_ordinal(), None);
    }

    #[test]
    fn test_tool_stderr_is_exposed() {
        let err = PipelineError::stage(
            Stage::Split,
            Some(ChunkRef::new(0, 1)),
            MediaError::ffmpeg_failed("boom", Some("Invalid data found".to_string()), Some(1)),
        );
        assert_eq!(err.tool_stderr(), Some("Invalid data found"));
    }
}
