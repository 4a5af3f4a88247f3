//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while driving external media and inference tools.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Inference interpreter not found in PATH: {0}")]
    InterpreterNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Inference command failed: {message}")]
    InferenceFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Expected output was not produced: {0}")]
    MissingOutput(PathBuf),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    #[error("Concat manifest has no entries")]
    EmptyManifest,

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an inference failure error.
    pub fn inference_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::InferenceFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a timeout error for `tool`.
    pub fn timeout(tool: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            tool: tool.into(),
            secs,
        }
    }

    /// Captured stderr of the failing tool, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            MediaError::FfmpegFailed { stderr, .. }
            | MediaError::FfprobeFailed { stderr, .. }
            | MediaError::InferenceFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
