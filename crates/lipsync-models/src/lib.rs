//! Shared data models for the chunked lip-sync pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Run identifiers used to correlate log output
//! - Frame ranges and the chunk plan computed from a probed video
//! - Source and processed chunk records with explicit ordinals
//! - The concat manifest consumed by FFmpeg

pub mod chunk;
pub mod manifest;
pub mod plan;
pub mod run;

// Re-export common types
pub use chunk::{chunk_file_name, FrameRange, ProcessedChunk, VideoChunk};
pub use manifest::Manifest;
pub use plan::{ChunkPlan, PlanError, PlanResult};
pub use run::{RunId, Stage};
