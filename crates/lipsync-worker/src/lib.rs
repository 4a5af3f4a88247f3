//! Chunked lip-sync pipeline.
//!
//! This crate provides:
//! - Command-line and environment configuration
//! - The split, process and merge stages
//! - The driver that sequences them and removes intermediates
//! - Structured run logging

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod intermediates;
pub mod logging;
pub mod merger;
pub mod processor;
pub mod splitter;

pub use cli::Cli;
pub use config::{PipelineConfig, ToolConfig};
pub use driver::{Pipeline, RunSummary, Tools};
pub use error::{ChunkRef, PipelineError, PipelineResult};
pub use intermediates::Intermediates;
pub use logging::RunLogger;
pub use merger::merge_chunks;
pub use processor::process_chunks;
pub use splitter::{split_video, SplitOutcome};
