//! Structured run logging utilities.
//!
//! Provides consistent, structured logging for pipeline runs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

use lipsync_models::{RunId, Stage};

/// Run logger for structured logging with consistent formatting.
///
/// Every line carries the run ID and the stage that emitted it, so the
/// output of one run can be filtered out of interleaved logs.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    stage: &'static str,
}

impl RunLogger {
    /// Create a logger for the run as a whole.
    pub fn new(run_id: &RunId) -> Self {
        Self {
            run_id: run_id.to_string(),
            stage: "run",
        }
    }

    /// Derive a logger for one stage of the same run.
    pub fn for_stage(&self, stage: Stage) -> Self {
        Self {
            run_id: self.run_id.clone(),
            stage: stage.as_str(),
        }
    }

    /// Log the start of a stage.
    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            stage = self.stage,
            "Started: {}", message
        );
    }

    /// Log a progress update within a stage.
    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            stage = self.stage,
            "{}", message
        );
    }

    /// Log a warning within a stage.
    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            stage = self.stage,
            "Warning: {}", message
        );
    }

    /// Log an error within a stage.
    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            stage = self.stage,
            "Error: {}", message
        );
    }

    /// Log the completion of a stage.
    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            stage = self.stage,
            "Completed: {}", message
        );
    }

    /// Get the run ID.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the stage name.
    pub fn stage(&self) -> &str {
        self.stage
    }

    /// Create a tracing span for this run and stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "lipsync",
            run_id = %self.run_id,
            stage = self.stage
        )
    }
}
