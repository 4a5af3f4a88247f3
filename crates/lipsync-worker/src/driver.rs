//! Pipeline driver: split → process → merge → cleanup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use lipsync_media::{
    Concatenator, FfmpegRunner, FfmpegToolchain, FrameExtractor, InferenceRunner, LipSyncEngine,
    MediaProbe, Wav2LipEngine,
};
use lipsync_models::{ChunkPlan, RunId};

use crate::config::{PipelineConfig, ToolConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::intermediates::Intermediates;
use crate::logging::RunLogger;
use crate::merger::merge_chunks;
use crate::processor::process_chunks;
use crate::splitter::split_video;

/// External capabilities the pipeline runs against.
#[derive(Clone)]
pub struct Tools {
    pub probe: Arc<dyn MediaProbe>,
    pub extractor: Arc<dyn FrameExtractor>,
    pub engine: Arc<dyn LipSyncEngine>,
    pub concatenator: Arc<dyn Concatenator>,
}

impl Tools {
    /// FFmpeg for media work, the inference script for lip-sync.
    pub fn from_config(config: &ToolConfig) -> Self {
        let timeout = config.timeout_secs();
        let ffmpeg = Arc::new(FfmpegToolchain::new(
            FfmpegRunner::new().with_optional_timeout(timeout),
        ));
        let engine = Arc::new(Wav2LipEngine::new(
            InferenceRunner::new(config.python.clone(), &config.inference_script)
                .with_optional_timeout(timeout),
        ));

        Self {
            probe: ffmpeg.clone(),
            extractor: ffmpeg.clone(),
            engine,
            concatenator: ffmpeg,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub chunk_count: usize,
    pub total_frames: u64,
    pub frame_rate: f64,
    pub output: PathBuf,
    /// Intermediate files deleted at the end of the run
    pub files_removed: usize,
    pub elapsed: Duration,
}

/// Runs the three stages in sequence and removes intermediates afterwards.
pub struct Pipeline {
    config: PipelineConfig,
    tools: Tools,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, tools: Tools) -> Self {
        Self { config, tools }
    }

    /// Build a pipeline backed by the real external tools.
    pub fn from_config(config: PipelineConfig) -> Self {
        let tools = Tools::from_config(&config.tools);
        Self::new(config, tools)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one full run.
    pub async fn run(&self) -> PipelineResult<RunSummary> {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id);
        let span = logger.create_span();
        self.run_with_logger(run_id, logger).instrument(span).await
    }

    async fn run_with_logger(&self, run_id: RunId, logger: RunLogger) -> PipelineResult<RunSummary> {
        self.config.validate()?;

        let started = Instant::now();
        logger.log_start(&format!(
            "{} + {} -> {}",
            self.config.video.display(),
            self.config.audio.display(),
            self.config.output.display()
        ));

        let mut intermediates =
            Intermediates::new(self.config.chunk_dir(), self.config.processed_dir());
        let result = self.run_stages(&mut intermediates, &logger).await;

        let files_removed = if self.config.keep_intermediates {
            logger.log_progress(&format!(
                "keeping intermediates in {} and {}",
                intermediates.chunk_dir().display(),
                intermediates.processed_dir().display()
            ));
            0
        } else {
            match &result {
                Ok(_) => intermediates.cleanup().await.map_err(PipelineError::Cleanup)?,
                Err(err) => {
                    logger.log_error(&err.to_string());
                    if let Err(cleanup_err) = intermediates.cleanup().await {
                        logger.log_warning(&format!("cleanup after failure: {}", cleanup_err));
                    }
                    0
                }
            }
        };

        let plan = result?;
        let summary = RunSummary {
            run_id,
            chunk_count: plan.len(),
            total_frames: plan.total_frames,
            frame_rate: plan.frame_rate,
            output: self.config.output.clone(),
            files_removed,
            elapsed: started.elapsed(),
        };

        logger.log_completion(&format!(
            "{} chunks merged into {} in {:.1}s",
            summary.chunk_count,
            summary.output.display(),
            summary.elapsed.as_secs_f64()
        ));
        Ok(summary)
    }

    async fn run_stages(
        &self,
        intermediates: &mut Intermediates,
        logger: &RunLogger,
    ) -> PipelineResult<ChunkPlan> {
        let split = split_video(
            self.tools.probe.as_ref(),
            self.tools.extractor.as_ref(),
            &self.config.video,
            self.config.chunk_duration,
            intermediates,
            logger,
        )
        .await?;

        let processed = process_chunks(
            self.tools.engine.as_ref(),
            &split.chunks,
            &self.config.audio,
            &self.config.checkpoint_path,
            intermediates,
            logger,
        )
        .await?;

        merge_chunks(
            self.tools.concatenator.as_ref(),
            &processed,
            &self.config.manifest_path(),
            &self.config.output,
            logger,
        )
        .await?;

        Ok(split.plan)
    }
}
