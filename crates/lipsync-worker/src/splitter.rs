//! Split stage: probe the source and extract one file per chunk.

use std::path::Path;

use lipsync_media::{ensure_dir, FrameExtractor, MediaProbe};
use lipsync_models::{chunk_file_name, ChunkPlan, Stage, VideoChunk};

use crate::error::{ChunkRef, PipelineError, PipelineResult};
use crate::intermediates::Intermediates;
use crate::logging::RunLogger;

/// Result of the split stage.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub plan: ChunkPlan,
    /// Chunks in ascending ordinal order
    pub chunks: Vec<VideoChunk>,
}

/// Probe `video`, plan chunks of `chunk_duration` seconds and extract each
/// one into the chunk directory of `intermediates`.
pub async fn split_video(
    probe: &dyn MediaProbe,
    extractor: &dyn FrameExtractor,
    video: &Path,
    chunk_duration: f64,
    intermediates: &mut Intermediates,
    logger: &RunLogger,
) -> PipelineResult<SplitOutcome> {
    let logger = logger.for_stage(Stage::Split);
    logger.log_start(&format!(
        "splitting {} into {}s chunks",
        video.display(),
        chunk_duration
    ));

    let info = probe
        .probe(video)
        .await
        .map_err(|e| PipelineError::stage(Stage::Probe, None, e))?;

    let plan = ChunkPlan::new(info.total_frames, info.fps, chunk_duration)?;
    logger.log_progress(&format!(
        "{} frames at {:.3} fps -> {} chunks of up to {} frames",
        plan.total_frames,
        plan.frame_rate,
        plan.len(),
        plan.chunk_frames
    ));

    let chunk_dir = intermediates.chunk_dir().to_path_buf();
    ensure_dir(&chunk_dir)
        .await
        .map_err(|e| PipelineError::stage(Stage::Split, None, e))?;

    let total = plan.len();
    let mut chunks = Vec::with_capacity(total);
    for (ordinal, range) in plan.iter() {
        let path = chunk_dir.join(chunk_file_name(ordinal, total));
        intermediates.track(&path);

        extractor
            .extract(video, range, &path)
            .await
            .map_err(|e| PipelineError::stage(Stage::Split, Some(ChunkRef::new(ordinal, total)), e))?;

        tracing::debug!(chunk = ordinal, frames = %range, path = %path.display(), "Chunk extracted");
        chunks.push(VideoChunk::new(ordinal, range, path));
    }

    logger.log_completion(&format!("{} chunks written to {}", total, chunk_dir.display()));
    Ok(SplitOutcome { plan, chunks })
}
