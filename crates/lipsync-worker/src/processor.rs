//! Process stage: run lip-sync inference on every chunk, one at a time.

use std::path::Path;

use lipsync_media::{ensure_dir, LipSyncEngine};
use lipsync_models::{ProcessedChunk, Stage, VideoChunk};

use crate::error::{ChunkRef, PipelineError, PipelineResult};
use crate::intermediates::Intermediates;
use crate::logging::RunLogger;

/// Run inference on each chunk in order with the same audio track.
///
/// Chunks are processed strictly sequentially: the inference tool is
/// assumed to need exclusive use of the accelerator. The first failure
/// aborts the stage, so a partial set of outputs never reaches the merger.
pub async fn process_chunks(
    engine: &dyn LipSyncEngine,
    chunks: &[VideoChunk],
    audio: &Path,
    checkpoint: &Path,
    intermediates: &mut Intermediates,
    logger: &RunLogger,
) -> PipelineResult<Vec<ProcessedChunk>> {
    let logger = logger.for_stage(Stage::Process);
    logger.log_start(&format!(
        "lip-syncing {} chunks with {}",
        chunks.len(),
        checkpoint.display()
    ));

    let output_dir = intermediates.processed_dir().to_path_buf();
    ensure_dir(&output_dir)
        .await
        .map_err(|e| PipelineError::stage(Stage::Process, None, e))?;

    let total = chunks.len();
    let mut processed = Vec::with_capacity(total);
    for chunk in chunks {
        let output = ProcessedChunk::from_source(chunk, &output_dir);
        let position = ChunkRef::new(chunk.ordinal, total);
        logger.log_progress(&format!("processing {} ({} frames)", position, chunk.frames.len()));

        intermediates.track(&output.path);
        engine
            .sync(checkpoint, &chunk.path, audio, &output.path)
            .await
            .map_err(|e| PipelineError::stage(Stage::Process, Some(position), e))?;

        processed.push(output);
    }

    logger.log_completion(&format!("{} chunks processed", processed.len()));
    Ok(processed)
}
