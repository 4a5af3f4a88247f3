//! Merge stage: concatenate processed chunks through a manifest.

use std::path::{Path, PathBuf};

use lipsync_media::{write_manifest, Concatenator, MediaError};
use lipsync_models::{ProcessedChunk, Stage};

use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;

/// Write the manifest, stream-copy concatenate into `output`, remove the
/// manifest.
///
/// The manifest is removed whether or not concatenation succeeded; a
/// concatenation error is returned after removal.
pub async fn merge_chunks(
    concatenator: &dyn Concatenator,
    chunks: &[ProcessedChunk],
    manifest_path: &Path,
    output: &Path,
    logger: &RunLogger,
) -> PipelineResult<()> {
    let logger = logger.for_stage(Stage::Merge);
    logger.log_start(&format!("merging {} chunks into {}", chunks.len(), output.display()));

    debug_assert!(
        chunks.windows(2).all(|w| w[0].ordinal < w[1].ordinal),
        "processed chunks must arrive in ordinal order"
    );
    let paths: Vec<PathBuf> = chunks.iter().map(|c| c.path.clone()).collect();

    let manifest = write_manifest(manifest_path, &paths)
        .await
        .map_err(|e| PipelineError::stage(Stage::Merge, None, e))?;

    let result = concatenator.concat(manifest_path, output).await;

    if let Err(e) = tokio::fs::remove_file(manifest_path).await {
        logger.log_warning(&format!(
            "failed to remove manifest {}: {}",
            manifest_path.display(),
            e
        ));
        if result.is_ok() {
            return Err(PipelineError::stage(Stage::Merge, None, MediaError::from(e)));
        }
    }

    result.map_err(|e| PipelineError::stage(Stage::Merge, None, e))?;

    logger.log_completion(&format!(
        "{} chunks concatenated into {}",
        manifest.len(),
        output.display()
    ));
    Ok(())
}
