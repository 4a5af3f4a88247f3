//! Stream-copy concatenation through the concat demuxer.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use lipsync_models::Manifest;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ensure_output_written;

/// Write a concat manifest listing `chunks` by absolute path, in order.
pub async fn write_manifest(manifest_path: &Path, chunks: &[PathBuf]) -> MediaResult<Manifest> {
    if chunks.is_empty() {
        return Err(MediaError::EmptyManifest);
    }

    let mut entries = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if !fs::try_exists(chunk).await? {
            return Err(MediaError::FileNotFound(chunk.clone()));
        }
        entries.push(fs::canonicalize(chunk).await?);
    }

    let manifest = Manifest::new(entries);
    fs::write(manifest_path, manifest.render()).await?;
    Ok(manifest)
}

/// Concatenate the files listed in `manifest_path` into `output` without
/// re-encoding. All inputs must share codec parameters.
pub async fn concat_stream_copy(
    runner: &FfmpegRunner,
    manifest_path: &Path,
    output: &Path,
) -> MediaResult<()> {
    info!(
        "Concatenating {} -> {}",
        manifest_path.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(manifest_path, output)
        .concat_demuxer()
        .codec_copy();

    runner.run(&cmd).await?;
    ensure_output_written(output).await
}
