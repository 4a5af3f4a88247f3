//! Filesystem helpers for intermediate chunk files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Create `dir` and any missing parents.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    fs::create_dir_all(dir.as_ref()).await?;
    Ok(())
}

/// Fail with `MissingOutput` unless `path` exists and is non-empty.
///
/// External tools occasionally exit zero without writing anything; this is
/// how the pipeline notices.
pub async fn ensure_output_written(path: &Path) -> MediaResult<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        Ok(_) => Err(MediaError::MissingOutput(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(MediaError::MissingOutput(path.to_path_buf())),
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Remove every file in `paths`. Files that are already gone are skipped.
///
/// A failed removal does not stop the others; the first error is returned
/// once every path has been attempted. Otherwise returns the number of files
/// actually removed.
pub async fn remove_files<'a, I>(paths: I) -> MediaResult<usize>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut removed = 0;
    let mut first_error = None;
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Already removed: {}", path.display());
            }
            Err(e) => {
                tracing::error!("Failed to remove {}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(MediaError::from(e)),
        None => Ok(removed),
    }
}

/// Remove `dir`, which must be empty. A missing directory is not an error.
///
/// A directory that still holds entries yields `DirectoryNotEmpty` and is
/// left in place, so untracked files are never deleted silently.
pub async fn remove_empty_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(MediaError::from(e)),
    };

    if entries.next_entry().await?.is_some() {
        return Err(MediaError::DirectoryNotEmpty(dir.to_path_buf()));
    }

    fs::remove_dir(dir).await?;
    Ok(())
}
