//! Tracking and removal of intermediate chunk files.

use std::path::{Path, PathBuf};

use lipsync_media::{remove_empty_dir, remove_files, MediaResult};

/// Files and directories a run creates and must remove before it ends.
///
/// Paths are tracked before the tool that writes them is invoked, so a
/// partially written output is still cleaned up after a failure.
#[derive(Debug, Clone)]
pub struct Intermediates {
    chunk_dir: PathBuf,
    processed_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl Intermediates {
    pub fn new(chunk_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            chunk_dir: chunk_dir.into(),
            processed_dir: processed_dir.into(),
            files: Vec::new(),
        }
    }

    pub fn chunk_dir(&self) -> &Path {
        &self.chunk_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Register a file for removal at cleanup.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Delete every tracked file, then both directories.
    ///
    /// Every removal is attempted even if an earlier one fails; the first
    /// error is returned. Returns the number of files removed.
    pub async fn cleanup(&mut self) -> MediaResult<usize> {
        let files_result = remove_files(&self.files).await;
        self.files.clear();

        let chunk_result = remove_empty_dir(&self.chunk_dir).await;
        let processed_result = remove_empty_dir(&self.processed_dir).await;
        let removed = files_result?;
        chunk_result?;
        processed_result?;

        Ok(removed)
    }
}
