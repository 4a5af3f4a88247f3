//! Chunk records passed between pipeline stages.
//!
//! Ordering is carried by the `ordinal` field. Stages hand each other
//! `Vec`s already sorted by ordinal, so nothing ever re-derives order from a
//! directory listing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extension used for every chunk file.
pub const CHUNK_EXTENSION: &str = "mp4";

/// Minimum zero-padding width for chunk ordinals in file names.
const MIN_ORDINAL_WIDTH: usize = 3;

/// Half-open range of frame indices `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u64,
    pub end: u64,
}

impl FrameRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start < end, "frame range must not be empty");
        Self { start, end }
    }

    /// Number of frames in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Inclusive index of the last frame, as used by FFmpeg's `between()`.
    pub fn last_frame(&self) -> u64 {
        self.end - 1
    }

    pub fn contains(&self, frame: u64) -> bool {
        frame >= self.start && frame < self.end
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// File name for the chunk at `ordinal` out of `total` chunks.
///
/// Ordinals are zero-padded to at least three digits, wider when `total`
/// needs it, so that lexicographic order always equals numeric order.
pub fn chunk_file_name(ordinal: usize, total: usize) -> String {
    let width = total.to_string().len().max(MIN_ORDINAL_WIDTH);
    format!("chunk_{:0width$}.{}", ordinal, CHUNK_EXTENSION, width = width)
}

/// A contiguous frame range of the source video materialized as its own file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoChunk {
    /// Zero-based position in the split
    pub ordinal: usize,
    /// Frames of the source video contained in this chunk
    pub frames: FrameRange,
    /// Location of the extracted chunk file
    pub path: PathBuf,
}

impl VideoChunk {
    pub fn new(ordinal: usize, frames: FrameRange, path: impl Into<PathBuf>) -> Self {
        Self {
            ordinal,
            frames,
            path: path.into(),
        }
    }

    /// Base name of the chunk file, shared with its processed counterpart.
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }

    /// Path of the processed counterpart of this chunk inside `dir`.
    pub fn processed_path(&self, dir: &Path) -> PathBuf {
        match self.file_name() {
            Some(name) => dir.join(name),
            None => dir.join(format!("chunk_{}.{}", self.ordinal, CHUNK_EXTENSION)),
        }
    }
}

/// Lip-sync output for exactly one `VideoChunk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedChunk {
    /// Ordinal inherited from the source chunk
    pub ordinal: usize,
    /// Location of the processed file
    pub path: PathBuf,
}

impl ProcessedChunk {
    pub fn from_source(source: &VideoChunk, output_dir: &Path) -> Self {
        Self {
            ordinal: source.ordinal,
            path: source.processed_path(output_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_range_len_and_last_frame() {
        let range = FrameRange::new(120, 240);
        assert_eq!(range.len(), 120);
        assert_eq!(range.last_frame(), 239);
        assert!(range.contains(120));
        assert!(!range.contains(240));
        assert_eq!(range.to_string(), "[120, 240)");
    }

    #[test]
    fn test_chunk_file_names_sort_numerically() {
        let total = 12;
        let names: Vec<String> = (0..total).map(|i| chunk_file_name(i, total)).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "chunk_000.mp4");
        assert_eq!(names[11], "chunk_011.mp4");
    }

    #[test]
    fn test_chunk_file_name_widens_for_large_counts() {
        assert_eq!(chunk_file_name(7, 12_000), "chunk_00007.mp4");

        let names: Vec<String> = (0..1_500).map(|i| chunk_file_name(i, 1_500)).collect();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_processed_chunk_keeps_basename_and_ordinal() {
        let chunk = VideoChunk::new(
            2,
            FrameRange::new(240, 288),
            "temp_video_chunks/chunk_002.mp4",
        );
        let processed = ProcessedChunk::from_source(&chunk, Path::new("processed_chunks"));

        assert_eq!(processed.ordinal, 2);
        assert_eq!(processed.path, PathBuf::from("processed_chunks/chunk_002.mp4"));
    }
}
