//! FFmpeg concat demuxer manifest.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ordered list of files for the concat demuxer.
///
/// Order is load-bearing: FFmpeg concatenates strictly in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<PathBuf>,
}

impl Manifest {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `file '<path>'` lines, one per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("file '");
            out.push_str(&escape_path(&entry.to_string_lossy()));
            out.push_str("'\n");
        }
        out
    }
}

/// Quote a path for the concat demuxer: `'` becomes `'\''`.
fn escape_path(path: &str) -> String {
    path.replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_one_line_per_entry_in_order() {
        let manifest = Manifest::new(vec![
            PathBuf::from("/work/processed_chunks/chunk_000.mp4"),
            PathBuf::from("/work/processed_chunks/chunk_001.mp4"),
            PathBuf::from("/work/processed_chunks/chunk_002.mp4"),
        ]);

        let rendered = manifest.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "file '/work/processed_chunks/chunk_000.mp4'",
                "file '/work/processed_chunks/chunk_001.mp4'",
                "file '/work/processed_chunks/chunk_002.mp4'",
            ]
        );
    }

    #[test]
    fn test_render_escapes_single_quotes() {
        let manifest = Manifest::new(vec![PathBuf::from("/videos/it's here/chunk_000.mp4")]);
        assert_eq!(
            manifest.render(),
            "file '/videos/it'\\''s here/chunk_000.mp4'\n"
        );
    }

    #[test]
    fn test_empty_manifest_renders_nothing() {
        assert!(Manifest::default().render().is_empty());
    }
}
