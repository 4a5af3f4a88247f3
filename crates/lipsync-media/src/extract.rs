//! Frame-range extraction.

use std::path::Path;
use tracing::{debug, info};

use lipsync_models::FrameRange;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::fs_utils::ensure_output_written;

/// Extract exactly the frames in `range` from `input` into `output`.
///
/// Frames are selected by index rather than timestamp and re-sequenced with
/// variable frame-rate timestamps, so every source frame lands in exactly one
/// chunk regardless of keyframe placement.
pub async fn extract_frame_range(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    range: FrameRange,
) -> MediaResult<()> {
    info!(
        "Extracting frames {}: {} -> {}",
        range,
        input.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .frame_select(range)
        .variable_frame_rate();

    let expected = range.len();
    runner
        .run_with_progress(&cmd, move |progress| {
            debug!(
                frame = progress.frame,
                percent = %format!("{:.0}", progress.percentage(expected)),
                "Extraction progress"
            );
        })
        .await?;

    ensure_output_written(output).await
}
