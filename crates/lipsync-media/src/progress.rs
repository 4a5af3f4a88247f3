//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg's `-progress pipe:2` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Frames written so far
    pub frame: u64,
    /// Current encoding FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Percentage of `total_frames` written so far.
    pub fn percentage(&self, total_frames: u64) -> f64 {
        if total_frames == 0 {
            return 0.0;
        }
        ((self.frame as f64 / total_frames as f64) * 100.0).min(100.0)
    }
}

/// Fold one `key=value` line into `current`.
///
/// Returns `Some(true)` with a finished snapshot when the line closes a
/// progress block, `Some(false)` for any other progress key, and `None` when
/// the line is not progress output at all (i.e. a diagnostic message).
pub(crate) fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<bool> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        "out_time_ms" | "out_time_us" => {
            if let Ok(us) = value.parse::<i64>() {
                // FFmpeg reports both keys in microseconds
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return Some(true);
        }
        "bitrate" | "total_size" | "out_time" | "dup_frames" | "drop_frames" | "stream_0_0_q" => {}
        _ => return None,
    }

    Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            frame: 60,
            ..Default::default()
        };

        assert!((progress.percentage(120) - 50.0).abs() < 0.01);
        assert!((progress.percentage(30) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(0), 0.0);
    }

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert_eq!(parse_progress_line("frame=48", &mut progress), Some(false));
        assert_eq!(progress.frame, 48);

        parse_progress_line("out_time_us=2000000", &mut progress);
        assert_eq!(progress.out_time_ms, 2000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        parse_progress_line("speed=N/A", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        assert_eq!(parse_progress_line("progress=end", &mut progress), Some(true));
        assert!(progress.is_complete);
    }

    #[test]
    fn test_diagnostics_are_not_progress() {
        let mut progress = FfmpegProgress::default();
        assert_eq!(
            parse_progress_line("input.mp4: No such file or directory", &mut progress),
            None
        );
        assert_eq!(
            parse_progress_line("[concat @ 0x55] Impossible to open 'chunk_001.mp4'", &mut progress),
            None
        );
    }
}
