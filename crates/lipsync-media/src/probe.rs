//! FFprobe video information.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use crate::command::{check_ffprobe, collect_stderr_tail, join_tail, wait_for_exit};
use crate::error::{MediaError, MediaResult};

/// Stream facts the pipeline needs to plan chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Frame rate (fps)
    pub fps: f64,
    /// Total number of video frames
    pub total_frames: u64,
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Video codec
    pub codec: String,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Probe a video file for frame rate and frame count.
///
/// With `timeout_secs` set, ffprobe is killed once it runs longer than that.
pub async fn probe_video(path: impl AsRef<Path>, timeout_secs: Option<u64>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let info = run_probe("ffprobe", path, timeout_secs).await?;
    debug!(
        path = %path.display(),
        fps = info.fps,
        total_frames = info.total_frames,
        "Probed video"
    );
    Ok(info)
}

/// Run `program` as ffprobe against `path` and parse its JSON report.
pub(crate) async fn run_probe(
    program: impl AsRef<OsStr>,
    path: &Path,
    timeout_secs: Option<u64>,
) -> MediaResult<VideoInfo> {
    let mut child = Command::new(program)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let (Some(mut stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe output was not captured".to_string(),
            stderr: None,
        });
    };

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = collect_stderr_tail(stderr, |_| false);

    let status = match wait_for_exit(&mut child, timeout_secs, "FFprobe").await {
        Ok(status) => status,
        Err(e) => {
            stdout_task.abort();
            stderr_task.abort();
            return Err(e);
        }
    };
    let tail = join_tail(stderr_task).await;

    if !status.success() {
        stdout_task.abort();
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed on {}", path.display()),
            stderr: tail,
        });
    }

    let stdout = stdout_task
        .await
        .map_err(|e| MediaError::FfprobeFailed {
            message: format!("FFprobe output reader failed: {}", e),
            stderr: tail,
        })??;

    parse_probe_output(&stdout)
}

/// Turn raw `ffprobe -print_format json` output into `VideoInfo`.
fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| MediaError::InvalidVideo("Video stream has no frame rate".to_string()))?;

    let duration = video_stream
        .duration
        .as_deref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    // Containers without a frame count fall back to duration * fps
    let total_frames = video_stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| (duration * fps).round() as u64);

    if total_frames == 0 {
        return Err(MediaError::InvalidVideo(
            "Unable to determine frame count".to_string(),
        ));
    }

    Ok(VideoInfo {
        fps,
        total_frames,
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        codec: video_stream.codec_name.clone().unwrap_or_default(),
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97"). `0/0` yields `None`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    let fps = if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        s.parse().ok()?
    };

    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("24/1").unwrap() - 24.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("garbage"), None);
    }

    #[test]
    fn test_parse_probe_output_uses_nb_frames() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1280, "height": 720,
                 "avg_frame_rate": "24/1", "r_frame_rate": "24/1", "nb_frames": "288",
                 "duration": "12.000000"}
            ],
            "format": {"duration": "12.021000"}
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.total_frames, 288);
        assert!((info.fps - 24.0).abs() < 1e-9);
        assert_eq!(info.codec, "h264");
        assert_eq!((info.width, info.height), (1280, 720));
    }

    #[test]
    fn test_parse_probe_output_falls_back_to_duration() {
        let json = br#"{
            "streams": [{"codec_type": "video", "avg_frame_rate": "0/0", "r_frame_rate": "25/1"}],
            "format": {"duration": "4.000000"}
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert!((info.fps - 25.0).abs() < 1e-9);
        assert_eq!(info.total_frames, 100);
    }

    #[test]
    fn test_parse_probe_output_without_video_stream() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = probe_video("/nonexistent/video.mp4", None).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[cfg(unix)]
    async fn fake_ffprobe(dir: &Path, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("ffprobe");
        tokio::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).await.unwrap();
        tokio::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .await
            .unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_ffprobe_is_killed_after_timeout() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = fake_ffprobe(dir.path(), "exec sleep 30").await;

        let started = std::time::Instant::now();
        let result = run_probe(&program, Path::new("input.mp4"), Some(1)).await;

        assert!(matches!(result, Err(MediaError::Timeout { secs: 1, .. })));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ffprobe_report_is_parsed() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = r#"{"streams":[{"codec_type":"video","avg_frame_rate":"24/1","nb_frames":"288"}],"format":{}}"#;
        let program = fake_ffprobe(dir.path(), &format!("echo '{}'", report)).await;

        let info = run_probe(&program, Path::new("input.mp4"), Some(5)).await.unwrap();
        assert_eq!(info.total_frames, 288);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ffprobe_failure_keeps_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = fake_ffprobe(dir.path(), "echo 'moov atom not found' >&2; exit 1").await;

        let err = run_probe(&program, Path::new("input.mp4"), None).await.unwrap_err();
        assert!(matches!(err, MediaError::FfprobeFailed { .. }));
        assert_eq!(err.stderr(), Some("moov atom not found"));
    }
}
