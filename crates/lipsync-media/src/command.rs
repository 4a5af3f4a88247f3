//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use lipsync_models::FrameRange;

use crate::error::{MediaError, MediaResult};
use crate::progress::{parse_progress_line, FfmpegProgress};

/// Number of diagnostic lines kept from a failing tool's stderr.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add multiple input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Keep only the frames in `range`, selected by frame index.
    pub fn frame_select(self, range: FrameRange) -> Self {
        self.video_filter(format!(
            r"select=between(n\,{}\,{})",
            range.start,
            range.last_frame()
        ))
    }

    /// Re-sequence output timestamps with variable frame rate.
    pub fn variable_frame_rate(self) -> Self {
        self.output_arg("-vsync").output_arg("vfr")
    }

    /// Read the input as a concat demuxer manifest.
    pub fn concat_demuxer(self) -> Self {
        self.input_args(["-f", "concat", "-safe", "0"])
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Output path this command writes.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner with no timeout.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set an optional timeout.
    pub fn with_optional_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Per-invocation timeout, if any.
    pub fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("FFmpeg stderr was not captured", None, None))?;

        let mut current = FfmpegProgress::default();
        let stderr_task = collect_stderr_tail(stderr, move |line| {
            match parse_progress_line(line, &mut current) {
                Some(true) => {
                    progress_callback(current.clone());
                    true
                }
                Some(false) => true,
                None => false,
            }
        });

        let status = match wait_for_exit(&mut child, self.timeout_secs, "FFmpeg").await {
            Ok(status) => status,
            Err(e) => {
                stderr_task.abort();
                return Err(e);
            }
        };
        let tail = join_tail(stderr_task).await;

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                tail,
                status.code(),
            ))
        }
    }
}

/// Wait for a child process, killing it if `timeout_secs` elapses first.
pub(crate) async fn wait_for_exit(
    child: &mut Child,
    timeout_secs: Option<u64>,
    tool: &str,
) -> MediaResult<ExitStatus> {
    let Some(secs) = timeout_secs else {
        return Ok(child.wait().await?);
    };

    let waited = tokio::time::timeout(Duration::from_secs(secs), child.wait()).await;
    match waited {
        Ok(status) => Ok(status?),
        Err(_) => {
            warn!("{} timed out after {} seconds, killing process", tool, secs);
            let _ = child.kill().await;
            Err(MediaError::timeout(tool, secs))
        }
    }
}

/// Drain `reader` line by line, keeping the last lines `consume` rejects.
///
/// `consume` returns `true` for lines it handled itself (e.g. progress keys);
/// everything else is treated as a diagnostic and kept for error reporting.
pub(crate) fn collect_stderr_tail<R, F>(reader: R, mut consume: F) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
    F: FnMut(&str) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

        // Lossy decoding keeps the pipe drained past non-UTF-8 output
        while matches!(reader.read_until(b'\n', &mut buf).await, Ok(n) if n > 0) {
            let line = String::from_utf8_lossy(&buf).trim_end_matches(['\r', '\n']).to_string();
            buf.clear();
            if consume(&line) || line.trim().is_empty() {
                continue;
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }

        tail.into_iter().collect()
    })
}

/// Await a stderr collector and join its lines, `None` when nothing was kept.
pub(crate) async fn join_tail(task: JoinHandle<Vec<String>>) -> Option<String> {
    match task.await {
        Ok(lines) if !lines.is_empty() => Some(lines.join("\n")),
        _ => None,
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(args: &[String], needle: &str) -> usize {
        args.iter()
            .position(|a| a == needle)
            .unwrap_or_else(|| panic!("{} missing from {:?}", needle, args))
    }

    #[test]
    fn test_frame_select_command() {
        let cmd = FfmpegCommand::new("input.mp4", "temp_video_chunks/chunk_001.mp4")
            .frame_select(FrameRange::new(120, 240))
            .variable_frame_rate();

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&r"select=between(n\,120\,239)".to_string()));
        assert_eq!(args[position(&args, "-vsync") + 1], "vfr");
        assert!(position(&args, "-i") < position(&args, "-vf"));
        assert_eq!(args.last().unwrap(), "temp_video_chunks/chunk_001.mp4");
    }

    #[test]
    fn test_concat_args_precede_input() {
        let cmd = FfmpegCommand::new("temp_filelist.txt", "out.mp4")
            .concat_demuxer()
            .codec_copy();

        let args = cmd.build_args();
        let input = position(&args, "-i");
        assert!(position(&args, "-f") < input);
        assert_eq!(args[position(&args, "-f") + 1], "concat");
        assert_eq!(args[position(&args, "-safe") + 1], "0");
        assert_eq!(args[input + 1], "temp_filelist.txt");
        assert_eq!(args[position(&args, "-c") + 1], "copy");
        assert!(position(&args, "-c") > input);
    }

    #[test]
    fn test_log_level_override() {
        let args = FfmpegCommand::new("a.mp4", "b.mp4").log_level("warning").build_args();
        assert_eq!(args[position(&args, "-v") + 1], "warning");
    }

    #[tokio::test]
    async fn test_stderr_tail_keeps_only_diagnostics() {
        let input: &[u8] = b"frame=10\nprogress=continue\nfirst error\n\nsecond error\n";
        let task = collect_stderr_tail(input, |line| line.contains('='));

        let tail = join_tail(task).await;
        assert_eq!(tail.as_deref(), Some("first error\nsecond error"));
    }

    #[tokio::test]
    async fn test_stderr_tail_is_bounded() {
        let text: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        let task = collect_stderr_tail(std::io::Cursor::new(text.into_bytes()), |_| false);

        let lines = task.await.unwrap();
        assert_eq!(lines.len(), STDERR_TAIL_LINES);
        assert_eq!(lines.last().unwrap(), "line 49");
    }

    #[tokio::test]
    async fn test_stderr_tail_survives_invalid_utf8() {
        let input: &[u8] = b"bad byte \xff here\r\nlater error\n";
        let task = collect_stderr_tail(input, |_| false);

        let lines = task.await.unwrap();
        assert_eq!(lines, vec!["bad byte \u{FFFD} here", "later error"]);
    }
}
