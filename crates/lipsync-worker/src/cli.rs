//! Command-line arguments for the `lipsync` binary.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{DEFAULT_CHECKPOINT, DEFAULT_CHUNK_DURATION};

#[derive(Parser, Debug, Clone)]
#[command(name = "lipsync")]
#[command(about = "Run lip-sync inference over a video in fixed-duration chunks", long_about = None)]
pub struct Cli {
    /// Path to the input video
    #[arg(long)]
    pub video: PathBuf,

    /// Path to the input audio
    #[arg(long)]
    pub audio: PathBuf,

    /// Path to save the final output video
    #[arg(long)]
    pub output: PathBuf,

    /// Path to the lip-sync model checkpoint
    #[arg(long = "checkpoint_path", visible_alias = "checkpoint-path", default_value = DEFAULT_CHECKPOINT)]
    pub checkpoint_path: PathBuf,

    /// Duration of each video chunk in seconds
    #[arg(long = "chunk_duration", visible_alias = "chunk-duration", default_value_t = DEFAULT_CHUNK_DURATION)]
    pub chunk_duration: f64,

    /// Directory holding the temporary chunk directories and manifest
    #[arg(long = "work_dir", visible_alias = "work-dir")]
    pub work_dir: Option<PathBuf>,

    /// Interpreter used to launch the inference script
    #[arg(long)]
    pub python: Option<String>,

    /// Path to the inference script
    #[arg(long = "inference_script", visible_alias = "inference-script")]
    pub inference_script: Option<PathBuf>,

    /// Kill any external tool that runs longer than this many seconds
    #[arg(long = "tool_timeout", visible_alias = "tool-timeout")]
    pub tool_timeout: Option<u64>,

    /// Leave chunk directories on disk after the run
    #[arg(long = "keep_intermediates", visible_alias = "keep-intermediates")]
    pub keep_intermediates: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_args_and_defaults() {
        let cli = Cli::try_parse_from([
            "lipsync", "--video", "in.mp4", "--audio", "speech.wav", "--output", "out.mp4",
        ])
        .unwrap();

        assert_eq!(cli.video, PathBuf::from("in.mp4"));
        assert_eq!(cli.checkpoint_path, PathBuf::from("checkpoints/wav2lip.pth"));
        assert!((cli.chunk_duration - 5.0).abs() < f64::EPSILON);
        assert!(cli.work_dir.is_none());
        assert!(!cli.keep_intermediates);
    }

    #[test]
    fn test_underscore_flags() {
        let cli = Cli::try_parse_from([
            "lipsync",
            "--video",
            "in.mp4",
            "--audio",
            "speech.wav",
            "--output",
            "out.mp4",
            "--checkpoint_path",
            "ckpt/wav2lip_gan.pth",
            "--chunk_duration",
            "2.5",
            "--tool_timeout",
            "600",
        ])
        .unwrap();

        assert_eq!(cli.checkpoint_path, PathBuf::from("ckpt/wav2lip_gan.pth"));
        assert!((cli.chunk_duration - 2.5).abs() < f64::EPSILON);
        assert_eq!(cli.tool_timeout, Some(600));
    }

    #[test]
    fn test_missing_required_arg_is_rejected() {
        let result = Cli::try_parse_from(["lipsync", "--video", "in.mp4", "--output", "out.mp4"]);
        assert!(result.is_err());
    }
}
