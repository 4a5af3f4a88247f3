//! Pipeline configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lipsync_media::inference::{DEFAULT_INTERPRETER, DEFAULT_SCRIPT};

use crate::cli::Cli;
use crate::error::{PipelineError, PipelineResult};

/// Default checkpoint path, relative to the working directory.
pub const DEFAULT_CHECKPOINT: &str = "checkpoints/wav2lip.pth";

/// Default chunk duration in seconds.
pub const DEFAULT_CHUNK_DURATION: f64 = 5.0;

/// Directory for extracted source chunks, under the work dir.
pub const CHUNK_DIR_NAME: &str = "temp_video_chunks";

/// Directory for processed chunks, under the work dir.
pub const PROCESSED_DIR_NAME: &str = "processed_chunks";

/// Concat manifest file name, under the work dir.
pub const MANIFEST_FILE_NAME: &str = "temp_filelist.txt";

/// External tool settings, overridable from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Interpreter used to launch the inference script
    pub python: String,
    /// Inference script path
    pub inference_script: PathBuf,
    /// Per-invocation timeout for every external tool; `None` waits forever
    pub tool_timeout: Option<Duration>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            python: DEFAULT_INTERPRETER.to_string(),
            inference_script: PathBuf::from(DEFAULT_SCRIPT),
            tool_timeout: None,
        }
    }
}

impl ToolConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            python: lookup("LIPSYNC_PYTHON").unwrap_or(defaults.python),
            inference_script: lookup("LIPSYNC_INFERENCE_SCRIPT")
                .map(PathBuf::from)
                .unwrap_or(defaults.inference_script),
            tool_timeout: lookup("LIPSYNC_TOOL_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|&secs: &u64| secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Timeout in whole seconds, as the runners take it.
    pub fn timeout_secs(&self) -> Option<u64> {
        self.tool_timeout.map(|d| d.as_secs().max(1))
    }
}

/// Everything one run needs, parsed once and passed down explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source video
    pub video: PathBuf,
    /// Audio track shared by every chunk
    pub audio: PathBuf,
    /// Final output video
    pub output: PathBuf,
    /// Lip-sync model checkpoint
    pub checkpoint_path: PathBuf,
    /// Chunk duration in seconds
    pub chunk_duration: f64,
    /// Root for temporary directories and the manifest
    pub work_dir: PathBuf,
    /// Skip removal of intermediate files
    pub keep_intermediates: bool,
    /// External tool settings
    pub tools: ToolConfig,
}

impl PipelineConfig {
    /// Create a config with default settings for the given inputs.
    pub fn new(
        video: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video: video.into(),
            audio: audio.into(),
            output: output.into(),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT),
            chunk_duration: DEFAULT_CHUNK_DURATION,
            work_dir: PathBuf::from("."),
            keep_intermediates: false,
            tools: ToolConfig::default(),
        }
    }

    /// Build from parsed arguments; flags win over `LIPSYNC_*` variables.
    pub fn from_cli(cli: Cli) -> Self {
        let mut tools = ToolConfig::from_env();
        if let Some(python) = cli.python {
            tools.python = python;
        }
        if let Some(script) = cli.inference_script {
            tools.inference_script = script;
        }
        if let Some(secs) = cli.tool_timeout.filter(|&s| s > 0) {
            tools.tool_timeout = Some(Duration::from_secs(secs));
        }

        let work_dir = cli
            .work_dir
            .or_else(|| std::env::var("LIPSYNC_WORK_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            video: cli.video,
            audio: cli.audio,
            output: cli.output,
            checkpoint_path: cli.checkpoint_path,
            chunk_duration: cli.chunk_duration,
            work_dir,
            keep_intermediates: cli.keep_intermediates,
            tools,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = checkpoint.into();
        self
    }

    pub fn with_chunk_duration(mut self, seconds: f64) -> Self {
        self.chunk_duration = seconds;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    pub fn chunk_dir(&self) -> PathBuf {
        self.work_dir.join(CHUNK_DIR_NAME)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.work_dir.join(PROCESSED_DIR_NAME)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.work_dir.join(MANIFEST_FILE_NAME)
    }

    /// Check inputs before any external tool runs.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.chunk_duration.is_finite() || self.chunk_duration <= 0.0 {
            return Err(PipelineError::config(format!(
                "chunk duration must be positive, got {}",
                self.chunk_duration
            )));
        }

        require_file("video", &self.video)?;
        require_file("audio", &self.audio)?;
        require_file("checkpoint", &self.checkpoint_path)?;

        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(PipelineError::config(format!(
                    "output directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        if !self.work_dir.is_dir() {
            return Err(PipelineError::config(format!(
                "work directory does not exist: {}",
                self.work_dir.display()
            )));
        }

        Ok(())
    }
}

fn require_file(what: &str, path: &Path) -> PipelineResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::config(format!(
            "{} file not found: {}",
            what,
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_tool_config_from_vars() {
        let vars: HashMap<&str, &str> = [
            ("LIPSYNC_PYTHON", "python3"),
            ("LIPSYNC_INFERENCE_SCRIPT", "/opt/wav2lip/inference.py"),
            ("LIPSYNC_TOOL_TIMEOUT_SECS", "900"),
        ]
        .into_iter()
        .collect();

        let config = ToolConfig::from_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.python, "python3");
        assert_eq!(config.inference_script, PathBuf::from("/opt/wav2lip/inference.py"));
        assert_eq!(config.timeout_secs(), Some(900));
    }

    #[test]
    fn test_tool_config_ignores_bad_timeout() {
        let config = ToolConfig::from_vars(|k| {
            (k == "LIPSYNC_TOOL_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config, ToolConfig::default());

        let config = ToolConfig::from_vars(|k| (k == "LIPSYNC_TOOL_TIMEOUT_SECS").then(|| "0".to_string()));
        assert_eq!(config.tool_timeout, None);
    }

    #[test]
    fn test_work_paths() {
        let config = PipelineConfig::new("in.mp4", "a.wav", "out.mp4").with_work_dir("/scratch");

        assert_eq!(config.chunk_dir(), PathBuf::from("/scratch/temp_video_chunks"));
        assert_eq!(config.processed_dir(), PathBuf::from("/scratch/processed_chunks"));
        assert_eq!(config.manifest_path(), PathBuf::from("/scratch/temp_filelist.txt"));
    }

    #[test]
    fn test_from_cli_flags_override_tools() {
        let cli = Cli::try_parse_from([
            "lipsync",
            "--video",
            "in.mp4",
            "--audio",
            "a.wav",
            "--output",
            "out.mp4",
            "--python",
            "/usr/bin/python3.10",
            "--work_dir",
            "/scratch",
            "--keep_intermediates",
        ])
        .unwrap();

        let config = PipelineConfig::from_cli(cli);

        assert_eq!(config.tools.python, "/usr/bin/python3.10");
        assert_eq!(config.work_dir, PathBuf::from("/scratch"));
        assert!(config.keep_intermediates);
        assert_eq!(config.checkpoint_path, PathBuf::from(DEFAULT_CHECKPOINT));
    }

    #[test]
    fn test_validate_reports_missing_inputs() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("in.mp4");
        let audio = dir.path().join("a.wav");
        let checkpoint = dir.path().join("wav2lip.pth");
        std::fs::write(&video, b"v").unwrap();
        std::fs::write(&checkpoint, b"c").unwrap();

        let config = PipelineConfig::new(&video, &audio, dir.path().join("out.mp4"))
            .with_checkpoint(&checkpoint)
            .with_work_dir(dir.path());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("audio file not found"), "{}", err);

        std::fs::write(&audio, b"a").unwrap();
        config.validate().unwrap();

        let bad_duration = config.clone().with_chunk_duration(0.0);
        assert!(matches!(bad_duration.validate(), Err(PipelineError::Config(_))));

        let bad_output = PipelineConfig {
            output: dir.path().join("missing").join("out.mp4"),
            ..config
        };
        assert!(bad_output.validate().is_err());
    }
}
