//! Lip-sync inference subprocess.
//!
//! The model runs out of process as `<python> <script> --checkpoint_path ...
//! --face ... --audio ... --outfile ...`. Nothing about the model is known
//! here beyond that contract.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::{collect_stderr_tail, join_tail, wait_for_exit};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ensure_output_written;

/// Default interpreter used to launch the inference script.
pub const DEFAULT_INTERPRETER: &str = "python";

/// Default inference script, resolved against the working directory.
pub const DEFAULT_SCRIPT: &str = "inference.py";

/// One inference invocation.
#[derive(Debug, Clone)]
pub struct InferenceCommand {
    checkpoint: PathBuf,
    face: PathBuf,
    audio: PathBuf,
    outfile: PathBuf,
}

impl InferenceCommand {
    pub fn new(
        checkpoint: impl AsRef<Path>,
        face: impl AsRef<Path>,
        audio: impl AsRef<Path>,
        outfile: impl AsRef<Path>,
    ) -> Self {
        Self {
            checkpoint: checkpoint.as_ref().to_path_buf(),
            face: face.as_ref().to_path_buf(),
            audio: audio.as_ref().to_path_buf(),
            outfile: outfile.as_ref().to_path_buf(),
        }
    }

    /// Output path this command writes.
    pub fn outfile(&self) -> &Path {
        &self.outfile
    }

    /// Build the script arguments (everything after the interpreter).
    pub fn build_args(&self, script: &Path) -> Vec<String> {
        vec![
            script.to_string_lossy().to_string(),
            "--checkpoint_path".to_string(),
            self.checkpoint.to_string_lossy().to_string(),
            "--face".to_string(),
            self.face.to_string_lossy().to_string(),
            "--audio".to_string(),
            self.audio.to_string_lossy().to_string(),
            "--outfile".to_string(),
            self.outfile.to_string_lossy().to_string(),
        ]
    }
}

/// Runner for the inference script.
#[derive(Debug, Clone)]
pub struct InferenceRunner {
    interpreter: String,
    script: PathBuf,
    timeout_secs: Option<u64>,
}

impl Default for InferenceRunner {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER, DEFAULT_SCRIPT)
    }
}

impl InferenceRunner {
    pub fn new(interpreter: impl Into<String>, script: impl AsRef<Path>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.as_ref().to_path_buf(),
            timeout_secs: None,
        }
    }

    /// Set an optional timeout per invocation.
    pub fn with_optional_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Resolve the interpreter on PATH.
    pub fn check_interpreter(&self) -> MediaResult<PathBuf> {
        which::which(&self.interpreter)
            .map_err(|_| MediaError::InterpreterNotFound(self.interpreter.clone()))
    }

    /// Run one inference invocation and verify it produced its output.
    pub async fn run(&self, cmd: &InferenceCommand) -> MediaResult<()> {
        self.check_interpreter()?;

        let args = cmd.build_args(&self.script);
        debug!("Running inference: {} {}", self.interpreter, args.join(" "));

        let mut child = Command::new(&self.interpreter)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            MediaError::inference_failed("Inference stdout was not captured", None, None)
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            MediaError::inference_failed("Inference stderr was not captured", None, None)
        })?;

        let stdout_task = collect_stderr_tail(stdout, |line| {
            debug!(target: "lipsync::inference", "{}", line);
            true
        });
        let stderr_task = collect_stderr_tail(stderr, |line| {
            debug!(target: "lipsync::inference", "{}", line);
            false
        });

        let status = match wait_for_exit(&mut child, self.timeout_secs, "Inference").await {
            Ok(status) => status,
            Err(e) => {
                // Grandchildren may still hold the pipes open
                stdout_task.abort();
                stderr_task.abort();
                return Err(e);
            }
        };
        let _ = stdout_task.await;
        let tail = join_tail(stderr_task).await;

        if !status.success() {
            return Err(MediaError::inference_failed(
                format!("Inference exited with non-zero status for {}", cmd.face.display()),
                tail,
                status.code(),
            ));
        }

        ensure_output_written(cmd.outfile()).await
    }
}
