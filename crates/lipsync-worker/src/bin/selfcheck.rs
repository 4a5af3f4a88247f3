use std::path::Path;

use lipsync_media::{check_ffmpeg, check_ffprobe, InferenceRunner};
use lipsync_worker::config::DEFAULT_CHECKPOINT;
use lipsync_worker::ToolConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ToolConfig::from_env();

    println!(
        "lipsync-selfcheck: starting with python={} script={}",
        config.python,
        config.inference_script.display()
    );

    let ffmpeg = check_ffmpeg()?;
    println!("lipsync-selfcheck: ffmpeg at {}", ffmpeg.display());
    let ffprobe = check_ffprobe()?;
    println!("lipsync-selfcheck: ffprobe at {}", ffprobe.display());

    let runner = InferenceRunner::new(config.python.clone(), &config.inference_script);
    let python = runner.check_interpreter()?;
    println!("lipsync-selfcheck: python at {}", python.display());

    ensure_file("inference script", &config.inference_script)?;

    // Optional first argument overrides the checkpoint location
    let checkpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CHECKPOINT.to_string());
    ensure_file("checkpoint", Path::new(&checkpoint))?;

    println!("lipsync-selfcheck: ok");
    Ok(())
}

fn ensure_file(what: &str, path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        return Err(anyhow::anyhow!("{} not found: {}", what, path.display()));
    }
    Ok(())
}
