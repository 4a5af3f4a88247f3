//! `lipsync` binary: run the chunked lip-sync pipeline once.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lipsync_worker::{Cli, Pipeline, PipelineConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing with colored output by default, JSON on request
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lipsync={}", default_level)));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(cli.verbose)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let config = PipelineConfig::from_cli(cli);
    info!("Pipeline config: {:?}", config);

    let pipeline = Pipeline::from_config(config);
    match pipeline.run().await {
        Ok(summary) => {
            info!(
                run_id = %summary.run_id,
                chunks = summary.chunk_count,
                frames = summary.total_frames,
                "Processing complete. Output video saved to {}",
                summary.output.display()
            );
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if let Some(stderr) = e.tool_stderr() {
                error!("Tool output:\n{}", stderr);
            }
            std::process::exit(1);
        }
    }
}
