// Bow Navigational Instruction Interface
// Main entry point for the bow binary

use bow_engine::cli::{Cli, Command};
use bow_engine::config::Config;
use bow_engine::handlers::{handle_run_script, handle_session, handle_show, OutputFormat};
use bow_engine::telemetry::{init_telemetry, init_telemetry_with_level};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Bow Engine v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    if let Some(level) = cli.log {
        config.core.log_level = level;
    }

    // Re-initialize telemetry with config-driven log level
    // (only takes effect if RUST_LOG env var is not set)
    init_telemetry_with_level(&config.core.log_level);

    match cli.command {
        Command::Session => {
            tracing::info!("Starting instruction session");
            handle_session(&config, format).await
        }

        Command::Run { file } => {
            tracing::info!("Running script: {}", file.display());
            handle_run_script(&file, &config, format).await
        }

        Command::Show { name } => {
            tracing::info!("Showing plan: {}", name);
            handle_show(&name, &config, format).await
        }
    }
}
