//! scrivener - meeting transcription relay
//!
//! Entry point for the scrivener service binary.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scrivener::cli::{Cli, Commands};
use scrivener::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            scrivener::service::run(&settings).await?;
        }
        Commands::Config(config_cmd) => {
            scrivener::cli::commands::config_command(&settings, config_cmd)?;
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}
