//! Annotation mapper - metadata publish events to concept annotations
//!
#![doc = "Main entry point for the annotation mapper service."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use annotation_mapper::cli::{Cli, Commands};
use annotation_mapper::commands;
use annotation_mapper::config::Config;
use annotation_mapper::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration under a temporary stderr subscriber
    let config_path = cli
        .config
        .as_deref()
        .unwrap_or("config/annotation-mapper.yaml");
    let config = logging::with_bootstrap_logging(|| Config::load(config_path, &cli))?;

    // Initialize logging from the loaded configuration
    if let Err(e) = logging::init_logging(&config.logging) {
        init_tracing();
        tracing::warn!(error = %e, "Falling back to default logging");
    }

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Run {
            whitelist,
            no_health,
        } => {
            commands::run::run_relay(config, whitelist, no_health).await?;
            Ok(())
        }
        Commands::Map { input, origin } => {
            commands::map::run_map(config, input.as_deref(), origin).await?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("annotation_mapper=info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
