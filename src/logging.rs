//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging with optional file output.
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const BOOTSTRAP_FILTER: &str = "annotation_mapper=info";

/// Initialize logging based on configuration.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter directive, the log
/// file cannot be opened, or a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use annotation_mapper::config::LoggingConfig;
/// use annotation_mapper::logging::init_logging;
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     json_format: true,
///     file_path: None,
/// };
///
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(&config.level)?);

    if config.json_format {
        let stdout_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);

        if let Some(file_path) = &config.file_path {
            let file_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(open_log_file(file_path)?);

            registry.with(stdout_layer).with(file_layer).try_init()?;
        } else {
            registry.with(stdout_layer).try_init()?;
        }
    } else {
        let stdout_layer = fmt::layer().with_target(true).with_level(true);

        if let Some(file_path) = &config.file_path {
            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(open_log_file(file_path)?);

            registry.with(stdout_layer).with(file_layer).try_init()?;
        } else {
            registry.with(stdout_layer).try_init()?;
        }
    }

    Ok(())
}

/// Runs `f` with a temporary stderr subscriber installed.
///
/// Used while the configuration that drives [`init_logging`] is still being
/// loaded, so its warnings are not lost.
pub fn with_bootstrap_logging<T>(f: impl FnOnce() -> T) -> T {
    tracing::subscriber::with_default(bootstrap_subscriber(std::io::stderr), f)
}

fn bootstrap_subscriber<W>(writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(false).with_writer(writer))
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?)
}

fn open_log_file(path: &Path) -> Result<Arc<std::fs::File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Arc::new(file))
}
