//! Command-line interface definition for the annotation mapper
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the long-running relay and an offline mapping command.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Annotation mapper - turns metadata publish events into concept annotations
///
/// Consumes publish events from Kafka, keeps those from whitelisted origin
/// systems and republishes their annotations with short predicate names.
#[derive(Parser, Debug, Clone)]
#[command(name = "annotation-mapper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/annotation-mapper.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the relay: consume publish events and publish concept annotations
    Run {
        /// Override the origin system whitelist pattern
        #[arg(short, long)]
        whitelist: Option<String>,

        /// Do not serve the health endpoints
        #[arg(long)]
        no_health: bool,
    },

    /// Map a single publish event offline and print the outbound message
    Map {
        /// File holding the event body, or a full FT-framed message (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Origin-System-Id to assume when the input has no headers
        #[arg(short, long)]
        origin: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/annotation-mapper.yaml".to_string()),
            verbose: false,
            command: Commands::Run {
                whitelist: None,
                no_health: false,
            },
        }
    }
}
