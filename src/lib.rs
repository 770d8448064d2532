//! Annotation mapper library
//!
//! This library relays metadata publish events from Kafka to the concept
//! annotations topic, keeping only whitelisted origin systems and rewriting
//! annotation predicates to their short names.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `mapper`: Predicate table, payload types, header derivation, whitelist and the service
//! - `kafka`: Message framing, consumer loop and producer
//! - `health`: HTTP health, readiness and liveness endpoints
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging setup
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use annotation_mapper::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/annotation-mapper.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let whitelist = config.whitelist_matcher()?;
//!     assert!(!whitelist.as_str().is_empty());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod health;
pub mod kafka;
pub mod logging;
pub mod mapper;

// Re-export commonly used types
pub use config::Config;
pub use error::{MapperError, Result};
pub use kafka::{FtMessage, MessageProducer};
pub use mapper::{AnnotationMapperService, Outcome, Whitelist};
