//! Configuration management for the annotation mapper
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MapperError, Result};
use crate::kafka::{KafkaConsumerConfig, KafkaProducerConfig, KafkaSecurity, SslConfig};
use crate::mapper::Whitelist;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for the annotation mapper
///
/// Holds queue connection settings, the origin whitelist, logging and the
/// health endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Kafka connection and topic settings
    #[serde(default)]
    pub kafka: KafkaSettings,

    /// Regular expression matched against `Origin-System-Id`
    #[serde(default = "default_whitelist")]
    pub whitelist: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Health endpoint configuration
    #[serde(default)]
    pub health: HealthConfig,
}

/// Kafka connection and topic settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaSettings {
    /// Kafka brokers (comma-separated)
    #[serde(default = "default_brokers")]
    pub brokers: String,

    /// Topic carrying metadata publish events
    #[serde(default = "default_consumer_topic")]
    pub consumer_topic: String,

    /// Topic receiving concept annotations
    #[serde(default = "default_producer_topic")]
    pub producer_topic: String,

    /// Consumer group ID
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Offset reset policy for a new consumer group ("earliest" or "latest")
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,

    /// Let librdkafka commit offsets in the background; when false the
    /// consumer commits each offset after its message has been handled
    #[serde(default = "default_enable_auto_commit")]
    pub enable_auto_commit: bool,

    /// Producer delivery timeout in milliseconds
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,

    /// Security configuration
    #[serde(default)]
    pub security: Option<KafkaSecurityConfig>,
}

/// Kafka security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KafkaSecurityConfig {
    /// Security protocol (PLAINTEXT, SSL, SASL_PLAINTEXT, SASL_SSL)
    pub protocol: String,

    /// SASL mechanism (PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    pub sasl_mechanism: Option<String>,

    /// SASL username
    pub sasl_username: Option<String>,

    /// SASL password (prefer env var ANNOTATION_MAPPER_KAFKA_SASL_PASSWORD)
    pub sasl_password: Option<String>,

    /// CA certificate used to verify the brokers
    pub ssl_ca_location: Option<String>,

    /// Client certificate for mutual TLS
    pub ssl_certificate_location: Option<String>,

    /// Client key for mutual TLS
    pub ssl_key_location: Option<String>,
}

impl KafkaSecurityConfig {
    fn ssl(&self) -> Option<SslConfig> {
        if self.ssl_ca_location.is_none()
            && self.ssl_certificate_location.is_none()
            && self.ssl_key_location.is_none()
        {
            return None;
        }
        Some(SslConfig {
            ca_location: self.ssl_ca_location.clone(),
            certificate_location: self.ssl_certificate_location.clone(),
            key_location: self.ssl_key_location.clone(),
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON-formatted logs
    #[serde(default = "default_json_logs")]
    pub json_format: bool,

    /// Log file path (if None, STDOUT only)
    pub file_path: Option<PathBuf>,
}

/// Health endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Serve the health endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,

    /// Socket address for the health server
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_whitelist() -> String {
    ".*".to_string()
}

fn default_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_consumer_topic() -> String {
    "NativeCmsMetadataPublicationEvents".to_string()
}

fn default_producer_topic() -> String {
    "ConceptAnnotations".to_string()
}

fn default_group_id() -> String {
    crate::kafka::config::DEFAULT_GROUP_ID.to_string()
}

fn default_auto_offset_reset() -> String {
    "latest".to_string()
}

fn default_enable_auto_commit() -> bool {
    true
}

fn default_message_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logs() -> bool {
    true
}

fn default_health_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for KafkaSettings {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            consumer_topic: default_consumer_topic(),
            producer_topic: default_producer_topic(),
            group_id: default_group_id(),
            auto_offset_reset: default_auto_offset_reset(),
            enable_auto_commit: default_enable_auto_commit(),
            message_timeout_ms: default_message_timeout_ms(),
            security: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: default_json_logs(),
            file_path: None,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kafka: KafkaSettings::default(),
            whitelist: default_whitelist(),
            logging: LoggingConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapperError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MapperError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        let env = |name: &str| std::env::var(name).ok();

        if let Some(brokers) = env("ANNOTATION_MAPPER_KAFKA_BROKERS") {
            self.kafka.brokers = brokers;
        }
        if let Some(topic) = env("ANNOTATION_MAPPER_KAFKA_CONSUMER_TOPIC") {
            self.kafka.consumer_topic = topic;
        }
        if let Some(topic) = env("ANNOTATION_MAPPER_KAFKA_PRODUCER_TOPIC") {
            self.kafka.producer_topic = topic;
        }
        if let Some(group_id) = env("ANNOTATION_MAPPER_KAFKA_GROUP_ID") {
            self.kafka.group_id = group_id;
        }

        if let Some(policy) = env("ANNOTATION_MAPPER_KAFKA_AUTO_OFFSET_RESET") {
            self.kafka.auto_offset_reset = policy;
        }
        if let Some(enabled) = parse_env("ANNOTATION_MAPPER_KAFKA_ENABLE_AUTO_COMMIT") {
            self.kafka.enable_auto_commit = enabled;
        }
        if let Some(timeout) = parse_env("ANNOTATION_MAPPER_KAFKA_MESSAGE_TIMEOUT_MS") {
            self.kafka.message_timeout_ms = timeout;
        }

        if let Some(protocol) = env("ANNOTATION_MAPPER_KAFKA_SECURITY_PROTOCOL") {
            self.kafka.security = Some(KafkaSecurityConfig {
                protocol,
                sasl_mechanism: env("ANNOTATION_MAPPER_KAFKA_SASL_MECHANISM"),
                sasl_username: env("ANNOTATION_MAPPER_KAFKA_SASL_USERNAME"),
                sasl_password: env("ANNOTATION_MAPPER_KAFKA_SASL_PASSWORD"),
                ssl_ca_location: env("ANNOTATION_MAPPER_KAFKA_SSL_CA_LOCATION"),
                ssl_certificate_location: env("ANNOTATION_MAPPER_KAFKA_SSL_CERTIFICATE_LOCATION"),
                ssl_key_location: env("ANNOTATION_MAPPER_KAFKA_SSL_KEY_LOCATION"),
            });
            tracing::debug!("Overrode kafka.security from ANNOTATION_MAPPER_KAFKA_* env vars");
        } else if let Some(security) = self.kafka.security.as_mut() {
            // Keep secrets and host-specific paths out of the config file.
            if let Some(password) = env("ANNOTATION_MAPPER_KAFKA_SASL_PASSWORD") {
                security.sasl_password = Some(password);
            }
            if let Some(ca) = env("ANNOTATION_MAPPER_KAFKA_SSL_CA_LOCATION") {
                security.ssl_ca_location = Some(ca);
            }
            if let Some(cert) = env("ANNOTATION_MAPPER_KAFKA_SSL_CERTIFICATE_LOCATION") {
                security.ssl_certificate_location = Some(cert);
            }
            if let Some(key) = env("ANNOTATION_MAPPER_KAFKA_SSL_KEY_LOCATION") {
                security.ssl_key_location = Some(key);
            }
        }

        if let Some(whitelist) = env("ANNOTATION_MAPPER_WHITELIST") {
            tracing::debug!(whitelist = %whitelist, "Env override: ANNOTATION_MAPPER_WHITELIST");
            self.whitelist = whitelist;
        }

        if let Some(level) = env("ANNOTATION_MAPPER_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(json_logs) = parse_env("ANNOTATION_MAPPER_JSON_LOGS") {
            self.logging.json_format = json_logs;
        }

        if let Some(log_file) = env("ANNOTATION_MAPPER_LOG_FILE") {
            self.logging.file_path = Some(PathBuf::from(log_file));
        }

        if let Some(enabled) = parse_env("ANNOTATION_MAPPER_HEALTH_ENABLED") {
            self.health.enabled = enabled;
        }
        if let Some(bind) = env("ANNOTATION_MAPPER_HEALTH_BIND") {
            self.health.bind_address = bind;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.kafka.brokers.trim().is_empty() {
            return Err(MapperError::Config("kafka.brokers cannot be empty".to_string()).into());
        }

        if self.kafka.consumer_topic.is_empty() || self.kafka.producer_topic.is_empty() {
            return Err(
                MapperError::Config("kafka topics cannot be empty".to_string()).into(),
            );
        }

        if self.kafka.consumer_topic == self.kafka.producer_topic {
            return Err(MapperError::Config(format!(
                "kafka.consumer_topic and kafka.producer_topic must differ (both are {})",
                self.kafka.consumer_topic
            ))
            .into());
        }

        let valid_resets = ["earliest", "latest"];
        if !valid_resets.contains(&self.kafka.auto_offset_reset.as_str()) {
            return Err(MapperError::Config(format!(
                "Invalid kafka.auto_offset_reset: {}. Must be one of: {}",
                self.kafka.auto_offset_reset,
                valid_resets.join(", ")
            ))
            .into());
        }

        if self.kafka.message_timeout_ms == 0 {
            return Err(MapperError::Config(
                "kafka.message_timeout_ms must be greater than zero".to_string(),
            )
            .into());
        }

        self.security()?;
        self.whitelist_matcher()?;

        if self.health.enabled && self.health.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(MapperError::Config(format!(
                "Invalid health.bind_address: {}",
                self.health.bind_address
            ))
            .into());
        }

        Ok(())
    }

    /// Compiles the origin whitelist.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is not a valid regular expression
    pub fn whitelist_matcher(&self) -> Result<Whitelist> {
        Whitelist::new(&self.whitelist).map_err(|e| {
            MapperError::Config(format!("Invalid whitelist pattern: {}", e)).into()
        })
    }

    fn security(&self) -> Result<KafkaSecurity> {
        let Some(s) = &self.kafka.security else {
            return Ok(KafkaSecurity::default());
        };

        let security = KafkaSecurity::from_parts(
            &s.protocol,
            s.sasl_mechanism.as_deref(),
            s.sasl_username.as_deref(),
            s.sasl_password.as_deref(),
        )
        .map_err(|e| MapperError::Config(e.to_string()))?;

        Ok(match s.ssl() {
            Some(ssl) => security.with_ssl(ssl),
            None => security,
        })
    }

    /// Builds the consumer configuration for the metadata topic.
    ///
    /// # Errors
    ///
    /// Returns error if the security settings are invalid
    pub fn consumer_config(&self) -> Result<KafkaConsumerConfig> {
        Ok(
            KafkaConsumerConfig::new(&self.kafka.brokers, &self.kafka.consumer_topic)
                .with_group_id(&self.kafka.group_id)
                .with_auto_offset_reset(&self.kafka.auto_offset_reset)
                .with_auto_commit(self.kafka.enable_auto_commit)
                .with_security(self.security()?),
        )
    }

    /// Builds the producer configuration for the annotations topic.
    ///
    /// # Errors
    ///
    /// Returns error if the security settings are invalid
    pub fn producer_config(&self) -> Result<KafkaProducerConfig> {
        Ok(
            KafkaProducerConfig::new(&self.kafka.brokers, &self.kafka.producer_topic)
                .with_message_timeout(Duration::from_millis(self.kafka.message_timeout_ms))
                .with_security(self.security()?),
        )
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid value for {}: {}", name, raw);
            None
        }
    }
}
