//! Kafka client configuration for the annotation mapper.
//!
//! This module provides configuration structs for the inbound consumer and
//! the outbound producer, with support for SASL/SCRAM and TLS. Both render
//! to a flat list of librdkafka settings which is then loaded into an
//! `rdkafka::ClientConfig`.
//!
//! # Example
//!
//! ```rust
//! use annotation_mapper::kafka::config::{KafkaConsumerConfig, KafkaProducerConfig};
//!
//! let consumer = KafkaConsumerConfig::new("localhost:9092", "NativeCmsMetadataPublicationEvents")
//!     .with_group_id("annotation-mapper");
//! let producer = KafkaProducerConfig::new("localhost:9092", "ConceptAnnotations");
//!
//! assert_eq!(consumer.group_id, "annotation-mapper");
//! assert_eq!(producer.topic, "ConceptAnnotations");
//! ```

use rdkafka::config::ClientConfig;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default consumer group for the relay.
pub const DEFAULT_GROUP_ID: &str = "annotation-mapper";

/// Errors that can occur while building Kafka configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required configuration value.
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// Invalid security protocol specified.
    #[error("Invalid security protocol: {0}")]
    InvalidSecurityProtocol(String),

    /// Invalid SASL mechanism specified.
    #[error("Invalid SASL mechanism: {0}")]
    InvalidSaslMechanism(String),
}

/// Security protocol for Kafka connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SecurityProtocol {
    /// No encryption or authentication.
    #[default]
    Plaintext,
    /// TLS encryption without SASL.
    Ssl,
    /// SASL authentication without TLS.
    SaslPlaintext,
    /// SASL authentication with TLS encryption.
    SaslSsl,
}

impl SecurityProtocol {
    /// Returns the Kafka configuration string for this protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlaintext => "SASL_PLAINTEXT",
            Self::SaslSsl => "SASL_SSL",
        }
    }

    /// Whether this protocol requires SASL credentials.
    pub fn uses_sasl(&self) -> bool {
        matches!(self, Self::SaslPlaintext | Self::SaslSsl)
    }
}

impl FromStr for SecurityProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            "SASL_PLAINTEXT" => Ok(Self::SaslPlaintext),
            "SASL_SSL" => Ok(Self::SaslSsl),
            _ => Err(ConfigError::InvalidSecurityProtocol(s.to_string())),
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaslMechanism {
    /// PLAIN mechanism (username/password in clear text).
    Plain,
    /// SCRAM-SHA-256 mechanism (recommended).
    #[default]
    ScramSha256,
    /// SCRAM-SHA-512 mechanism.
    ScramSha512,
}

impl SaslMechanism {
    /// Returns the Kafka configuration string for this mechanism.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLAIN" => Ok(Self::Plain),
            "SCRAM-SHA-256" => Ok(Self::ScramSha256),
            "SCRAM-SHA-512" => Ok(Self::ScramSha512),
            _ => Err(ConfigError::InvalidSaslMechanism(s.to_string())),
        }
    }
}

/// SASL authentication configuration.
#[derive(Debug, Clone)]
pub struct SaslConfig {
    /// Authentication mechanism to use.
    pub mechanism: SaslMechanism,
    /// SASL username.
    pub username: String,
    /// SASL password.
    pub password: String,
}

/// SSL/TLS configuration.
#[derive(Debug, Clone, Default)]
pub struct SslConfig {
    /// Path to CA certificate file.
    pub ca_location: Option<String>,
    /// Path to client certificate file (for mTLS).
    pub certificate_location: Option<String>,
    /// Path to client key file (for mTLS).
    pub key_location: Option<String>,
}

/// Connection security shared by the consumer and the producer.
#[derive(Debug, Clone, Default)]
pub struct KafkaSecurity {
    /// Security protocol for the connection.
    pub protocol: SecurityProtocol,
    /// SASL configuration (required for SASL protocols).
    pub sasl: Option<SaslConfig>,
    /// SSL configuration.
    pub ssl: Option<SslConfig>,
}

impl KafkaSecurity {
    /// Builds security settings from loosely typed values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSecurityProtocol` or
    /// `ConfigError::InvalidSaslMechanism` for unknown names, and
    /// `ConfigError::MissingConfig` when a SASL protocol is selected without
    /// a username or password.
    pub fn from_parts(
        protocol: &str,
        mechanism: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let protocol: SecurityProtocol = protocol.parse()?;

        let sasl = if protocol.uses_sasl() {
            let username = username
                .ok_or_else(|| ConfigError::MissingConfig("sasl_username".to_string()))?;
            let password = password
                .ok_or_else(|| ConfigError::MissingConfig("sasl_password".to_string()))?;
            let mechanism = match mechanism {
                Some(m) => m.parse()?,
                None => SaslMechanism::default(),
            };
            Some(SaslConfig {
                mechanism,
                username: username.to_string(),
                password: password.to_string(),
            })
        } else {
            None
        };

        Ok(Self {
            protocol,
            sasl,
            ssl: None,
        })
    }

    /// Adds TLS settings (CA and optional client certificate).
    pub fn with_ssl(mut self, ssl: SslConfig) -> Self {
        self.ssl = Some(ssl);
        self
    }

    fn push_settings(&self, settings: &mut Vec<(String, String)>) {
        settings.push((
            "security.protocol".to_string(),
            self.protocol.as_str().to_string(),
        ));

        if let Some(sasl) = &self.sasl {
            settings.push((
                "sasl.mechanism".to_string(),
                sasl.mechanism.as_str().to_string(),
            ));
            settings.push(("sasl.username".to_string(), sasl.username.clone()));
            settings.push(("sasl.password".to_string(), sasl.password.clone()));
        }

        if let Some(ssl) = &self.ssl {
            if let Some(ca) = &ssl.ca_location {
                settings.push(("ssl.ca.location".to_string(), ca.clone()));
            }
            if let Some(cert) = &ssl.certificate_location {
                settings.push(("ssl.certificate.location".to_string(), cert.clone()));
            }
            if let Some(key) = &ssl.key_location {
                settings.push(("ssl.key.location".to_string(), key.clone()));
            }
        }
    }
}

fn to_client_config(settings: Vec<(String, String)>) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    for (key, value) in settings {
        client_config.set(key, value);
    }
    client_config
}

/// Kafka consumer configuration for the inbound metadata topic.
///
/// # Example
///
/// ```rust
/// use annotation_mapper::kafka::config::KafkaConsumerConfig;
///
/// let config = KafkaConsumerConfig::new("localhost:9092", "my-topic")
///     .with_group_id("custom-group-id");
///
/// assert_eq!(config.group_id, "custom-group-id");
/// ```
#[derive(Debug, Clone)]
pub struct KafkaConsumerConfig {
    /// Kafka broker addresses (comma-separated).
    pub brokers: String,

    /// Topic to consume from.
    pub topic: String,

    /// Consumer group ID (defaults to `annotation-mapper`).
    pub group_id: String,

    /// Connection security.
    pub security: KafkaSecurity,

    /// Auto offset reset policy ("earliest" or "latest").
    pub auto_offset_reset: String,

    /// Enable auto commit of offsets.
    pub enable_auto_commit: bool,

    /// Session timeout duration.
    pub session_timeout: Duration,
}

impl KafkaConsumerConfig {
    /// Creates a new configuration with sensible defaults.
    pub fn new(brokers: &str, topic: &str) -> Self {
        Self {
            brokers: brokers.to_string(),
            topic: topic.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            security: KafkaSecurity::default(),
            auto_offset_reset: "latest".to_string(),
            enable_auto_commit: true,
            session_timeout: Duration::from_secs(30),
        }
    }

    /// Sets a custom consumer group ID.
    pub fn with_group_id(mut self, group_id: &str) -> Self {
        self.group_id = group_id.to_string();
        self
    }

    /// Sets the connection security.
    pub fn with_security(mut self, security: KafkaSecurity) -> Self {
        self.security = security;
        self
    }

    /// Sets the auto offset reset policy.
    pub fn with_auto_offset_reset(mut self, policy: &str) -> Self {
        self.auto_offset_reset = policy.to_string();
        self
    }

    /// Enables or disables auto commit of offsets.
    ///
    /// With auto commit disabled the consumer commits each offset itself
    /// once the handler has returned.
    pub fn with_auto_commit(mut self, enabled: bool) -> Self {
        self.enable_auto_commit = enabled;
        self
    }

    /// Returns the librdkafka settings as key-value pairs.
    pub fn client_settings(&self) -> Vec<(String, String)> {
        let mut settings = vec![
            ("bootstrap.servers".to_string(), self.brokers.clone()),
            ("group.id".to_string(), self.group_id.clone()),
            (
                "auto.offset.reset".to_string(),
                self.auto_offset_reset.clone(),
            ),
            (
                "enable.auto.commit".to_string(),
                self.enable_auto_commit.to_string(),
            ),
            (
                "session.timeout.ms".to_string(),
                self.session_timeout.as_millis().to_string(),
            ),
            (
                "client.id".to_string(),
                format!("{}-consumer", self.group_id),
            ),
        ];
        self.security.push_settings(&mut settings);
        settings
    }

    /// Builds the `rdkafka` client configuration.
    pub fn client_config(&self) -> ClientConfig {
        to_client_config(self.client_settings())
    }
}

/// Kafka producer configuration for the outbound annotations topic.
#[derive(Debug, Clone)]
pub struct KafkaProducerConfig {
    /// Kafka broker addresses (comma-separated).
    pub brokers: String,

    /// Topic to publish to.
    pub topic: String,

    /// Connection security.
    pub security: KafkaSecurity,

    /// Upper bound on local queueing plus broker acknowledgement.
    pub message_timeout: Duration,
}

impl KafkaProducerConfig {
    /// Creates a new configuration with sensible defaults.
    pub fn new(brokers: &str, topic: &str) -> Self {
        Self {
            brokers: brokers.to_string(),
            topic: topic.to_string(),
            security: KafkaSecurity::default(),
            message_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the connection security.
    pub fn with_security(mut self, security: KafkaSecurity) -> Self {
        self.security = security;
        self
    }

    /// Sets the message timeout.
    pub fn with_message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = timeout;
        self
    }

    /// Returns the librdkafka settings as key-value pairs.
    pub fn client_settings(&self) -> Vec<(String, String)> {
        let mut settings = vec![
            ("bootstrap.servers".to_string(), self.brokers.clone()),
            ("acks".to_string(), "all".to_string()),
            (
                "message.timeout.ms".to_string(),
                self.message_timeout.as_millis().to_string(),
            ),
            (
                "client.id".to_string(),
                format!("{}-producer", DEFAULT_GROUP_ID),
            ),
        ];
        self.security.push_settings(&mut settings);
        settings
    }

    /// Builds the `rdkafka` client configuration.
    pub fn client_config(&self) -> ClientConfig {
        to_client_config(self.client_settings())
    }
}
