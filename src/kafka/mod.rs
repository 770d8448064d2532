//! Kafka Module
//!
//! This module provides the queue plumbing around the mapper:
//! - Consume framed messages from the metadata topic
//! - Publish framed messages to the concept annotations topic
//!
//! # Overview
//!
//! - **Consumer**: `rdkafka` stream consumer driving a [`MessageHandler`]
//! - **Producer**: [`MessageProducer`] trait and its `rdkafka` implementation
//! - **Messages**: [`FtMessage`] headers plus body, with the `FTMSG/1.0` framing
//! - **Configuration**: Broker, topic, group and security settings
//!
//! # Authentication
//!
//! The clients support multiple security protocols:
//!
//! - **PLAINTEXT**: No authentication (development only)
//! - **SSL**: TLS encryption without SASL
//! - **SASL_PLAINTEXT**: SASL authentication without TLS
//! - **SASL_SSL**: SASL authentication with TLS (recommended for production)
//!
//! SASL mechanisms supported:
//! - PLAIN
//! - SCRAM-SHA-256 (recommended)
//! - SCRAM-SHA-512

pub mod config;
pub mod consumer;
pub mod message;
pub mod producer;

pub use config::{
    ConfigError, KafkaConsumerConfig, KafkaProducerConfig, KafkaSecurity, SaslConfig,
    SaslMechanism, SecurityProtocol, SslConfig,
};
pub use consumer::{ConsumerError, MessageConsumer, MessageHandler};
pub use message::FtMessage;
pub use producer::{KafkaMessageProducer, MessageProducer, ProducerError};
