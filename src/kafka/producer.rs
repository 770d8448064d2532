//! Kafka producer for outbound concept annotation messages.
//!
//! The mapper depends only on the [`MessageProducer`] trait; the
//! [`KafkaMessageProducer`] implementation wraps an `rdkafka`
//! `FutureProducer` and writes framed [`FtMessage`]s to a single topic.

use async_trait::async_trait;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::KafkaProducerConfig;
use super::message::FtMessage;

/// Errors that can occur while producing messages.
#[derive(Error, Debug)]
pub enum ProducerError {
    /// The producer client could not be created.
    #[error("Failed to create Kafka producer: {0}")]
    Create(#[from] KafkaError),

    /// The message was not acknowledged.
    #[error("Kafka send failed: {0}")]
    Send(String),
}

/// Capability to publish one message downstream.
///
/// Delivery timeouts and retries belong to the implementation; callers
/// see only the final outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publishes a message, returning once it is acknowledged or has failed.
    async fn send(&self, message: FtMessage) -> Result<(), ProducerError>;
}

/// `rdkafka`-backed producer writing framed messages to one topic.
pub struct KafkaMessageProducer {
    producer: FutureProducer,
    topic: String,
    queue_timeout: Duration,
}

impl KafkaMessageProducer {
    /// Creates a producer from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::Create` if librdkafka rejects the configuration.
    pub fn new(config: &KafkaProducerConfig) -> Result<Self, ProducerError> {
        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            security_protocol = %config.security.protocol.as_str(),
            "Creating Kafka producer"
        );

        let producer: FutureProducer = config.client_config().create()?;

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            queue_timeout: config.message_timeout,
        })
    }

    /// Returns the topic this producer writes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for in-flight messages to be delivered.
    pub fn flush(&self, timeout: Duration) {
        if let Err(e) = self.producer.flush(Timeout::After(timeout)) {
            warn!(error = %e, topic = %self.topic, "Producer flush did not complete");
        }
    }
}

#[async_trait]
impl MessageProducer for KafkaMessageProducer {
    async fn send(&self, message: FtMessage) -> Result<(), ProducerError> {
        let payload = message.build();
        let key = message.header("X-Request-Id");

        let record = FutureRecord::to(&self.topic).key(key).payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(self.queue_timeout))
            .await
        {
            Ok((partition, offset)) => {
                debug!(
                    topic = %self.topic,
                    partition = partition,
                    offset = offset,
                    "Message delivered"
                );
                Ok(())
            }
            Err((kafka_err, _)) => Err(ProducerError::Send(kafka_err.to_string())),
        }
    }
}
