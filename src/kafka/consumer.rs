//! Kafka consumer for inbound metadata publish messages.
//!
//! This module provides a Kafka consumer that reads framed messages from the
//! metadata topic and hands each one to a [`MessageHandler`]. Handler
//! failures are logged and the loop moves on; redelivery is governed by the
//! offset commit policy in [`KafkaConsumerConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use annotation_mapper::kafka::{FtMessage, KafkaConsumerConfig, MessageConsumer, MessageHandler};
//! use tokio_util::sync::CancellationToken;
//!
//! struct PrintHandler;
//!
//! #[async_trait::async_trait]
//! impl MessageHandler for PrintHandler {
//!     async fn handle(
//!         &self,
//!         message: FtMessage,
//!     ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!         println!("Received: {}", message.body);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = KafkaConsumerConfig::new("localhost:9092", "NativeCmsMetadataPublicationEvents");
//!     let consumer = MessageConsumer::new(config)?;
//!     consumer.run(Arc::new(PrintHandler), CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{Headers, Message};
use rdkafka::{Offset, TopicPartitionList};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::KafkaConsumerConfig;
use super::message::FtMessage;

/// Errors that can occur during consumer operations.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// Error from the Kafka client.
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// The handler rejected a message.
    #[error("Handler error: {0}")]
    Handler(String),
}

/// Handler trait for processing inbound messages.
///
/// Return `Ok(())` when the message was processed (including deliberate
/// skips). Return `Err` if processing failed; the consumer logs it and
/// continues with the next message.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one inbound message.
    async fn handle(
        &self,
        message: FtMessage,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Kafka consumer bound to a single topic.
pub struct MessageConsumer {
    consumer: StreamConsumer,
    config: KafkaConsumerConfig,
}

impl MessageConsumer {
    /// Creates a consumer and subscribes it to the configured topic.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Kafka` if the client cannot be created or the
    /// subscription is rejected.
    pub fn new(config: KafkaConsumerConfig) -> Result<Self, ConsumerError> {
        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            security_protocol = %config.security.protocol.as_str(),
            "Creating Kafka consumer"
        );

        let consumer: StreamConsumer = config.client_config().create()?;
        consumer.subscribe(&[config.topic.as_str()])?;

        Ok(Self { consumer, config })
    }

    /// Returns the topic this consumer reads from.
    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    /// Returns the consumer group ID.
    pub fn group_id(&self) -> &str {
        &self.config.group_id
    }

    /// Runs the consumer until `shutdown` is cancelled.
    ///
    /// Messages are processed sequentially through the handler. When auto
    /// commit is disabled, each offset is committed after its handler
    /// returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok(())`; broker errors are logged and the
    /// loop keeps polling.
    pub async fn run<H: MessageHandler + 'static>(
        &self,
        handler: Arc<H>,
        shutdown: CancellationToken,
    ) -> Result<(), ConsumerError> {
        info!(
            topic = %self.config.topic,
            group_id = %self.config.group_id,
            "Starting consumer"
        );

        loop {
            let (message, position) = {
                let received = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = self.consumer.recv() => received,
                };

                match received {
                    Ok(record) => {
                        let message = record_to_message(
                            record.payload().unwrap_or_default(),
                            record
                                .headers()
                                .into_iter()
                                .flat_map(|h| h.iter())
                                .map(|h| (h.key, h.value)),
                        );
                        let position = (
                            record.topic().to_string(),
                            record.partition(),
                            record.offset(),
                        );
                        (message, position)
                    }
                    Err(e) => {
                        warn!(error = %e, topic = %self.config.topic, "Kafka consumer error");
                        continue;
                    }
                }
            };

            if let Err(e) = Self::process_message(message, handler.as_ref()).await {
                warn!(
                    error = %e,
                    partition = position.1,
                    offset = position.2,
                    "Message processing failed"
                );
            }

            if !self.config.enable_auto_commit {
                self.commit(&position.0, position.1, position.2);
            }
        }

        info!(topic = %self.config.topic, "Consumer stopped");
        Ok(())
    }

    fn commit(&self, topic: &str, partition: i32, offset: i64) {
        let mut tpl = TopicPartitionList::new();
        let result = tpl
            .add_partition_offset(topic, partition, Offset::Offset(offset + 1))
            .and_then(|_| self.consumer.commit(&tpl, CommitMode::Async));
        if let Err(e) = result {
            warn!(error = %e, partition, offset, "Offset commit failed");
        }
    }

    /// Hands a single message to the handler.
    ///
    /// This is a utility method that can also be used outside the poll loop,
    /// for example to replay a captured payload.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Handler` carrying the handler's error message.
    pub async fn process_message<H: MessageHandler + ?Sized>(
        message: FtMessage,
        handler: &H,
    ) -> Result<(), ConsumerError> {
        debug!(
            transaction_id = %message.header("X-Request-Id"),
            "Processing message"
        );

        handler
            .handle(message)
            .await
            .map_err(|e| ConsumerError::Handler(e.to_string()))
    }
}

/// Builds an [`FtMessage`] from a raw record.
///
/// Native Kafka record headers are applied first; headers carried in the
/// framed payload take precedence. Payload bytes are decoded lossily as UTF-8.
pub fn record_to_message<'a>(
    payload: &[u8],
    native_headers: impl Iterator<Item = (&'a str, Option<&'a [u8]>)>,
) -> FtMessage {
    let framed = FtMessage::parse(&String::from_utf8_lossy(payload));

    let mut headers: BTreeMap<String, String> = native_headers
        .filter_map(|(key, value)| {
            value.map(|v| (key.to_string(), String::from_utf8_lossy(v).into_owned()))
        })
        .collect();
    headers.extend(framed.headers);

    FtMessage::new(headers, framed.body)
}
