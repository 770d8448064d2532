/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `run` starts the Kafka relay and the health endpoints
- `map` maps one publish event offline and prints the result
*/

use crate::config::Config;
use crate::error::Result;
use crate::kafka::{FtMessage, MessageProducer, ProducerError};
use crate::mapper::{AnnotationMapperService, Outcome};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

// Relay command handler
pub mod run {
    //! Long-running relay.
    //!
    //! Creates the producer, the mapper service and the consumer, serves the
    //! health endpoints and runs until Ctrl-C.

    use super::*;
    use crate::health::{self, HealthContext, HealthStatus};
    use crate::kafka::{KafkaMessageProducer, MessageConsumer};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

    /// Run the relay until interrupted
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `whitelist` - Optional whitelist pattern overriding the configured one
    /// * `no_health` - Skip the health endpoints
    ///
    /// # Errors
    ///
    /// Returns error if the whitelist is invalid or a Kafka client cannot be
    /// created.
    pub async fn run_relay(
        mut config: Config,
        whitelist: Option<String>,
        no_health: bool,
    ) -> Result<()> {
        if let Some(pattern) = whitelist {
            tracing::info!(whitelist = %pattern, "Whitelist overridden from CLI");
            config.whitelist = pattern;
        }
        if no_health {
            config.health.enabled = false;
        }

        let producer = Arc::new(
            KafkaMessageProducer::new(&config.producer_config()?)
                .context("Failed to create Kafka producer")?,
        );
        let service = Arc::new(AnnotationMapperService::new(
            config.whitelist_matcher()?,
            producer.clone(),
        ));
        let consumer = MessageConsumer::new(config.consumer_config()?)
            .context("Failed to create Kafka consumer")?;

        let status = Arc::new(HealthStatus::new());
        let shutdown = CancellationToken::new();

        let health_task = if config.health.enabled {
            let ctx = HealthContext::new(
                status.clone(),
                &config.kafka.consumer_topic,
                &config.kafka.producer_topic,
            );
            let bind = config.health.bind_address.clone();
            let token = shutdown.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = health::serve(&bind, ctx, token).await {
                    tracing::error!(error = %e, "Health endpoints failed");
                }
            }))
        } else {
            None
        };

        tracing::info!(
            consumer_topic = %consumer.topic(),
            producer_topic = %producer.topic(),
            group_id = %consumer.group_id(),
            whitelist = %service.whitelist().as_str(),
            "Annotation mapper started"
        );
        status.set_ready();

        tokio::spawn(drain_on_signal(
            tokio::signal::ctrl_c(),
            status.clone(),
            shutdown.clone(),
        ));

        consumer.run(service, shutdown.clone()).await?;

        status.set_draining();
        shutdown.cancel();
        producer.flush(FLUSH_TIMEOUT);
        if let Some(task) = health_task {
            let _ = task.await;
        }

        tracing::info!("Annotation mapper stopped");
        Ok(())
    }

    /// Starts draining once `signal` resolves.
    ///
    /// A listener that fails to install leaves the relay running.
    pub(crate) async fn drain_on_signal<F>(
        signal: F,
        status: Arc<HealthStatus>,
        shutdown: CancellationToken,
    ) where
        F: std::future::Future<Output = std::io::Result<()>>,
    {
        match signal.await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                status.set_draining();
                shutdown.cancel();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        }
    }
}

// Offline mapping command handler
pub mod map {
    //! Offline mapping of a single publish event.
    //!
    //! The input is either a bare JSON body or a full FT-framed message. The
    //! outbound message is printed instead of being published.

    use super::*;
    use crate::mapper::headers::ORIGIN_SYSTEM_ID;
    use std::io::Read;
    use std::path::Path;

    /// Map one message from `input` (stdin when `None`) and print the result
    ///
    /// # Errors
    ///
    /// Returns error if the input cannot be read, the whitelist is invalid or
    /// the body is not a publish event.
    pub async fn run_map(
        config: Config,
        input: Option<&Path>,
        origin: Option<String>,
    ) -> Result<()> {
        let raw = match input {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input {}", path.display()))?,
            None => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read input from stdin")?;
                buffer
            }
        };

        let printer = Arc::new(PrintingProducer::default());
        let service = AnnotationMapperService::new(config.whitelist_matcher()?, printer.clone());
        let message = inbound_message(&raw, origin);

        match service.handle_message(&message).await? {
            Outcome::Skipped => println!(
                "Skipped: Origin-System-Id \"{}\" does not match whitelist \"{}\"",
                message.header(ORIGIN_SYSTEM_ID),
                service.whitelist().as_str()
            ),
            Outcome::Dispatched => {
                for output in printer.take() {
                    print!("{}", output);
                    println!();
                }
            }
        }

        Ok(())
    }

    /// Builds the inbound message, filling in `Origin-System-Id` if given.
    pub(crate) fn inbound_message(raw: &str, origin: Option<String>) -> FtMessage {
        let mut message = FtMessage::parse(raw);
        if let Some(origin) = origin {
            message
                .headers
                .entry(ORIGIN_SYSTEM_ID.to_string())
                .or_insert(origin);
        }
        message
    }
}

/// Producer that renders messages instead of publishing them.
#[derive(Debug, Default)]
pub(crate) struct PrintingProducer {
    rendered: std::sync::Mutex<Vec<String>>,
}

impl PrintingProducer {
    pub(crate) fn take(&self) -> Vec<String> {
        self.rendered
            .lock()
            .map(|mut rendered| std::mem::take(&mut *rendered))
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageProducer for PrintingProducer {
    async fn send(&self, message: FtMessage) -> std::result::Result<(), ProducerError> {
        let mut rendered = self
            .rendered
            .lock()
            .map_err(|e| ProducerError::Send(e.to_string()))?;
        rendered.push(message.build());
        Ok(())
    }
}
