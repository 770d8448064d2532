//! The annotation mapper service.
//!
//! Turns one metadata publish message into at most one concept annotation
//! message:
//!
//! 1. Reject messages whose `Origin-System-Id` is not whitelisted (a skip,
//!    not an error)
//! 2. Decode the body into a [`PublishEvent`]
//! 3. Map supported predicates, dropping the rest
//! 4. Encode the [`ConceptAnnotations`] envelope and derive fresh headers
//! 5. Hand the result to the injected [`MessageProducer`]
//!
//! Any failure aborts the message and is returned to the caller; nothing is
//! retried here.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::MapperError;
use crate::kafka::{FtMessage, MessageHandler, MessageProducer};

use super::annotations::{ConceptAnnotations, PublishEvent};
use super::diagnostics::{Diagnostic, Diagnostics, TracingDiagnostics};
use super::headers::{ConceptAnnotationHeaders, ORIGIN_SYSTEM_ID, X_REQUEST_ID};
use super::whitelist::Whitelist;

/// Successful result of handling one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The origin system is not whitelisted; nothing was published.
    Skipped,
    /// One concept annotation message was published.
    Dispatched,
}

/// Maps metadata publish events to concept annotations and republishes them.
///
/// The service holds no per-message state and can be shared across tasks.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use annotation_mapper::kafka::{KafkaMessageProducer, KafkaProducerConfig};
/// use annotation_mapper::mapper::{AnnotationMapperService, Whitelist};
///
/// # fn example() -> anyhow::Result<()> {
/// let producer = KafkaMessageProducer::new(&KafkaProducerConfig::new(
///     "localhost:9092",
///     "ConceptAnnotations",
/// ))?;
/// let service = AnnotationMapperService::new(
///     Whitelist::new(r"http://cmdb\.ft\.com/systems/pac")?,
///     Arc::new(producer),
/// );
/// # Ok(())
/// # }
/// ```
pub struct AnnotationMapperService {
    whitelist: Whitelist,
    producer: Arc<dyn MessageProducer>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl AnnotationMapperService {
    /// Creates a service that reports through [`TracingDiagnostics`].
    pub fn new(whitelist: Whitelist, producer: Arc<dyn MessageProducer>) -> Self {
        Self::with_diagnostics(whitelist, producer, Arc::new(TracingDiagnostics))
    }

    /// Creates a service with an explicit diagnostics sink.
    pub fn with_diagnostics(
        whitelist: Whitelist,
        producer: Arc<dyn MessageProducer>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            whitelist,
            producer,
            diagnostics,
        }
    }

    /// The configured whitelist.
    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Handles one inbound message.
    ///
    /// # Returns
    ///
    /// `Outcome::Skipped` when the origin system is not whitelisted,
    /// `Outcome::Dispatched` once the mapped message has been sent.
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Decode`, `MapperError::Encode` or
    /// `MapperError::Dispatch`. The producer is not called after a decode or
    /// encode failure.
    pub async fn handle_message(&self, message: &FtMessage) -> Result<Outcome, MapperError> {
        let Some((uuid, outbound)) = self.map_message(message)? else {
            return Ok(Outcome::Skipped);
        };

        let transaction_id = message.header(X_REQUEST_ID);

        if let Err(e) = self.producer.send(outbound).await {
            self.diagnostics.record(&Diagnostic::SendFailed {
                transaction_id,
                uuid: &uuid,
                error: &e,
            });
            return Err(e.into());
        }

        self.diagnostics.record(&Diagnostic::Sent {
            transaction_id,
            uuid: &uuid,
        });
        Ok(Outcome::Dispatched)
    }

    /// Builds the outbound message without sending it.
    ///
    /// Returns `Ok(None)` for a whitelist skip, otherwise the content UUID
    /// and the outbound message.
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Decode` for a malformed body and
    /// `MapperError::Encode` if the envelope cannot be serialized.
    pub fn map_message(
        &self,
        message: &FtMessage,
    ) -> Result<Option<(String, FtMessage)>, MapperError> {
        let transaction_id = message.header(X_REQUEST_ID);
        let origin_system_id = message.header(ORIGIN_SYSTEM_ID);

        if !self.whitelist.is_allowed(origin_system_id) {
            self.diagnostics.record(&Diagnostic::Skipped {
                transaction_id,
                origin_system_id,
            });
            return Ok(None);
        }

        let event = match PublishEvent::decode(&message.body) {
            Ok(event) => event,
            Err(e) => {
                self.diagnostics.record(&Diagnostic::DecodeFailed {
                    transaction_id,
                    error: &e,
                });
                return Err(MapperError::Decode(e));
            }
        };

        let uuid = event.uuid.as_str();
        self.diagnostics.record(&Diagnostic::Processing {
            transaction_id,
            uuid,
        });

        let concept_annotations = ConceptAnnotations::from_event(&event, |metadata| {
            self.diagnostics.record(&Diagnostic::UnmappedPredicate {
                transaction_id,
                uuid,
                metadata,
            });
        });

        let body = match concept_annotations.encode() {
            Ok(body) => body,
            Err(e) => {
                self.diagnostics.record(&Diagnostic::EncodeFailed {
                    transaction_id,
                    uuid,
                    error: &e,
                });
                return Err(MapperError::Encode(e));
            }
        };

        let headers = ConceptAnnotationHeaders::derive(&message.headers).into_map();

        Ok(Some((event.uuid.clone(), FtMessage::new(headers, body))))
    }
}

#[async_trait]
impl MessageHandler for AnnotationMapperService {
    async fn handle(
        &self,
        message: FtMessage,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.handle_message(&message).await?;
        Ok(())
    }
}
