//! Diagnostics emitted while handling a message.
//!
//! The mapper reports what happened to each message through the
//! [`Diagnostics`] trait rather than logging directly. The default sink,
//! [`TracingDiagnostics`], turns every diagnostic into a structured
//! `tracing` event carrying `transaction_id` and, once known, `uuid`.

use tracing::{error, info, warn};

use super::annotations::RawAnnotation;

/// What happened, with the context needed to report it.
#[derive(Debug)]
pub enum Diagnostic<'a> {
    /// The origin system is not whitelisted; nothing is published.
    Skipped {
        transaction_id: &'a str,
        origin_system_id: &'a str,
    },
    /// The body is not a publish event.
    DecodeFailed {
        transaction_id: &'a str,
        error: &'a serde_json::Error,
    },
    /// The body decoded and mapping is starting.
    Processing {
        transaction_id: &'a str,
        uuid: &'a str,
    },
    /// An annotation was dropped because its predicate is not supported.
    UnmappedPredicate {
        transaction_id: &'a str,
        uuid: &'a str,
        metadata: &'a RawAnnotation,
    },
    /// The outbound envelope could not be serialized.
    EncodeFailed {
        transaction_id: &'a str,
        uuid: &'a str,
        error: &'a serde_json::Error,
    },
    /// The producer rejected the outbound message.
    SendFailed {
        transaction_id: &'a str,
        uuid: &'a str,
        error: &'a (dyn std::error::Error + 'a),
    },
    /// The outbound message was published.
    Sent {
        transaction_id: &'a str,
        uuid: &'a str,
    },
}

/// Discriminant of a [`Diagnostic`], handy for assertions and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Skipped,
    DecodeFailed,
    Processing,
    UnmappedPredicate,
    EncodeFailed,
    SendFailed,
    Sent,
}

impl Diagnostic<'_> {
    /// The diagnostic's kind.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Skipped { .. } => DiagnosticKind::Skipped,
            Self::DecodeFailed { .. } => DiagnosticKind::DecodeFailed,
            Self::Processing { .. } => DiagnosticKind::Processing,
            Self::UnmappedPredicate { .. } => DiagnosticKind::UnmappedPredicate,
            Self::EncodeFailed { .. } => DiagnosticKind::EncodeFailed,
            Self::SendFailed { .. } => DiagnosticKind::SendFailed,
            Self::Sent { .. } => DiagnosticKind::Sent,
        }
    }

    /// Transaction id of the message being handled.
    pub fn transaction_id(&self) -> &str {
        match self {
            Self::Skipped { transaction_id, .. }
            | Self::DecodeFailed { transaction_id, .. }
            | Self::Processing { transaction_id, .. }
            | Self::UnmappedPredicate { transaction_id, .. }
            | Self::EncodeFailed { transaction_id, .. }
            | Self::SendFailed { transaction_id, .. }
            | Self::Sent { transaction_id, .. } => *transaction_id,
        }
    }

    /// Content UUID, once the body has been decoded.
    pub fn uuid(&self) -> Option<&str> {
        match self {
            Self::Skipped { .. } | Self::DecodeFailed { .. } => None,
            Self::Processing { uuid, .. }
            | Self::UnmappedPredicate { uuid, .. }
            | Self::EncodeFailed { uuid, .. }
            | Self::SendFailed { uuid, .. }
            | Self::Sent { uuid, .. } => Some(*uuid),
        }
    }
}

/// Sink for mapper diagnostics.
pub trait Diagnostics: Send + Sync {
    /// Records one diagnostic.
    fn record(&self, diagnostic: &Diagnostic<'_>);
}

/// Reports diagnostics as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        match diagnostic {
            Diagnostic::Skipped {
                transaction_id,
                origin_system_id,
            } => info!(
                transaction_id = %transaction_id,
                origin_system_id = %origin_system_id,
                "Skipping annotations published with Origin-System-Id \"{}\". It does not match the configured whitelist.",
                origin_system_id
            ),
            Diagnostic::DecodeFailed {
                transaction_id,
                error,
            } => error!(
                transaction_id = %transaction_id,
                error = %error,
                "Cannot unmarshal message body"
            ),
            Diagnostic::Processing {
                transaction_id,
                uuid,
            } => info!(
                transaction_id = %transaction_id,
                uuid = %uuid,
                "Processing metadata publish event"
            ),
            Diagnostic::UnmappedPredicate {
                transaction_id,
                uuid,
                metadata,
            } => warn!(
                transaction_id = %transaction_id,
                uuid = %uuid,
                concept_id = %metadata.concept_id,
                predicate = %metadata.predicate,
                "metadata for an unsupported predicate was not mapped"
            ),
            Diagnostic::EncodeFailed {
                transaction_id,
                uuid,
                error,
            } => error!(
                transaction_id = %transaction_id,
                uuid = %uuid,
                error = %error,
                "Error marshalling the concept annotations"
            ),
            Diagnostic::SendFailed {
                transaction_id,
                uuid,
                error,
            } => error!(
                transaction_id = %transaction_id,
                uuid = %uuid,
                error = %error,
                "Error sending concept annotation to queue"
            ),
            Diagnostic::Sent {
                transaction_id,
                uuid,
            } => info!(
                transaction_id = %transaction_id,
                uuid = %uuid,
                "Sent annotation message to queue"
            ),
        }
    }
}
