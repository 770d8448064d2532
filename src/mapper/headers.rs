//! Header derivation for outbound concept annotation messages.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Transaction identifier header.
pub const X_REQUEST_ID: &str = "X-Request-Id";
/// Publishing system identifier header.
pub const ORIGIN_SYSTEM_ID: &str = "Origin-System-Id";
/// Body content type header.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Unique message identifier header.
pub const MESSAGE_ID: &str = "Message-Id";
/// Message type header.
pub const MESSAGE_TYPE: &str = "Message-Type";
/// Message creation time header.
pub const MESSAGE_TIMESTAMP: &str = "Message-Timestamp";

/// Value of `Message-Type` on every outbound message.
pub const CONCEPT_ANNOTATION_MESSAGE_TYPE: &str = "concept-annotation";

/// `chrono` format for `Message-Timestamp`, e.g. `2026-10-19T08:15:30.042Z`.
pub const MESSAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// The complete header set of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptAnnotationHeaders {
    /// Fresh UUID v4 for every outbound message.
    pub message_id: String,
    /// Always [`CONCEPT_ANNOTATION_MESSAGE_TYPE`].
    pub message_type: &'static str,
    /// Copied from the inbound message.
    pub content_type: String,
    /// Copied `X-Request-Id` (transaction id).
    pub request_id: String,
    /// Copied from the inbound message.
    pub origin_system_id: String,
    /// Creation time in [`MESSAGE_TIMESTAMP_FORMAT`].
    pub message_timestamp: String,
}

impl ConceptAnnotationHeaders {
    /// Derives outbound headers from the headers of a publish event.
    ///
    /// Only `Content-Type`, `X-Request-Id` and `Origin-System-Id` are carried
    /// over (absent ones become empty strings). The message id and timestamp
    /// are generated on every call.
    pub fn derive(inbound: &BTreeMap<String, String>) -> Self {
        Self::derive_at(inbound, Utc::now())
    }

    fn derive_at(inbound: &BTreeMap<String, String>, now: DateTime<Utc>) -> Self {
        let copy = |name: &str| inbound.get(name).cloned().unwrap_or_default();

        Self {
            message_id: Uuid::new_v4().to_string(),
            message_type: CONCEPT_ANNOTATION_MESSAGE_TYPE,
            content_type: copy(CONTENT_TYPE),
            request_id: copy(X_REQUEST_ID),
            origin_system_id: copy(ORIGIN_SYSTEM_ID),
            message_timestamp: now.format(MESSAGE_TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Converts to the header map carried on the wire.
    pub fn into_map(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (MESSAGE_ID.to_string(), self.message_id),
            (MESSAGE_TYPE.to_string(), self.message_type.to_string()),
            (CONTENT_TYPE.to_string(), self.content_type),
            (X_REQUEST_ID.to_string(), self.request_id),
            (ORIGIN_SYSTEM_ID.to_string(), self.origin_system_id),
            (MESSAGE_TIMESTAMP.to_string(), self.message_timestamp),
        ])
    }
}
