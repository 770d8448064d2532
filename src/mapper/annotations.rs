//! Inbound publish events and outbound concept annotations.
//!
//! # Example
//!
//! ```rust
//! use annotation_mapper::mapper::{ConceptAnnotations, PublishEvent};
//!
//! let event = PublishEvent::decode(r#"{
//!     "uuid": "u1",
//!     "annotations": [
//!         {"conceptId": "c1", "predicate": "http://www.ft.com/ontology/annotation/about"},
//!         {"conceptId": "c2", "predicate": "http://unknown/x"}
//!     ]
//! }"#).unwrap();
//!
//! let mapped = ConceptAnnotations::from_event(&event, |_| {});
//! assert_eq!(
//!     mapped.encode().unwrap(),
//!     r#"{"uuid":"u1","annotations":[{"thing":{"id":"c1","predicate":"about"}}]}"#
//! );
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use super::predicates;

/// Metadata publish event as received on the inbound topic.
///
/// Missing or `null` fields decode to their empty values. Field names are
/// also accepted in their capitalized spelling (`UUID`, `Annotations`,
/// `ConceptId`, `Predicate`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEvent {
    /// Content item the annotations describe.
    #[serde(default, alias = "UUID", deserialize_with = "null_as_default")]
    pub uuid: String,

    /// Annotations in publication order.
    #[serde(default, alias = "Annotations", deserialize_with = "null_as_default")]
    pub annotations: Vec<RawAnnotation>,
}

/// A single annotation in a publish event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnnotation {
    /// Concept the content is annotated with.
    #[serde(default, alias = "ConceptId", deserialize_with = "null_as_default")]
    pub concept_id: String,

    /// Full ontology predicate URI.
    #[serde(default, alias = "Predicate", deserialize_with = "null_as_default")]
    pub predicate: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PublishEvent {
    /// Decodes a publish event from a JSON body.
    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Concept reference inside an outbound annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    /// Concept identifier.
    pub id: String,

    /// Short predicate name.
    pub predicate: String,
}

/// Outbound annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotated concept.
    pub thing: Thing,
}

impl Annotation {
    /// Maps a raw annotation through the predicate table.
    ///
    /// Returns `None` when the predicate is not one the model supports.
    pub fn from_raw(raw: &RawAnnotation) -> Option<Self> {
        predicates::short_name(&raw.predicate).map(|predicate| Self {
            thing: Thing {
                id: raw.concept_id.clone(),
                predicate: predicate.to_string(),
            },
        })
    }
}

/// Envelope published on the outbound topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptAnnotations {
    /// Content item the annotations describe.
    pub uuid: String,

    /// Mapped annotations in input order.
    pub annotations: Vec<Annotation>,
}

impl ConceptAnnotations {
    /// Builds the outbound envelope for an event.
    ///
    /// `on_unmapped` is called once for every annotation whose predicate is
    /// dropped, in input order.
    pub fn from_event(event: &PublishEvent, mut on_unmapped: impl FnMut(&RawAnnotation)) -> Self {
        let annotations = event
            .annotations
            .iter()
            .filter_map(|raw| {
                let mapped = Annotation::from_raw(raw);
                if mapped.is_none() {
                    on_unmapped(raw);
                }
                mapped
            })
            .collect();

        Self {
            uuid: event.uuid.clone(),
            annotations,
        }
    }

    /// Serializes the envelope to JSON.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
