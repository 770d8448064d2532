//! Annotation mapping module
//!
//! This module turns metadata publish events into concept annotation
//! messages.
//!
//! # Overview
//!
//! A publish event names a content item and lists the concepts it is
//! annotated with, each related through a full ontology predicate URI. The
//! mapper:
//!
//! 1. Accepts events only from whitelisted origin systems
//! 2. Keeps annotations whose predicate is one of six supported relations
//! 3. Rewrites each predicate to its short name
//! 4. Publishes the result with a freshly derived header set
//!
//! # Modules
//!
//! - [`predicates`]: The supported predicate table
//! - [`annotations`]: Inbound and outbound payload types
//! - [`headers`]: Outbound header derivation
//! - [`whitelist`]: Origin system filtering
//! - [`diagnostics`]: Per-message diagnostics sink
//! - [`service`]: The message handler tying these together

pub mod annotations;
pub mod diagnostics;
pub mod headers;
pub mod predicates;
pub mod service;
pub mod whitelist;

pub use annotations::{Annotation, ConceptAnnotations, PublishEvent, RawAnnotation, Thing};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, TracingDiagnostics};
pub use headers::ConceptAnnotationHeaders;
pub use service::{AnnotationMapperService, Outcome};
pub use whitelist::Whitelist;
