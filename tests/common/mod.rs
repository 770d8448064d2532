use annotation_mapper::kafka::{FtMessage, MessageProducer, ProducerError};
use annotation_mapper::mapper::{Diagnostic, DiagnosticKind, Diagnostics};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

pub const PAC: &str = "http://cmdb.ft.com/systems/pac";
pub const MENTIONS: &str = "http://www.ft.com/ontology/annotation/mentions";
pub const ABOUT: &str = "http://www.ft.com/ontology/annotation/about";

/// Producer that keeps every message it is asked to send.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingProducer {
    pub sent: Mutex<Vec<FtMessage>>,
    pub fail_with: Option<String>,
}

#[allow(dead_code)]
impl RecordingProducer {
    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<FtMessage> {
        self.sent.lock().expect("producer lock poisoned").clone()
    }
}

#[async_trait]
impl MessageProducer for RecordingProducer {
    async fn send(&self, message: FtMessage) -> Result<(), ProducerError> {
        if let Some(reason) = &self.fail_with {
            return Err(ProducerError::Send(reason.clone()));
        }
        self.sent.lock().expect("producer lock poisoned").push(message);
        Ok(())
    }
}

/// Diagnostics sink that keeps `(kind, transaction_id, uuid)` triples.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingDiagnostics {
    pub events: Mutex<Vec<(DiagnosticKind, String, Option<String>)>>,
}

#[allow(dead_code)]
impl RecordingDiagnostics {
    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.events
            .lock()
            .expect("diagnostics lock poisoned")
            .iter()
            .map(|(kind, _, _)| *kind)
            .collect()
    }

    pub fn events(&self) -> Vec<(DiagnosticKind, String, Option<String>)> {
        self.events.lock().expect("diagnostics lock poisoned").clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        self.events.lock().expect("diagnostics lock poisoned").push((
            diagnostic.kind(),
            diagnostic.transaction_id().to_string(),
            diagnostic.uuid().map(str::to_string),
        ));
    }
}

/// Builds an inbound message with the usual three headers.
#[allow(dead_code)]
pub fn inbound(origin: &str, transaction_id: &str, body: &str) -> FtMessage {
    let headers = BTreeMap::from([
        ("X-Request-Id".to_string(), transaction_id.to_string()),
        ("Origin-System-Id".to_string(), origin.to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]);
    FtMessage::new(headers, body)
}

/// Builds a publish event body from `(conceptId, predicate)` pairs.
#[allow(dead_code)]
pub fn event_body(uuid: &str, annotations: &[(&str, &str)]) -> String {
    let annotations: Vec<_> = annotations
        .iter()
        .map(|(concept_id, predicate)| {
            serde_json::json!({ "conceptId": concept_id, "predicate": predicate })
        })
        .collect();
    serde_json::json!({ "uuid": uuid, "annotations": annotations }).to_string()
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("annotation-mapper.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
