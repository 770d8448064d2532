//! End-to-end tests for the mapping pipeline through the public API.

mod common;

use annotation_mapper::kafka::consumer::record_to_message;
use annotation_mapper::kafka::{FtMessage, MessageConsumer};
use annotation_mapper::mapper::{
    AnnotationMapperService, ConceptAnnotations, DiagnosticKind, Outcome, Whitelist,
};
use annotation_mapper::MapperError;
use chrono::NaiveDateTime;
use common::{event_body, inbound, RecordingDiagnostics, RecordingProducer, ABOUT, MENTIONS, PAC};
use std::sync::Arc;

fn service_with(
    whitelist: &str,
    producer: Arc<RecordingProducer>,
) -> (AnnotationMapperService, Arc<RecordingDiagnostics>) {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let service = AnnotationMapperService::with_diagnostics(
        Whitelist::new(whitelist).unwrap(),
        producer,
        diagnostics.clone(),
    );
    (service, diagnostics)
}

#[tokio::test]
async fn test_worked_example_maps_and_drops() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, diagnostics) = service_with(r"systems/pac$", producer.clone());

    let body = r#"{"uuid":"u1","annotations":[{"conceptId":"c1","predicate":"http://www.ft.com/ontology/annotation/about"},{"conceptId":"c2","predicate":"http://unknown/x"}]}"#;
    let outcome = service
        .handle_message(&inbound(PAC, "tid_example", body))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Dispatched);
    let sent = producer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].body,
        r#"{"uuid":"u1","annotations":[{"thing":{"id":"c1","predicate":"about"}}]}"#
    );
    assert_eq!(
        diagnostics.kinds(),
        vec![
            DiagnosticKind::Processing,
            DiagnosticKind::UnmappedPredicate,
            DiagnosticKind::Sent
        ]
    );
}

#[tokio::test]
async fn test_non_whitelisted_origins_never_reach_producer() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, diagnostics) = service_with(r"^http://cmdb\.ft\.com/systems/pac$", producer.clone());
    let body = event_body("u1", &[("c1", ABOUT)]);

    for origin in [
        "",
        "http://cmdb.ft.com/systems/methode-web-pub",
        "http://cmdb.ft.com/systems/pac-staging",
        "HTTP://CMDB.FT.COM/SYSTEMS/PAC",
    ] {
        let outcome = service
            .handle_message(&inbound(origin, "tid_skip", &body))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped, "origin {:?}", origin);
    }

    assert!(producer.sent().is_empty());
    assert!(diagnostics
        .kinds()
        .iter()
        .all(|kind| *kind == DiagnosticKind::Skipped));
}

#[tokio::test]
async fn test_every_supported_predicate_maps_once_per_occurrence() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, _) = service_with(".*", producer.clone());

    let mut pairs: Vec<(String, &str)> = Vec::new();
    for (i, (uri, _)) in annotation_mapper::mapper::predicates::PREDICATES
        .iter()
        .enumerate()
    {
        pairs.push((format!("concept-{}", i), uri));
        pairs.push((format!("concept-{}-again", i), uri));
    }
    let borrowed: Vec<(&str, &str)> = pairs.iter().map(|(c, p)| (c.as_str(), *p)).collect();

    service
        .handle_message(&inbound(PAC, "tid_all", &event_body("u2", &borrowed)))
        .await
        .unwrap();

    let sent = producer.sent();
    let envelope: ConceptAnnotations = serde_json::from_str(&sent[0].body).unwrap();
    assert_eq!(envelope.uuid, "u2");
    assert_eq!(envelope.annotations.len(), borrowed.len());

    for (annotation, (concept_id, uri)) in envelope.annotations.iter().zip(&borrowed) {
        let expected = annotation_mapper::mapper::predicates::short_name(uri).unwrap();
        assert_eq!(annotation.thing.id, *concept_id);
        assert_eq!(annotation.thing.predicate, expected);
    }
}

#[tokio::test]
async fn test_unmapped_count_is_subtracted() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, diagnostics) = service_with(".*", producer.clone());

    let body = event_body(
        "u3",
        &[
            ("c1", MENTIONS),
            ("c2", "http://www.ft.com/ontology/annotation/Mentions"),
            ("c3", "http://www.ft.com/ontology/annotation/mentions/"),
            ("c4", ABOUT),
            ("c5", ""),
        ],
    );
    service
        .handle_message(&inbound(PAC, "tid_count", &body))
        .await
        .unwrap();

    let envelope: ConceptAnnotations = serde_json::from_str(&producer.sent()[0].body).unwrap();
    let ids: Vec<_> = envelope.annotations.iter().map(|a| a.thing.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c4"]);

    let unmapped = diagnostics
        .kinds()
        .into_iter()
        .filter(|kind| *kind == DiagnosticKind::UnmappedPredicate)
        .count();
    assert_eq!(unmapped, 3);
}

#[tokio::test]
async fn test_empty_annotations_still_dispatch() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, _) = service_with(".*", producer.clone());

    let outcome = service
        .handle_message(&inbound(PAC, "tid_empty", r#"{"uuid":"u1","annotations":[]}"#))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Dispatched);
    let sent = producer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, r#"{"uuid":"u1","annotations":[]}"#);
}

#[tokio::test]
async fn test_malformed_body_is_decode_failure() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, diagnostics) = service_with(".*", producer.clone());

    for body in ["", "{", "not json", r#"{"uuid":"u1","annotations":"nope"}"#] {
        let err = service
            .handle_message(&inbound(PAC, "tid_bad", body))
            .await
            .unwrap_err();
        assert!(matches!(err, MapperError::Decode(_)), "body {:?}", body);
    }

    assert!(producer.sent().is_empty());
    assert!(diagnostics
        .kinds()
        .iter()
        .all(|kind| *kind == DiagnosticKind::DecodeFailed));
}

#[tokio::test]
async fn test_send_failure_is_returned() {
    let producer = Arc::new(RecordingProducer::failing("broker unavailable"));
    let (service, diagnostics) = service_with(".*", producer);

    let err = service
        .handle_message(&inbound(PAC, "tid_send", &event_body("u1", &[("c1", ABOUT)])))
        .await
        .unwrap_err();

    assert!(matches!(err, MapperError::Dispatch(_)));
    assert!(err.to_string().contains("broker unavailable"));
    let events = diagnostics.events();
    let last = events.last().unwrap();
    assert_eq!(last.0, DiagnosticKind::SendFailed);
    assert_eq!(last.1, "tid_send");
    assert_eq!(last.2.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_outbound_headers_are_fresh_closed_set() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, _) = service_with(".*", producer.clone());

    let mut message = inbound(PAC, "tid_headers", &event_body("u1", &[("c1", ABOUT)]));
    message
        .headers
        .insert("X-Trace-Parent".to_string(), "00-abc".to_string());
    message
        .headers
        .insert("Message-Id".to_string(), "inbound-id".to_string());

    service.handle_message(&message).await.unwrap();
    service.handle_message(&message).await.unwrap();

    let sent = producer.sent();
    assert_eq!(sent.len(), 2);
    for out in &sent {
        let keys: Vec<_> = out.headers.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "Content-Type",
                "Message-Id",
                "Message-Timestamp",
                "Message-Type",
                "Origin-System-Id",
                "X-Request-Id"
            ]
        );
        assert_eq!(out.header("Message-Type"), "concept-annotation");
        assert_eq!(out.header("Content-Type"), "application/json");
        assert_eq!(out.header("X-Request-Id"), "tid_headers");
        assert_eq!(out.header("Origin-System-Id"), PAC);
        assert_ne!(out.header("Message-Id"), "inbound-id");
    }
    assert_ne!(sent[0].header("Message-Id"), sent[1].header("Message-Id"));

    let format = "%Y-%m-%dT%H:%M:%S%.3fZ";
    let first = NaiveDateTime::parse_from_str(sent[0].header("Message-Timestamp"), format).unwrap();
    let second =
        NaiveDateTime::parse_from_str(sent[1].header("Message-Timestamp"), format).unwrap();
    assert!(first <= second);
}

#[tokio::test]
async fn test_concurrent_invocations_share_service() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, _) = service_with(".*", producer.clone());
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let body = event_body(&format!("u{}", i), &[("c1", ABOUT)]);
            service
                .handle_message(&inbound(PAC, &format!("tid_{}", i), &body))
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), Outcome::Dispatched);
    }

    assert_eq!(producer.sent().len(), 16);
}

#[tokio::test]
async fn test_wire_record_through_consumer_handler() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, _) = service_with(r"systems/pac$", producer.clone());

    let framed = format!(
        "FTMSG/1.0\r\nX-Request-Id: tid_wire\r\nOrigin-System-Id: {}\r\nContent-Type: application/json\r\n\r\n{}",
        PAC,
        event_body("u9", &[("c1", MENTIONS)])
    );
    let message = record_to_message(framed.as_bytes(), std::iter::empty());

    MessageConsumer::process_message(message, &service)
        .await
        .unwrap();

    let sent = producer.sent();
    assert_eq!(sent.len(), 1);
    let rebuilt = FtMessage::parse(&sent[0].build());
    assert_eq!(rebuilt, sent[0]);
    assert_eq!(rebuilt.header("X-Request-Id"), "tid_wire");
}

#[tokio::test]
async fn test_null_predicate_drops_one_annotation_and_dispatches_rest() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, diagnostics) = service_with(".*", producer.clone());

    let body = format!(
        r#"{{"uuid":"u1","annotations":[{{"conceptId":"c1","predicate":null}},{{"conceptId":"c2","predicate":"{}"}}]}}"#,
        ABOUT
    );
    let outcome = service
        .handle_message(&inbound(PAC, "tid_null", &body))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Dispatched);
    assert_eq!(
        producer.sent()[0].body,
        r#"{"uuid":"u1","annotations":[{"thing":{"id":"c2","predicate":"about"}}]}"#
    );
    assert!(diagnostics
        .kinds()
        .contains(&DiagnosticKind::UnmappedPredicate));
}

#[tokio::test]
async fn test_capitalized_field_names_are_mapped() {
    let producer = Arc::new(RecordingProducer::default());
    let (service, _) = service_with(".*", producer.clone());

    let body = format!(
        r#"{{"UUID":"u1","Annotations":[{{"ConceptId":"c1","Predicate":"{}"}}]}}"#,
        MENTIONS
    );
    service
        .handle_message(&inbound(PAC, "tid_caps", &body))
        .await
        .unwrap();

    assert_eq!(
        producer.sent()[0].body,
        r#"{"uuid":"u1","annotations":[{"thing":{"id":"c1","predicate":"mentions"}}]}"#
    );
}
