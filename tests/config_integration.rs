//! Configuration loading through the public API.

mod common;

use annotation_mapper::cli::Cli;
use annotation_mapper::kafka::SecurityProtocol;
use annotation_mapper::Config;
use clap::Parser;
use common::{temp_config_file, PAC};

#[test]
fn test_load_full_config_file() {
    let (_dir, path) = temp_config_file(
        r#"
kafka:
  brokers: "kafka-a:9093,kafka-b:9093"
  consumer_topic: "MetadataEvents"
  producer_topic: "Annotations"
  group_id: "mapper-test"
  auto_offset_reset: "earliest"
  security:
    protocol: "SASL_SSL"
    sasl_mechanism: "SCRAM-SHA-256"
    sasl_username: "mapper"
    sasl_password: "secret"
whitelist: 'systems/pac$'
logging:
  level: warn
  json_format: false
health:
  enabled: false
"#,
    );

    let cli = Cli::try_parse_from(["annotation-mapper", "run"]).unwrap();
    let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
    config.validate().unwrap();

    let consumer = config.consumer_config().unwrap();
    assert_eq!(consumer.brokers, "kafka-a:9093,kafka-b:9093");
    assert_eq!(consumer.topic, "MetadataEvents");
    assert_eq!(consumer.group_id, "mapper-test");
    assert_eq!(consumer.security.protocol, SecurityProtocol::SaslSsl);

    let producer = config.producer_config().unwrap();
    assert_eq!(producer.topic, "Annotations");

    assert!(config.whitelist_matcher().unwrap().is_allowed(PAC));
    assert!(!config.health.enabled);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_partial_config_fills_defaults() {
    let (_dir, path) = temp_config_file("whitelist: 'systems/pac$'\n");

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    assert_eq!(config.kafka.consumer_topic, "NativeCmsMetadataPublicationEvents");
    assert_eq!(config.kafka.producer_topic, "ConceptAnnotations");
    assert_eq!(config.health.bind_address, "0.0.0.0:8080");
    assert!(config.validate().is_ok());
}

#[test]
fn test_verbose_flag_overrides_file_level() {
    let (_dir, path) = temp_config_file("logging:\n  level: error\n");

    let cli = Cli::try_parse_from(["annotation-mapper", "--verbose", "run"]).unwrap();
    let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_config_file_is_error() {
    let (_dir, path) = temp_config_file("kafka: [not, a, map\n");
    let err = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_invalid_whitelist_fails_validation() {
    let (_dir, path) = temp_config_file("whitelist: '(pac'\n");
    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_security_protocol_fails_validation() {
    let (_dir, path) = temp_config_file("kafka:\n  security:\n    protocol: CARRIER_PIGEON\n");
    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    assert!(config.validate().is_err());
    assert!(config.consumer_config().is_err());
}

#[test]
fn test_load_ssl_and_commit_settings() {
    let (_dir, path) = temp_config_file(
        r#"
kafka:
  brokers: "kafka-a:9093"
  enable_auto_commit: false
  message_timeout_ms: 15000
  security:
    protocol: "SSL"
    ssl_ca_location: "/etc/kafka/ca.pem"
"#,
    );

    let cli = Cli::try_parse_from(["annotation-mapper", "run"]).unwrap();
    let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
    config.validate().unwrap();

    let has = |settings: &[(String, String)], key: &str, value: &str| {
        settings.iter().any(|(k, v)| k == key && v == value)
    };

    let consumer = config.consumer_config().unwrap().client_settings();
    assert!(has(&consumer, "ssl.ca.location", "/etc/kafka/ca.pem"));
    assert!(has(&consumer, "enable.auto.commit", "false"));

    let producer = config.producer_config().unwrap().client_settings();
    assert!(has(&producer, "ssl.ca.location", "/etc/kafka/ca.pem"));
    assert!(has(&producer, "message.timeout.ms", "15000"));
}
