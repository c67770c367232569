//! Integration tests for loadgen-config

use loadgen_config::domains::logging::{LogFormat, LogLevel};
use loadgen_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = LoadGenConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("LOADGEN_API_BASE", Some("https://acme.test:4431")),
        ("LOADGEN_RATE", Some("25")),
        ("LOADGEN_RUNTIME", Some("120")),
        ("LOADGEN_MAX_REGISTRATIONS", Some("500")),
        ("LOADGEN_LOG_LEVEL", Some("debug")),
    ];

    with_vars(vars, || {
        let loader = ConfigLoader::new();
        let config = loader.from_env().unwrap();

        assert_eq!(config.target.api_base, "https://acme.test:4431");
        assert_eq!(config.target.rate, 25);
        assert_eq!(config.target.runtime, Duration::from_secs(120));
        assert_eq!(config.target.max_registrations, Some(500));
        assert_eq!(config.logging.level, LogLevel::Debug);
    });
}

#[test]
fn test_invalid_env_override_is_rejected() {
    with_vars(vec![("LOADGEN_RATE", Some("fast"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    });
}

#[test]
fn test_key_size_is_not_an_env_override() {
    with_vars(vec![("KEYSZ_KEY_SIZE", Some("2048"))], || {
        let config = ConfigLoader::with_prefix("KEYSZ").from_env().unwrap();
        assert_eq!(config.target.key_size, 256);
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("WFE_RATE", Some("7"))], || {
        let config = ConfigLoader::with_prefix("WFE").from_env().unwrap();
        assert_eq!(config.target.rate, 7);
    });
}

#[test]
fn test_yaml_config_serialization() {
    let yaml = LoadGenConfig::generate_sample();
    let parsed: LoadGenConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
}

#[test]
fn test_comprehensive_config() {
    let yaml = r#"
target:
  api_base: "https://localhost:4431"
  terms_url: "http://127.0.0.1:4001/terms/v1"
  domain_base: "example.org"
  rate: 40
  runtime: 300
  max_registrations: 1000

http:
  connect_timeout: 5
  verify_tls: false

logging:
  level: warn
  format: json

challenge_server:
  enabled: true
  binary: "/usr/local/bin/chall-srv"
  rpc_addr: "localhost:6060"
  http_one_addr: ":5002"
  shutdown_grace: 500

persistence:
  snapshot_in: "regs.json"
  snapshot_out: "regs.json"
  latency_report: "latency.json"
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    // Isolated prefix so env overrides from parallel tests never apply
    let config = ConfigLoader::with_prefix("LOADGEN_FILE_TEST")
        .from_file(file.path())
        .unwrap();
    assert_eq!(config.target.domain_base, "example.org");
    assert_eq!(config.target.rate, 40);
    assert_eq!(config.target.runtime, Duration::from_secs(300));
    assert_eq!(config.http.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.challenge_server.enabled);
    assert_eq!(config.challenge_server.shutdown_grace, Duration::from_millis(500));
    assert_eq!(
        config.persistence.latency_report.as_deref(),
        Some(std::path::Path::new("latency.json"))
    );
}

#[test]
fn test_invalid_file_config() {
    let yaml = r#"
target:
  rate: 0
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let result = ConfigLoader::with_prefix("LOADGEN_FILE_TEST").from_file(file.path());
    assert!(matches!(result, Err(ConfigError::DomainError { .. })));
}
