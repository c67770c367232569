use loadgen_logging::{
    build_env_filter, init_logging_from_config, LogFormat, LogLevel, LoggingConfig,
};

#[test]
fn test_env_filter_with_directives() {
    let config = LoggingConfig {
        level: LogLevel::Debug,
        directives: vec!["hyper=warn".to_string(), "reqwest=info".to_string()],
        ..Default::default()
    };

    assert!(build_env_filter(&config).is_ok());
}

#[test]
fn test_env_filter_rejects_bad_directive() {
    if std::env::var("RUST_LOG").is_ok() {
        return;
    }

    let config = LoggingConfig {
        directives: vec!["hyper=loud".to_string()],
        ..Default::default()
    };

    assert!(build_env_filter(&config).is_err());
}

#[test]
fn test_repeated_initialisation_is_tolerated() {
    let config = LoggingConfig {
        format: LogFormat::Json,
        ..Default::default()
    };

    init_logging_from_config(&config).unwrap();
    init_logging_from_config(&LoggingConfig::default()).unwrap();
}
