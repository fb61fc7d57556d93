use onebot_codec::UnknownSegmentPolicy;
use onebot_runtime::config::{
    ConfigLoader, LogFormat, LogLevel, LogOutput, RuntimeConfig, validate_config,
};
use onebot_runtime::codec_from_config;
use serde_json::json;

const YAML: &str = r#"
logging:
  level: debug
  format: pretty
  output: stderr
  filters:
    onebot_codec: trace
codec:
  unknown_segment: pass_through
correlation:
  timeout_ms: 2500
"#;

#[test]
fn yaml_document_maps_onto_schema() {
    let config: RuntimeConfig = serde_yaml::from_str(YAML).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.logging.output, LogOutput::Stderr);
    assert_eq!(config.logging.filters.get("onebot_codec"), Some(&LogLevel::Trace));
    assert_eq!(config.codec.unknown_segment, UnknownSegmentPolicy::PassThrough);
    assert!(config.codec.coerce_inline_numbers);
    assert_eq!(config.correlation.timeout_ms, 2500);
    assert_eq!(config.correlation.max_pending, 1024);
}

#[test]
fn merged_config_drives_the_codec() {
    let parsed: RuntimeConfig = serde_yaml::from_str(YAML).unwrap();
    let config = ConfigLoader::new()
        .search_path("/nonexistent/onebot")
        .without_env()
        .merge(parsed.clone())
        .load()
        .unwrap();
    assert_eq!(config, parsed);

    let codec = codec_from_config(&config);
    let segments = codec
        .decode_array(vec![json!({"type": "mystery", "data": {}})])
        .unwrap();
    assert_eq!(segments[0].kind(), "mystery");
}

#[test]
fn environment_overrides_defaults() {
    // SAFETY: no other test in this binary reads the environment.
    unsafe {
        std::env::set_var("ONEBOT_CORRELATION__TIMEOUT_MS", "5000");
        std::env::set_var("ONEBOT_CODEC__UNKNOWN_SEGMENT", "pass_through");
    }
    let result = ConfigLoader::new()
        .search_path("/nonexistent/onebot")
        .load();
    unsafe {
        std::env::remove_var("ONEBOT_CORRELATION__TIMEOUT_MS");
        std::env::remove_var("ONEBOT_CODEC__UNKNOWN_SEGMENT");
    }

    let config = result.unwrap();
    assert_eq!(config.correlation.timeout_ms, 5000);
    assert_eq!(config.codec.unknown_segment, UnknownSegmentPolicy::PassThrough);
}
