//! Tests for config module

use std::io::Write;
use std::path::Path;

use storyground::config::{Config, StorageBackend};
use storyground::report::ReportFormat;

#[test]
fn test_config_file_exists() {
    let config_path = Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_config_toml_readable() {
    let content =
        std::fs::read_to_string("config.toml").expect("Should be able to read config.toml");

    for section in [
        "[extraction]",
        "[relations]",
        "[llm]",
        "[validation]",
        "[storage]",
        "[analysis]",
        "[logging]",
    ] {
        assert!(
            content.contains(section),
            "config.toml should have {section} section"
        );
    }
}

#[test]
fn test_shipped_config_matches_defaults() {
    let config = Config::from_file(Path::new("config.toml")).unwrap();
    config.validate().unwrap();

    let defaults = Config::default();
    assert_eq!(config.extraction.concept_limit, defaults.extraction.concept_limit);
    assert_eq!(config.relations.endpoint, defaults.relations.endpoint);
    assert_eq!(config.relations.limit, defaults.relations.limit);
    assert_eq!(config.llm.model, defaults.llm.model);
    assert_eq!(config.llm.timeout_secs, None);
    assert_eq!(config.validation, defaults.validation);
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.analysis.report_format, ReportFormat::Markdown);
}

#[test]
fn test_from_file_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[llm]
model = "llama3"
timeout_secs = 60

[storage]
backend = "redis"
redis_url = "redis://cache:6379"

[analysis]
physics_check = false
report_format = "html"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.llm.model, "llama3");
    assert_eq!(config.llm.timeout_secs, Some(60));
    assert_eq!(config.storage.backend, StorageBackend::Redis);
    assert_eq!(config.storage.redis_url, "redis://cache:6379");
    assert!(!config.analysis.physics_check);
    assert_eq!(config.analysis.report_format, ReportFormat::Html);
    assert_eq!(config.extraction.concept_limit, 7);
}

#[test]
fn test_from_file_rejects_bad_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[storage\nbackend = ").unwrap();
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let err = Config::from_file(Path::new("does/not/exist.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
