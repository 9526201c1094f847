//! Loading complete config files from disk

use quarry_config::{ConfigError, QuarryConfig, DEFAULT_MODEL};
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

const REFERENCE_YAML: &str = r#"
repository:
  endpoint: http://localhost:8080/fcrepo/rest
  jwt_secret: s3cret
iiif:
  identifier_prefix: "fcrepo:"
  manifest_url_pattern: "https://iiif.example.org/manifests/{+id}/manifest"
  thumbnail_url_pattern: "https://iiif.example.org/images/{+id}/full/!100,100/0/default.jpg"
pipeline:
  request_timeout_ms: 20000
  auxiliary_timeout_ms: 2000
indexers:
  __default__:
    - content_model
    - discoverability
    - page_sequence
    - iiif_links
    - dates
    - facets
    - extracted_text
  Page:
    - content_model
indexer_settings:
  iiif_links:
    required: false
  handles:
    proxy_prefix: "http://hdl-local/"
"#;

fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_reference_yaml() {
    let file = write_temp(".yml", REFERENCE_YAML);
    let config = QuarryConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.indexers.default_stages().len(), 7);
    assert_eq!(config.indexers.stages_for("Page"), &["content_model".to_string()]);
    assert_eq!(config.pipeline.auxiliary_timeout_ms, 2000);
    assert_eq!(config.stage_settings("iiif_links").required, Some(false));
    assert_eq!(config.repository.jwt_secret.as_deref(), Some("s3cret"));
    assert_eq!(config.merge.accumulating_fields, vec!["*__facet".to_string()]);
}

#[test]
fn test_load_json_and_toml_equivalents() {
    let json = write_temp(
        ".json",
        r#"{"indexers": {"__default__": ["content_model", "dates"]}}"#,
    );
    let from_json = QuarryConfig::from_file(json.path()).unwrap();

    let toml = write_temp(
        ".toml",
        "[indexers]\n__default__ = [\"content_model\", \"dates\"]\n",
    );
    let from_toml = QuarryConfig::from_file(toml.path()).unwrap();

    assert_eq!(from_json.indexers, from_toml.indexers);
    assert_eq!(from_json.indexers.default_stages()[1], "dates");
}

#[test]
fn test_missing_default_fails_validation() {
    let file = write_temp(".yml", "indexers:\n  Page: [content_model]\n");
    let config = QuarryConfig::from_file(file.path()).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingDefault(DEFAULT_MODEL))
    ));
}

#[test]
#[serial]
fn test_load_reads_process_environment() {
    let indexers = write_temp(".yml", "__default__: [content_model, handles]\n");
    std::env::set_var("QUARRY_INDEXERS_FILE", indexers.path());
    std::env::set_var("QUARRY_REPOSITORY_ENDPOINT", "http://env-repo/rest");

    let result = QuarryConfig::load(None);

    std::env::remove_var("QUARRY_INDEXERS_FILE");
    std::env::remove_var("QUARRY_REPOSITORY_ENDPOINT");

    let config = result.unwrap();
    assert_eq!(config.repository.endpoint, "http://env-repo/rest");
    assert_eq!(
        config.indexers.default_stages(),
        &["content_model".to_string(), "handles".to_string()]
    );
}

#[test]
#[serial]
fn test_config_file_sections_win_over_file_variables() {
    let config_file = write_temp(
        ".yml",
        "indexers:\n  __default__: [content_model, dates]\n",
    );
    let indexers = write_temp(".yml", "__default__: [content_model, handles]\n");
    let settings = write_temp(".yml", "handles:\n  proxy_prefix: \"http://hdl-local/\"\n");
    std::env::set_var("QUARRY_INDEXERS_FILE", indexers.path());
    std::env::set_var("QUARRY_INDEXER_SETTINGS_FILE", settings.path());

    let result = QuarryConfig::load(Some(config_file.path()));

    std::env::remove_var("QUARRY_INDEXERS_FILE");
    std::env::remove_var("QUARRY_INDEXER_SETTINGS_FILE");

    let config = result.unwrap();
    assert_eq!(
        config.indexers.default_stages(),
        &["content_model".to_string(), "dates".to_string()]
    );
    assert_eq!(
        config.stage_settings("handles").get_str("proxy_prefix"),
        Some("http://hdl-local/")
    );
}
