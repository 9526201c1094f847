//! Config file and environment loading

use crate::{ConfigError, IndexerConfig, QuarryConfig, StageSettings};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Prefix shared by every environment variable Quarry reads
pub const ENV_PREFIX: &str = "QUARRY_";

impl QuarryConfig {
    /// Load configuration for the process.
    ///
    /// Reads `path` if given (otherwise starts from defaults), applies the
    /// `QUARRY_*` environment, then validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (mut config, sections) = match path {
            Some(path) => Self::read_file(path)?,
            None => (Self::default(), FileSections::default()),
        };
        config.apply_env_with(std::env::vars(), sections)?;
        if config.indexers.is_empty() {
            warn!("No indexers configured; using the fallback list for every content model");
            config.indexers = IndexerConfig::default();
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. Does not validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::read_file(path).map(|(config, _)| config)
    }

    fn read_file(path: &Path) -> Result<(Self, FileSections), ConfigError> {
        info!("Loading configuration from {}", path.display());
        let value = load_structured_file(path)?;
        let sections = FileSections::of(&value);
        let config = serde_json::from_value(value)
            .map_err(|e| ConfigError::parse(path.display().to_string(), e))?;
        Ok((config, sections))
    }

    /// Apply environment overrides from `vars`.
    ///
    /// `QUARRY_INDEXERS_FILE` and `QUARRY_INDEXER_SETTINGS_FILE` name files
    /// whose contents fill the corresponding sections; `${NAME}` references
    /// inside those files are substituted from the environment (with or
    /// without the `QUARRY_` prefix). Used on its own, no section counts as
    /// already defined; [`QuarryConfig::load`] skips a `*_FILE` variable
    /// whose section the config file sets.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.apply_env_with(vars, FileSections::default())
    }

    fn apply_env_with<I>(&mut self, vars: I, sections: FileSections) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();

        for (key, value) in &vars {
            let name = &key[ENV_PREFIX.len()..];
            match name {
                "REPOSITORY_ENDPOINT" | "FCREPO_ENDPOINT" => {
                    self.repository.endpoint = value.clone()
                }
                "REPOSITORY_JWT_SECRET" | "FCREPO_JWT_SECRET" => {
                    self.repository.jwt_secret = Some(value.clone())
                }
                "IIIF_IDENTIFIER_PREFIX" => self.iiif.identifier_prefix = value.clone(),
                "IIIF_MANIFESTS_URL_PATTERN" => self.iiif.manifest_url_pattern = value.clone(),
                "IIIF_THUMBNAIL_URL_PATTERN" => self.iiif.thumbnail_url_pattern = value.clone(),
                "REQUEST_TIMEOUT_MS" => {
                    self.pipeline.request_timeout_ms = parse_number(key, value)?
                }
                "AUXILIARY_TIMEOUT_MS" => {
                    self.pipeline.auxiliary_timeout_ms = parse_number(key, value)?
                }
                "LISTEN" => self.server.listen = value.clone(),
                "INDEXERS_FILE" | "INDEXER_SETTINGS_FILE" => {}
                _ => debug!("Ignoring unrecognised environment variable {key}"),
            }
        }

        let substitutions = substitution_table(&vars);

        if let Some(file) = vars.get("QUARRY_INDEXERS_FILE") {
            if sections.indexers {
                warn!("Ignoring QUARRY_INDEXERS_FILE: indexers are set in the config file");
            } else {
                self.indexers = load_section::<IndexerConfig>(file, &substitutions)?;
            }
        }
        if let Some(file) = vars.get("QUARRY_INDEXER_SETTINGS_FILE") {
            if sections.indexer_settings {
                warn!("Ignoring QUARRY_INDEXER_SETTINGS_FILE: indexer_settings are set in the config file");
            } else {
                self.indexer_settings =
                    load_section::<BTreeMap<String, StageSettings>>(file, &substitutions)?;
            }
        }

        Ok(())
    }
}

/// Sections present in the config file itself
#[derive(Debug, Clone, Copy, Default)]
struct FileSections {
    indexers: bool,
    indexer_settings: bool,
}

impl FileSections {
    fn of(value: &Value) -> Self {
        let defined = |key: &str| value.get(key).is_some_and(|v| !v.is_null());
        Self {
            indexers: defined("indexers"),
            indexer_settings: defined("indexer_settings"),
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::parse(key, e))
}

/// Environment names usable in `${NAME}` substitutions: each `QUARRY_X`
/// variable is available as both `QUARRY_X` and `X`.
fn substitution_table(vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut table = BTreeMap::new();
    for (key, value) in vars {
        table.insert(key.clone(), value.clone());
        table.insert(key[ENV_PREFIX.len()..].to_string(), value.clone());
    }
    table
}

fn load_section<T: DeserializeOwned>(
    file: &str,
    substitutions: &BTreeMap<String, String>,
) -> Result<T, ConfigError> {
    let path = Path::new(file);
    info!("Loading {}", path.display());
    let value = envsubst(load_structured_file(path)?, substitutions);
    serde_json::from_value(value).map_err(|e| ConfigError::parse(file, e))
}

/// Read a YAML, JSON or TOML file into a JSON value, choosing the format
/// from the file suffix.
pub fn load_structured_file(path: &Path) -> Result<Value, ConfigError> {
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = path.display().to_string();

    match suffix.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| ConfigError::parse(origin, e)),
        #[cfg(feature = "yaml")]
        "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::parse(origin, e)),
        #[cfg(feature = "toml")]
        "toml" => toml::from_str(&content).map_err(|e| ConfigError::parse(origin, e)),
        other => Err(ConfigError::UnsupportedFormat(format!(".{other}"))),
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Replace `${NAME}` references in every string of `value`.
///
/// Unknown names are left as written.
pub fn envsubst(value: Value, vars: &BTreeMap<String, String>) -> Value {
    match value {
        Value::String(s) => {
            let replaced = placeholder_pattern().replace_all(&s, |caps: &regex::Captures| {
                let name = &caps[1];
                match vars.get(name) {
                    Some(v) => v.clone(),
                    None => {
                        warn!("No value for ${{{name}}} in configuration substitution");
                        caps[0].to_string()
                    }
                }
            });
            Value::String(replaced.into_owned())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| envsubst(v, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, envsubst(v, vars)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_envsubst_replaces_known_names() {
        let mut table = BTreeMap::new();
        table.insert("HANDLE_PROXY_PREFIX".to_string(), "http://hdl-local/".to_string());

        let value = json!({"handles": {"proxy_prefix": "${HANDLE_PROXY_PREFIX}", "n": 3}});
        let result = envsubst(value, &table);

        assert_eq!(result["handles"]["proxy_prefix"], "http://hdl-local/");
        assert_eq!(result["handles"]["n"], 3);
    }

    #[test]
    fn test_envsubst_leaves_unknown_names() {
        let result = envsubst(json!(["${MISSING}-x"]), &BTreeMap::new());
        assert_eq!(result, json!(["${MISSING}-x"]));
    }

    #[test]
    fn test_apply_env_overrides_scalars() {
        let mut config = QuarryConfig::default();
        config
            .apply_env(vars(&[
                ("QUARRY_REPOSITORY_ENDPOINT", "http://repo/rest"),
                ("QUARRY_IIIF_IDENTIFIER_PREFIX", "fcrepo:"),
                ("QUARRY_REQUEST_TIMEOUT_MS", "9000"),
                ("UNRELATED", "ignored"),
            ]))
            .unwrap();

        assert_eq!(config.repository.endpoint, "http://repo/rest");
        assert_eq!(config.iiif.identifier_prefix, "fcrepo:");
        assert_eq!(config.pipeline.request_timeout_ms, 9000);
    }

    #[test]
    fn test_apply_env_rejects_bad_number() {
        let mut config = QuarryConfig::default();
        let result = config.apply_env(vars(&[("QUARRY_AUXILIARY_TIMEOUT_MS", "soon")]));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_indexer_settings_file_substitution() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.yml");
        std::fs::write(&file, "handles:\n  proxy_prefix: ${HANDLE_PROXY_PREFIX}\n").unwrap();

        let mut config = QuarryConfig::default();
        config
            .apply_env(vars(&[
                ("QUARRY_HANDLE_PROXY_PREFIX", "http://hdl-local/"),
                (
                    "QUARRY_INDEXER_SETTINGS_FILE",
                    file.to_str().unwrap(),
                ),
            ]))
            .unwrap();

        assert_eq!(
            config.stage_settings("handles").get_str("proxy_prefix"),
            Some("http://hdl-local/")
        );
    }

    #[test]
    fn test_unsupported_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("indexers.ini");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            load_structured_file(&file),
            Err(ConfigError::UnsupportedFormat(s)) if s == ".ini"
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_structured_file(Path::new("/definitely/not/here.yml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
