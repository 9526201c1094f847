//! Configuration types
//!
//! All sections have defaults so a minimal deployment only needs to name its
//! repository endpoint.

use crate::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Key of the mandatory fallback entry in the indexer mapping.
pub const DEFAULT_MODEL: &str = "__default__";

/// Stage list used when no indexer mapping is configured at all.
pub const FALLBACK_STAGES: &[&str] = &["content_model"];

/// Top-level Quarry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuarryConfig {
    /// Source repository connection
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// IIIF link generation
    #[serde(default)]
    pub iiif: IiifConfig,

    /// Executor deadlines
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Content model to ordered stage names
    #[serde(default)]
    pub indexers: IndexerConfig,

    /// Per-stage settings, keyed by stage name
    #[serde(default)]
    pub indexer_settings: BTreeMap<String, StageSettings>,

    /// Document merge policy
    #[serde(default)]
    pub merge: MergeConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

impl QuarryConfig {
    /// Settings for one stage; stages without an entry get empty settings.
    pub fn stage_settings(&self, stage: &str) -> StageSettings {
        self.indexer_settings.get(stage).cloned().unwrap_or_default()
    }

    /// Check everything that can be checked without knowing the stage registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indexers.validate()?;
        self.iiif.validate()?;
        self.pipeline.validate()?;
        self.merge.accumulating_set()?;
        Ok(())
    }
}

/// Repository service connection
#[derive(Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Base URL of the repository REST API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Shared secret used to sign bearer tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

fn default_endpoint() -> String {
    "http://localhost:8080/fcrepo/rest".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            jwt_secret: None,
        }
    }
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("endpoint", &self.endpoint)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// IIIF identifier and URL template configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IiifConfig {
    /// Prefix prepended to identifiers derived from repository paths
    #[serde(default)]
    pub identifier_prefix: String,

    /// Manifest URL template containing one `{+id}` placeholder
    #[serde(default)]
    pub manifest_url_pattern: String,

    /// Thumbnail image URL template containing one `{+id}` placeholder
    #[serde(default)]
    pub thumbnail_url_pattern: String,
}

impl IiifConfig {
    /// Both templates are present
    pub fn is_configured(&self) -> bool {
        !self.manifest_url_pattern.is_empty() && !self.thumbnail_url_pattern.is_empty()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, template) in [
            ("iiif.manifest_url_pattern", &self.manifest_url_pattern),
            ("iiif.thumbnail_url_pattern", &self.thumbnail_url_pattern),
        ] {
            if !template.is_empty() && placeholder_count(template) != 1 {
                return Err(ConfigError::InvalidTemplate {
                    name,
                    template: template.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Number of `{+id}` / `{id}` placeholders in a URI template
pub fn placeholder_count(template: &str) -> usize {
    template.matches("{+id}").count() + template.matches("{id}").count()
}

/// Executor deadlines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Overall deadline for one document assembly
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Bound on each stage that calls out to an auxiliary service
    #[serde(default = "default_auxiliary_timeout_ms")]
    pub auxiliary_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_auxiliary_timeout_ms() -> u64 {
    5_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            auxiliary_timeout_ms: default_auxiliary_timeout_ms(),
        }
    }
}

impl PipelineConfig {
    /// Overall request deadline
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-stage auxiliary call timeout
    pub fn auxiliary_timeout(&self) -> Duration {
        Duration::from_millis(self.auxiliary_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 || self.auxiliary_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.auxiliary_timeout_ms >= self.request_timeout_ms {
            return Err(ConfigError::InvalidTimeout(format!(
                "auxiliary timeout ({}ms) must be shorter than the request timeout ({}ms)",
                self.auxiliary_timeout_ms, self.request_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Mapping of content model name to the ordered stages run for it.
///
/// The order of each list is significant: later stages see the fields
/// written by earlier ones, and that is the only way one stage can depend
/// on another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexerConfig {
    models: BTreeMap<String, Vec<String>>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            DEFAULT_MODEL.to_string(),
            FALLBACK_STAGES.iter().map(|s| s.to_string()).collect(),
        );
        Self { models }
    }
}

impl IndexerConfig {
    /// Build from an explicit mapping. Call [`IndexerConfig::validate`] before use.
    pub fn new(models: BTreeMap<String, Vec<String>>) -> Self {
        Self { models }
    }

    /// Build from `(model, [stage, ...])` pairs
    pub fn from_pairs<M, S>(pairs: impl IntoIterator<Item = (M, Vec<S>)>) -> Self
    where
        M: Into<String>,
        S: Into<String>,
    {
        Self {
            models: pairs
                .into_iter()
                .map(|(m, stages)| (m.into(), stages.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// No content model is mapped at all
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Stage list configured for exactly this model, if any
    pub fn get(&self, model: &str) -> Option<&[String]> {
        self.models.get(model).map(Vec::as_slice)
    }

    /// The mandatory fallback list
    pub fn default_stages(&self) -> &[String] {
        self.get(DEFAULT_MODEL).unwrap_or(&[])
    }

    /// Stage list for `model`, falling back to the default list
    pub fn stages_for(&self, model: &str) -> &[String] {
        self.get(model).unwrap_or_else(|| self.default_stages())
    }

    /// Iterate `(model, stages)` in model-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.models.iter().map(|(m, s)| (m.as_str(), s.as_slice()))
    }

    /// `(model, stage)` pairs where a stage name appears more than once in
    /// one list. Such stages run once per occurrence.
    pub fn duplicates(&self) -> Vec<(String, String)> {
        let mut found = Vec::new();
        for (model, stages) in &self.models {
            for (i, stage) in stages.iter().enumerate() {
                if stages[..i].contains(stage)
                    && !found.iter().any(|(m, s): &(String, String)| m == model && s == stage)
                {
                    found.push((model.clone(), stage.clone()));
                }
            }
        }
        found
    }

    /// The default entry must exist and no list may be empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.models.contains_key(DEFAULT_MODEL) {
            return Err(ConfigError::MissingDefault(DEFAULT_MODEL));
        }
        if let Some((model, _)) = self.models.iter().find(|(_, stages)| stages.is_empty()) {
            return Err(ConfigError::EmptyStageList(model.clone()));
        }
        Ok(())
    }
}

/// Settings for a single stage.
///
/// `required` decides whether a failure of the stage aborts the whole
/// document; everything else is passed through to the stage untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Override the stage's built-in severity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Stage-specific options
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl StageSettings {
    /// String option by key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }
}

/// Document merge policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Glob patterns naming fields whose contributions are unioned rather
    /// than overwritten
    #[serde(default = "default_accumulating_fields")]
    pub accumulating_fields: Vec<String>,
}

fn default_accumulating_fields() -> Vec<String> {
    vec!["*__facet".to_string()]
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            accumulating_fields: default_accumulating_fields(),
        }
    }
}

impl MergeConfig {
    /// Compile the accumulating patterns
    pub fn accumulating_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.accumulating_fields {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ConfigError::InvalidPattern {
            pattern: self.accumulating_fields.join(","),
            message: e.to_string(),
        })
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `[ADDRESS]:PORT` to listen on
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_indexers() -> IndexerConfig {
        IndexerConfig::from_pairs([
            (
                DEFAULT_MODEL,
                vec![
                    "content_model",
                    "discoverability",
                    "page_sequence",
                    "iiif_links",
                    "dates",
                    "facets",
                    "extracted_text",
                ],
            ),
            ("Page", vec!["content_model"]),
        ])
    }

    #[test]
    fn test_default_indexers_fall_back_to_content_model() {
        let config = IndexerConfig::default();
        assert_eq!(config.default_stages(), &["content_model".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stages_for_uses_model_entry_or_default() {
        let config = reference_indexers();
        assert_eq!(config.stages_for("Page"), &["content_model".to_string()]);
        assert_eq!(config.stages_for("Letter").len(), 7);
        assert_eq!(config.stages_for("Letter")[3], "iiif_links");
    }

    #[test]
    fn test_missing_default_is_rejected() {
        let config = IndexerConfig::from_pairs([("Page", vec!["content_model"])]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDefault(DEFAULT_MODEL))
        ));
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let config = IndexerConfig::from_pairs([
            (DEFAULT_MODEL, vec!["content_model"]),
            ("Item", Vec::<&str>::new()),
        ]);
        match config.validate() {
            Err(ConfigError::EmptyStageList(model)) => assert_eq!(model, "Item"),
            other => panic!("expected EmptyStageList, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_reported_once() {
        let config = IndexerConfig::from_pairs([(
            DEFAULT_MODEL,
            vec!["content_model", "dates", "content_model", "content_model"],
        )]);
        assert_eq!(
            config.duplicates(),
            vec![(DEFAULT_MODEL.to_string(), "content_model".to_string())]
        );
    }

    #[test]
    fn test_template_placeholders() {
        let mut iiif = IiifConfig {
            identifier_prefix: "fcrepo:".to_string(),
            manifest_url_pattern: "http://iiif/manifests/{+id}/manifest".to_string(),
            thumbnail_url_pattern: "http://iiif/images/{+id}/full/!100,100/0/default.jpg"
                .to_string(),
        };
        assert!(iiif.validate().is_ok());

        iiif.thumbnail_url_pattern = "http://iiif/images/{+id}/{+id}".to_string();
        assert!(matches!(
            iiif.validate(),
            Err(ConfigError::InvalidTemplate { name: "iiif.thumbnail_url_pattern", .. })
        ));
    }

    #[test]
    fn test_timeouts_must_nest() {
        let pipeline = PipelineConfig {
            request_timeout_ms: 1_000,
            auxiliary_timeout_ms: 1_000,
        };
        assert!(matches!(
            pipeline.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_accumulating_patterns() {
        let merge = MergeConfig::default();
        let set = merge.accumulating_set().unwrap();
        assert!(set.is_match("subject__facet"));
        assert!(!set.is_match("item__title__txt"));

        let bad = MergeConfig {
            accumulating_fields: vec!["[".to_string()],
        };
        assert!(matches!(
            bad.accumulating_set(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_repository_debug_redacts_secret() {
        let repo = RepositoryConfig {
            endpoint: "http://fcrepo".to_string(),
            jwt_secret: Some("hunter2".to_string()),
        };
        let printed = format!("{repo:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_stage_settings_flatten_options() {
        let settings: StageSettings =
            serde_json::from_str(r#"{"required": true, "proxy_prefix": "http://hdl/"}"#).unwrap();
        assert_eq!(settings.required, Some(true));
        assert_eq!(settings.get_str("proxy_prefix"), Some("http://hdl/"));
    }
}
