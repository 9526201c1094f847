//! Stage registry
//!
//! Built once at startup with [`StageRegistryBuilder`], then read-only.
//! Indexer configuration is checked against it before any request is
//! served, so an unknown stage name is a startup failure rather than a
//! per-request one.

use quarry_config::{ConfigError, IndexerConfig, StageSettings};
use quarry_core::Stage;
use quarry_stages::BuiltinStage;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable mapping of stage name to implementation
#[derive(Clone, Default)]
pub struct StageRegistry {
    stages: HashMap<String, Arc<dyn Stage>>,
}

impl StageRegistry {
    pub fn builder() -> StageRegistryBuilder {
        StageRegistryBuilder::default()
    }

    /// Registry holding every [`BuiltinStage`]
    pub fn builtin() -> Self {
        Self::builder().with_builtins().build()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Stage>> {
        self.stages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Check that every stage named by `config` is registered.
    ///
    /// A name listed twice for one model is allowed and runs twice; it is
    /// only logged.
    pub fn validate(&self, config: &IndexerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        for (model, stages) in config.iter() {
            if let Some(stage) = stages.iter().find(|s| !self.contains(s)) {
                return Err(ConfigError::UnknownStage {
                    model: model.to_string(),
                    stage: stage.clone(),
                });
            }
        }
        for (model, stage) in config.duplicates() {
            warn!("Stage \"{stage}\" is listed more than once for \"{model}\" and will run once per listing");
        }
        Ok(())
    }

    /// Check that settings only name registered stages
    pub fn validate_settings(&self, settings: &BTreeMap<String, StageSettings>) -> Result<(), ConfigError> {
        match settings.keys().find(|name| !self.contains(name)) {
            Some(name) => Err(ConfigError::UnknownStageSettings(name.clone())),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.names())
            .finish()
    }
}

/// Accumulates registrations; [`StageRegistryBuilder::build`] freezes them
#[derive(Default)]
pub struct StageRegistryBuilder {
    stages: HashMap<String, Arc<dyn Stage>>,
}

impl StageRegistryBuilder {
    /// Register a stage under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register(self, stage: impl Stage + 'static) -> Self {
        self.register_arc(Arc::new(stage))
    }

    pub fn register_arc(mut self, stage: Arc<dyn Stage>) -> Self {
        let name = stage.name().to_string();
        if self.stages.insert(name.clone(), stage).is_some() {
            debug!("Replacing registered stage \"{name}\"");
        }
        self
    }

    pub fn with_builtins(self) -> Self {
        BuiltinStage::ALL
            .into_iter()
            .fold(self, |builder, stage| builder.register(stage))
    }

    pub fn build(self) -> StageRegistry {
        StageRegistry {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_config::DEFAULT_MODEL;

    #[test]
    fn test_builtin_registry_has_every_stage() {
        let registry = StageRegistry::builtin();
        assert_eq!(registry.len(), BuiltinStage::ALL.len());
        assert!(registry.contains("content_model"));
        assert!(registry.contains("aggregate_fields"));
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn test_validate_rejects_unknown_stage() {
        let config = IndexerConfig::from_pairs([
            (DEFAULT_MODEL, vec!["content_model"]),
            ("Page", vec!["content_model", "nonexistent"]),
        ]);
        let err = StageRegistry::builtin().validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownStage { ref model, ref stage } if model == "Page" && stage == "nonexistent"
        ));
    }

    #[test]
    fn test_validate_allows_duplicates() {
        let config = IndexerConfig::from_pairs([(DEFAULT_MODEL, vec!["content_model", "facets", "facets"])]);
        assert!(StageRegistry::builtin().validate(&config).is_ok());
    }

    #[test]
    fn test_validate_settings() {
        let registry = StageRegistry::builtin();
        let mut settings = BTreeMap::new();
        settings.insert("handles".to_string(), StageSettings::default());
        assert!(registry.validate_settings(&settings).is_ok());

        settings.insert("handle".to_string(), StageSettings::default());
        assert!(matches!(
            registry.validate_settings(&settings),
            Err(ConfigError::UnknownStageSettings(name)) if name == "handle"
        ));
    }
}
