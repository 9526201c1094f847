//! Document assembly for one resource
//!
//! ```text
//! ResourceId ──> fetch graph ──> resolve content model ──> select stages
//!                                                              │
//!                         Assembled <── merge <── execute <────┘
//! ```
//!
//! The assembler owns everything that is fixed for the life of the
//! process: the validated indexer configuration, the stage registry, the
//! merge policy and the repository client. Each call builds its own
//! request context, so concurrent calls share nothing mutable.

use crate::error::{AssembleError, PipelineError, StageWarning};
use crate::executor::{Deadline, Executor};
use crate::merger::{Merger, Overwrite};
use crate::registry::StageRegistry;
use crate::selector::select;
use quarry_config::{ConfigError, IndexerConfig, PipelineConfig, QuarryConfig};
use quarry_core::{ContentModelTag, Document, IiifLinks, RequestContext, ResourceId, ResourceSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A finished document with everything recorded while building it
#[derive(Debug, Clone)]
pub struct Assembled {
    pub id: ResourceId,
    pub model: ContentModelTag,
    pub document: Document,
    pub warnings: Vec<StageWarning>,
    pub stages_run: Vec<String>,
    pub overwrites: Vec<Overwrite>,
}

pub struct Assembler {
    source: Arc<dyn ResourceSource>,
    executor: Executor,
    indexers: IndexerConfig,
    iiif: Arc<IiifLinks>,
    pipeline: PipelineConfig,
}

impl Assembler {
    /// Assembler with the built-in stages
    pub fn new(config: &QuarryConfig, source: Arc<dyn ResourceSource>) -> Result<Self, ConfigError> {
        Self::with_registry(config, StageRegistry::builtin(), source)
    }

    /// Validate `config` against `registry` and build the assembler. Any
    /// configuration problem surfaces here, before a request is served.
    pub fn with_registry(
        config: &QuarryConfig,
        registry: StageRegistry,
        source: Arc<dyn ResourceSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        registry.validate(&config.indexers)?;
        registry.validate_settings(&config.indexer_settings)?;

        let merger = Merger::from_config(&config.merge)?;
        let executor = Executor::with_settings(Arc::new(registry), merger, config.indexer_settings.clone());

        info!(
            "Document assembler ready: {} content models, {} stages registered",
            config.indexers.iter().count(),
            executor.registry().len()
        );

        Ok(Self {
            source,
            executor,
            indexers: config.indexers.clone(),
            iiif: Arc::new(IiifLinks::from_config(&config.iiif)),
            pipeline: config.pipeline.clone(),
        })
    }

    pub fn indexers(&self) -> &IndexerConfig {
        &self.indexers
    }

    pub fn registry(&self) -> &StageRegistry {
        self.executor.registry()
    }

    /// Resolve a caller-supplied URI or repository path
    pub fn resource_id(&self, input: &str) -> ResourceId {
        self.source.resource_id(input)
    }

    /// Build the document for `id`. `timeout` overrides the configured
    /// request deadline, which covers the graph fetch and every stage.
    pub async fn assemble(&self, id: &ResourceId, timeout: Option<Duration>) -> Result<Assembled, AssembleError> {
        let deadline = Deadline::after(timeout.unwrap_or_else(|| self.pipeline.request_timeout()));
        info!("Assembling document for {id}");

        let graph = match tokio::time::timeout_at(deadline.at, self.source.fetch(id)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(PipelineError::Timeout {
                    budget: deadline.budget,
                    completed: Vec::new(),
                }
                .into())
            }
        };

        let request = RequestContext::new(
            graph,
            Arc::clone(&self.source),
            Arc::clone(&self.iiif),
            self.pipeline.auxiliary_timeout(),
        );
        let stages = select(&request.model, &self.indexers);
        info!("{id} has content model {}; running {}", request.model, stages.join(", "));

        let execution = self.executor.execute(&request, stages, deadline).await?;
        info!(
            "Assembled {id}: {} fields, {} warnings",
            execution.document.len(),
            execution.warnings.len()
        );

        Ok(Assembled {
            id: request.id,
            model: request.model,
            document: execution.document,
            warnings: execution.warnings,
            stages_run: execution.stages_run,
            overwrites: execution.overwrites,
        })
    }
}
