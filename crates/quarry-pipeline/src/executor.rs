//! Pipeline executor
//!
//! Runs the selected stages strictly in order against one accumulating
//! document. Each stage sees the fields merged so far, so configuration
//! order is the only dependency mechanism between stages.
//!
//! ```text
//! for each stage name:
//!   look up stage ──> run under the request deadline
//!     ├─ Ok(fields)            merge into the document
//!     ├─ Err, required         abort with PipelineError::StageFailed
//!     ├─ Err, optional         record a StageWarning, continue
//!     └─ deadline expired      abort with PipelineError::Timeout
//! ```
//!
//! Outbound calls made inside a stage are bounded separately by the
//! auxiliary timeout in the request context.

use crate::error::{PipelineError, StageWarning};
use crate::merger::{Merger, Overwrite};
use crate::registry::StageRegistry;
use quarry_config::StageSettings;
use quarry_core::{Document, PipelineContext, RequestContext, ResourceId, Severity, Stage};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// When the whole request must be finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub at: Instant,
    pub budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub document: Document,
    /// Optional stages that failed; their fields are absent
    pub warnings: Vec<StageWarning>,
    /// Stages that completed, in execution order
    pub stages_run: Vec<String>,
    pub overwrites: Vec<Overwrite>,
}

impl Execution {
    /// Empty run whose document is keyed by the resource URI
    pub fn for_resource(id: &ResourceId) -> Self {
        let mut execution = Self::default();
        execution.document.insert("id", Value::from(id.uri.as_str()));
        execution
    }
}

pub struct Executor {
    registry: Arc<StageRegistry>,
    merger: Merger,
    settings: BTreeMap<String, StageSettings>,
    no_settings: StageSettings,
}

impl Executor {
    pub fn new(registry: Arc<StageRegistry>, merger: Merger) -> Self {
        Self::with_settings(registry, merger, BTreeMap::new())
    }

    pub fn with_settings(
        registry: Arc<StageRegistry>,
        merger: Merger,
        settings: BTreeMap<String, StageSettings>,
    ) -> Self {
        Self {
            registry,
            merger,
            settings,
            no_settings: StageSettings::default(),
        }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn settings(&self, stage: &str) -> &StageSettings {
        self.settings.get(stage).unwrap_or(&self.no_settings)
    }

    /// Severity of `stage` after applying the deployment's override
    pub fn severity(&self, stage: &dyn Stage) -> Severity {
        self.settings(stage.name())
            .required
            .map(Severity::from_required)
            .unwrap_or_else(|| stage.default_severity())
    }

    pub async fn execute(
        &self,
        request: &RequestContext,
        stages: &[String],
        deadline: Deadline,
    ) -> Result<Execution, PipelineError> {
        let mut execution = Execution::for_resource(&request.id);

        for name in stages {
            let stage = self
                .registry
                .get(name)
                .ok_or_else(|| PipelineError::UnregisteredStage(name.clone()))?;
            let settings = self.settings(name);
            let severity = self.severity(stage.as_ref());

            info!("Running {severity} stage {name} for {}", request.id);
            if !settings.options.is_empty() {
                debug!("Settings for {name}: {:?}", settings.options);
            }
            if stage.performs_io() {
                debug!(
                    "Stage {name} calls out; each call is bounded by {:?}",
                    request.auxiliary_timeout
                );
            }

            let ctx = PipelineContext::new(request, &execution.document, settings);
            let result = match tokio::time::timeout_at(deadline.at, stage.run(&ctx)).await {
                Ok(result) => result,
                Err(_) => {
                    error!(
                        "Deadline of {:?} expired during stage {name} for {}",
                        deadline.budget, request.id
                    );
                    return Err(PipelineError::Timeout {
                        budget: deadline.budget,
                        completed: execution.stages_run,
                    });
                }
            };

            match result {
                Ok(fields) => {
                    let outcome = self.merger.merge(&mut execution.document, fields);
                    for field in outcome.overwritten {
                        warn!("Stage {name} overwrote field {field}");
                        execution.overwrites.push(Overwrite {
                            field,
                            stage: name.clone(),
                        });
                    }
                    debug!(
                        "Stage {name} added {} and accumulated {} fields",
                        outcome.added.len(),
                        outcome.accumulated.len()
                    );
                    execution.stages_run.push(name.clone());
                }
                Err(cause) if severity.is_required() => {
                    error!("Required stage {name} failed for {}: {cause}", request.id);
                    return Err(PipelineError::StageFailed {
                        stage: name.clone(),
                        cause,
                    });
                }
                Err(cause) => {
                    warn!("Optional stage {name} failed for {}: {cause}", request.id);
                    execution.warnings.push(StageWarning::new(name, &cause));
                }
            }
        }

        Ok(execution)
    }
}
