//! Pipeline and assembly errors

use quarry_core::{FetchError, StageError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure of a pipeline run. No partial document accompanies it.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A required stage failed
    #[error("Stage \"{stage}\" failed: {cause}")]
    StageFailed {
        /// Name of the failing stage
        stage: String,
        /// What went wrong
        #[source]
        cause: StageError,
    },

    /// The overall request deadline expired
    #[error("Document assembly exceeded its {budget:?} deadline after {} completed stages", completed.len())]
    Timeout {
        /// The deadline that was exceeded
        budget: Duration,
        /// Stages that finished before the deadline, in order
        completed: Vec<String>,
    },

    /// A stage name reached the executor without being registered
    #[error("Stage \"{0}\" is not registered")]
    UnregisteredStage(String),
}

impl PipelineError {
    /// Name of the stage the error is attributed to, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stage, .. } | Self::UnregisteredStage(stage) => Some(stage),
            Self::Timeout { .. } => None,
        }
    }
}

/// Failure to assemble a document for one resource
#[derive(Debug, Clone, Error)]
pub enum AssembleError {
    /// The resource graph could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The pipeline aborted
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AssembleError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Pipeline(PipelineError::Timeout { .. }))
    }
}

/// Failure of an optional stage, recorded alongside the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageWarning {
    /// Name of the failing stage
    pub stage: String,
    /// Error category (`failed`, `timeout`, `fetch`, `config`)
    pub category: &'static str,
    /// Human-readable cause
    pub message: String,
}

impl StageWarning {
    pub fn new(stage: impl Into<String>, cause: &StageError) -> Self {
        Self {
            stage: stage.into(),
            category: cause.category(),
            message: cause.to_string(),
        }
    }
}
