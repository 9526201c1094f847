//! Stage contract
//!
//! A stage derives a set of fields from the resource graph and the fields
//! accumulated so far. Stages never see each other directly: a stage that
//! needs another stage's output reads it from the document view, which is
//! why the configured order matters.

use crate::content_model::ContentModelTag;
use crate::document::{Document, Fields};
use crate::error::StageError;
use crate::graph::{ResourceGraph, ResourceId};
use crate::iiif::IiifLinks;
use crate::source::ResourceSource;
use async_trait::async_trait;
use quarry_config::StageSettings;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Whether a stage failure aborts the whole document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Failure aborts assembly
    Required,
    /// Failure is recorded as a warning and the stage's fields are omitted
    Optional,
}

impl Severity {
    pub fn from_required(required: bool) -> Self {
        if required {
            Self::Required
        } else {
            Self::Optional
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::Optional => f.write_str("optional"),
        }
    }
}

/// Per-request state shared by every stage of one run
#[derive(Clone)]
pub struct RequestContext {
    pub id: ResourceId,
    pub graph: ResourceGraph,
    pub model: ContentModelTag,
    pub source: Arc<dyn ResourceSource>,
    pub iiif: Arc<IiifLinks>,
    /// Bound on each outbound call made by a stage
    pub auxiliary_timeout: Duration,
}

impl RequestContext {
    pub fn new(
        graph: ResourceGraph,
        source: Arc<dyn ResourceSource>,
        iiif: Arc<IiifLinks>,
        auxiliary_timeout: Duration,
    ) -> Self {
        let model = ContentModelTag::resolve(&graph);
        Self {
            id: graph.resource_id(),
            graph,
            model,
            source,
            iiif,
            auxiliary_timeout,
        }
    }

    /// Field prefix of the resource's content model
    pub fn prefix(&self) -> String {
        self.model.prefix()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("triples", &self.graph.triples.len())
            .field("auxiliary_timeout", &self.auxiliary_timeout)
            .finish()
    }
}

/// What one stage sees while it runs: the request, a read-only view of the
/// accumulated document and the stage's own settings.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub request: &'a RequestContext,
    pub doc: &'a Document,
    pub settings: &'a StageSettings,
}

impl<'a> PipelineContext<'a> {
    pub fn new(request: &'a RequestContext, doc: &'a Document, settings: &'a StageSettings) -> Self {
        Self {
            request,
            doc,
            settings,
        }
    }

    pub fn graph(&self) -> &'a ResourceGraph {
        &self.request.graph
    }

    pub fn model(&self) -> &'a ContentModelTag {
        &self.request.model
    }

    pub fn prefix(&self) -> String {
        self.request.prefix()
    }

    /// Run an outbound call under the auxiliary timeout
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, StageError>
    where
        F: Future<Output = Result<T, StageError>>,
    {
        let limit = self.request.auxiliary_timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| StageError::Timeout(limit))?
    }

    /// Fetch a linked resource from the repository
    pub async fn fetch_linked(&self, uri: &str) -> Result<ResourceGraph, StageError> {
        let id = self.request.source.resource_id(uri);
        self.bounded(async { Ok(self.request.source.fetch(&id).await?) })
            .await
    }

    /// Fetch a binary from the repository
    pub async fn fetch_binary(&self, uri: &str) -> Result<Vec<u8>, StageError> {
        self.bounded(async { Ok(self.request.source.fetch_binary(uri).await?) })
            .await
    }
}

/// A named field-derivation step
#[async_trait]
pub trait Stage: Send + Sync {
    /// Name used in indexer configuration
    fn name(&self) -> &str;

    /// Severity used when the deployment does not override it
    fn default_severity(&self) -> Severity {
        Severity::Optional
    }

    /// Whether the stage calls out to the repository or another service.
    /// Such stages are bounded by the auxiliary timeout.
    fn performs_io(&self) -> bool {
        false
    }

    /// Derive this stage's field contributions
    async fn run(&self, ctx: &PipelineContext<'_>) -> Result<Fields, StageError>;
}
