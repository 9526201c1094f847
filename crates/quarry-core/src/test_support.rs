//! In-memory test doubles
//!
//! - **InMemorySource**: a [`ResourceSource`] backed by maps, with failure
//!   injection, artificial latency and a call log
//! - **GraphBuilder**: terse construction of resource graphs
//!
//! ```rust
//! use quarry_core::test_support::{GraphBuilder, InMemorySource};
//! use quarry_core::{vocab, ResourceSource};
//!
//! # async fn example() {
//! let source = InMemorySource::new();
//! let page = GraphBuilder::new(&source, "/page1")
//!     .rdf_type("http://purl.org/spar/fabio/Page")
//!     .literal(&format!("{}title", vocab::DCTERMS), "Page 1")
//!     .build();
//! let source = source.with_graph(page);
//!
//! let graph = source.fetch(&source.resource_id("/page1")).await.unwrap();
//! assert_eq!(graph.triples.len(), 2);
//! # }
//! ```

use crate::error::FetchError;
use crate::graph::{Literal, ResourceGraph, ResourceId, Term, Triple};
use crate::source::ResourceSource;
use crate::vocab;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Endpoint used by [`InMemorySource::new`]
pub const TEST_ENDPOINT: &str = "http://repo.test/rest";

/// Map-backed repository
#[derive(Clone, Default)]
pub struct InMemorySource {
    endpoint: String,
    graphs: HashMap<String, ResourceGraph>,
    binaries: HashMap<String, Vec<u8>>,
    failures: HashMap<String, FetchError>,
    binary_failures: HashMap<String, FetchError>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::with_endpoint(TEST_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Serve `graph` at its URI
    pub fn with_graph(mut self, graph: ResourceGraph) -> Self {
        self.graphs.insert(graph.uri.clone(), graph);
        self
    }

    pub fn with_binary(mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.binaries.insert(uri.into(), bytes.into());
        self
    }

    /// Fail graph fetches of `uri` with `error`
    pub fn with_failure(mut self, uri: impl Into<String>, error: FetchError) -> Self {
        self.failures.insert(uri.into(), error);
        self
    }

    /// Fail binary fetches of `uri` with `error`; its graph is still served
    pub fn with_binary_failure(mut self, uri: impl Into<String>, error: FetchError) -> Self {
        self.binary_failures.insert(uri.into(), error);
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URIs requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    async fn record(&self, uri: &str, failures: &HashMap<String, FetchError>) -> Result<(), FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(uri.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match failures.get(uri) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceSource for InMemorySource {
    async fn fetch(&self, id: &ResourceId) -> Result<ResourceGraph, FetchError> {
        self.record(&id.uri, &self.failures).await?;
        self.graphs
            .get(&id.uri)
            .cloned()
            .ok_or_else(|| FetchError::not_found(&id.uri))
    }

    async fn fetch_binary(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        self.record(uri, &self.binary_failures).await?;
        self.binaries
            .get(uri)
            .cloned()
            .ok_or_else(|| FetchError::not_found(uri))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Builder for the graph of one resource
pub struct GraphBuilder {
    id: ResourceId,
    subject: String,
    triples: Vec<Triple>,
}

impl GraphBuilder {
    /// Start a graph for `path` (or full URI) under the source's endpoint
    pub fn new(source: &InMemorySource, path: &str) -> Self {
        Self::for_id(source.resource_id(path))
    }

    pub fn for_id(id: ResourceId) -> Self {
        Self {
            subject: id.uri.clone(),
            id,
            triples: Vec::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.id.uri
    }

    /// Switch the subject of following triples (e.g. to a hash URI)
    pub fn about(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Switch back to the resource itself
    pub fn about_self(mut self) -> Self {
        self.subject = self.id.uri.clone();
        self
    }

    pub fn triple(mut self, predicate: &str, object: Term) -> Self {
        self.triples
            .push(Triple::new(&self.subject, predicate, object));
        self
    }

    pub fn rdf_type(self, rdf_type: &str) -> Self {
        self.triple(vocab::RDF_TYPE, Term::iri(rdf_type))
    }

    pub fn literal(self, predicate: &str, value: &str) -> Self {
        self.triple(predicate, Term::Literal(Literal::plain(value)))
    }

    pub fn lang_literal(self, predicate: &str, value: &str, language: &str) -> Self {
        self.triple(predicate, Term::Literal(Literal::lang(value, language)))
    }

    pub fn typed_literal(self, predicate: &str, value: &str, datatype: &str) -> Self {
        self.triple(predicate, Term::Literal(Literal::typed(value, datatype)))
    }

    pub fn link(self, predicate: &str, uri: &str) -> Self {
        self.triple(predicate, Term::iri(uri))
    }

    pub fn build(self) -> ResourceGraph {
        ResourceGraph::new(&self.id, self.triples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    #[tokio::test]
    async fn test_in_memory_source_serves_and_fails() {
        let source = InMemorySource::new();
        let graph = GraphBuilder::new(&source, "/a").rdf_type(vocab::PCDM).build();
        let broken = format!("{TEST_ENDPOINT}/b");
        let source = source
            .with_graph(graph)
            .with_binary(format!("{TEST_ENDPOINT}/a/text"), b"hi".to_vec())
            .with_failure(&broken, FetchError::network(&broken, "connection refused"));

        assert!(source.fetch(&source.resource_id("/a")).await.is_ok());
        assert_eq!(
            source
                .fetch(&source.resource_id("/b"))
                .await
                .unwrap_err()
                .kind,
            FetchErrorKind::Network
        );
        assert_eq!(
            source
                .fetch(&source.resource_id("/c"))
                .await
                .unwrap_err()
                .kind,
            FetchErrorKind::NotFound
        );
        assert_eq!(
            source
                .fetch_binary(&format!("{TEST_ENDPOINT}/a/text"))
                .await
                .unwrap(),
            b"hi"
        );
        assert_eq!(source.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_binary_failure_leaves_graph_served() {
        let source = InMemorySource::new();
        let file = GraphBuilder::new(&source, "/f").rdf_type(vocab::PCDM).build();
        let uri = file.uri.clone();
        let source = source
            .with_graph(file)
            .with_binary(&uri, b"text".to_vec())
            .with_binary_failure(&uri, FetchError::network(&uri, "connection refused"));

        assert!(source.fetch(&source.resource_id("/f")).await.is_ok());
        assert_eq!(
            source.fetch_binary(&uri).await.unwrap_err().kind,
            FetchErrorKind::Network
        );
    }
}
