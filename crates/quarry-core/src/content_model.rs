//! Content-model resolution
//!
//! A resource's content model is decided by the `rdf:type` triples of its
//! own subject. The first entry of [`MODEL_TYPES`] that matches wins;
//! resources with no recognised type get the default sentinel.

use crate::graph::ResourceGraph;
use crate::vocab;
use quarry_config::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `rdf:type` to content model, in priority order
pub const MODEL_TYPES: &[(&str, &str)] = &[
    ("http://vocab.lib.umd.edu/model#Item", "Item"),
    ("http://vocab.lib.umd.edu/model#Issue", "Issue"),
    ("http://purl.org/ontology/bibo/Letter", "Letter"),
    ("http://vocab.lib.umd.edu/model#Poster", "Poster"),
    ("http://purl.org/spar/fabio/Page", "Page"),
    ("http://www.openarchives.org/ore/terms/Proxy", "Proxy"),
    ("http://pcdm.org/models#File", "File"),
    ("http://pcdm.org/models#Collection", "AdminSet"),
];

/// Models that are indexed as standalone search results
pub const TOP_LEVEL_MODELS: &[&str] = &["Item", "Issue", "Letter", "Poster"];

/// Model name used for prefixes when no model is recognised
pub const FALLBACK_MODEL_NAME: &str = "Resource";

/// Short string classifying a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentModelTag(String);

impl ContentModelTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The `__default__` sentinel
    pub fn default_tag() -> Self {
        Self(DEFAULT_MODEL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_MODEL
    }

    /// Human-facing model name; the sentinel maps to `Resource`
    pub fn model_name(&self) -> &str {
        if self.is_default() {
            FALLBACK_MODEL_NAME
        } else {
            &self.0
        }
    }

    /// Field name prefix: lowercased model name plus `__`
    pub fn prefix(&self) -> String {
        format!("{}__", self.model_name().to_lowercase())
    }

    pub fn is_top_level(&self) -> bool {
        TOP_LEVEL_MODELS.contains(&self.0.as_str())
    }

    /// Classify the graph's own subject
    pub fn resolve(graph: &ResourceGraph) -> Self {
        Self::resolve_subject(graph, &graph.uri)
    }

    /// Classify any subject described in `graph`
    pub fn resolve_subject(graph: &ResourceGraph, subject: &str) -> Self {
        let types = graph.types_of(subject);
        Self::from_types(&types).unwrap_or_else(Self::default_tag)
    }

    /// First model in table order whose type appears in `types`
    pub fn from_types(types: &[&str]) -> Option<Self> {
        MODEL_TYPES
            .iter()
            .find(|(rdf_type, _)| types.contains(rdf_type))
            .map(|(_, tag)| Self::new(*tag))
    }
}

impl Default for ContentModelTag {
    fn default() -> Self {
        Self::default_tag()
    }
}

impl fmt::Display for ContentModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the content model of a fetched graph. Never fails.
pub fn resolve(graph: &ResourceGraph) -> ContentModelTag {
    ContentModelTag::resolve(graph)
}

/// Whether the subject carries the `umdaccess:Published` type
pub fn is_published(graph: &ResourceGraph) -> bool {
    graph.has_type(&graph.uri, vocab::UMDACCESS_PUBLISHED)
}

/// Whether the subject carries the `umdaccess:Hidden` type
pub fn is_hidden(graph: &ResourceGraph) -> bool {
    graph.has_type(&graph.uri, vocab::UMDACCESS_HIDDEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ResourceId, Term, Triple};

    fn graph_with_types(types: &[&str]) -> ResourceGraph {
        let id = ResourceId::resolve("/obj", "http://repo");
        let triples = types
            .iter()
            .map(|t| Triple::new(&id.uri, vocab::RDF_TYPE, Term::iri(*t)))
            .collect();
        ResourceGraph::new(&id, triples)
    }

    #[test]
    fn test_untyped_resolves_to_sentinel() {
        let tag = resolve(&graph_with_types(&[]));
        assert!(tag.is_default());
        assert_eq!(tag.as_str(), "__default__");
        assert_eq!(tag.prefix(), "resource__");
    }

    #[test]
    fn test_unrecognised_type_resolves_to_sentinel() {
        let tag = resolve(&graph_with_types(&["http://example.com/Thing"]));
        assert!(tag.is_default());
    }

    #[test]
    fn test_page() {
        let tag = resolve(&graph_with_types(&["http://purl.org/spar/fabio/Page"]));
        assert_eq!(tag.as_str(), "Page");
        assert_eq!(tag.prefix(), "page__");
        assert!(!tag.is_top_level());
    }

    #[test]
    fn test_table_order_wins() {
        let tag = resolve(&graph_with_types(&[
            "http://pcdm.org/models#File",
            "http://vocab.lib.umd.edu/model#Item",
        ]));
        assert_eq!(tag.as_str(), "Item");
        assert!(tag.is_top_level());
    }

    #[test]
    fn test_only_own_subject_counts() {
        let id = ResourceId::resolve("/obj", "http://repo");
        let graph = ResourceGraph::new(
            &id,
            vec![Triple::new(
                format!("{}#member", id.uri),
                vocab::RDF_TYPE,
                Term::iri("http://purl.org/spar/fabio/Page"),
            )],
        );
        assert!(resolve(&graph).is_default());
    }

    #[test]
    fn test_collection_is_admin_set() {
        let tag = resolve(&graph_with_types(&["http://pcdm.org/models#Collection"]));
        assert_eq!(tag.model_name(), "AdminSet");
        assert_eq!(tag.prefix(), "adminset__");
    }
}
