//! Repository Source Trait
//!
//! Core defines how graphs and binaries are obtained; `quarry-fetch`
//! provides the HTTP implementation and [`crate::test_support`] an
//! in-memory one.

use crate::error::FetchError;
use crate::graph::{ResourceGraph, ResourceId};
use async_trait::async_trait;

/// A repository that resources can be fetched from
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Fetch the RDF description of a resource.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] whose kind distinguishes authentication
    /// failures, missing resources, transport failures and unparsable
    /// payloads. Implementations never retry.
    async fn fetch(&self, id: &ResourceId) -> Result<ResourceGraph, FetchError>;

    /// Fetch the raw bytes of a binary resource
    async fn fetch_binary(&self, uri: &str) -> Result<Vec<u8>, FetchError>;

    /// Base URL of the repository, used to turn URIs into repository paths
    fn endpoint(&self) -> &str;

    /// Resolve a URI or path against this repository
    fn resource_id(&self, uri: &str) -> ResourceId {
        ResourceId::resolve(uri, self.endpoint())
    }
}
