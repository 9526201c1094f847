//! Repository client for Quarry
//!
//! [`RepositoryClient`] implements [`quarry_core::ResourceSource`] over
//! HTTP: graphs are requested as `application/n-triples`, requests carry a
//! bearer token signed with the configured shared secret, and failures are
//! classified into [`quarry_core::FetchErrorKind`]s. Nothing is retried.

pub mod auth;
pub mod client;
pub mod link;

pub use auth::TokenSigner;
pub use client::{classify_status, RepositoryClient, NTRIPLES};
pub use link::described_by;
