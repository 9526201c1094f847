//! HTTP interface for Quarry
//!
//! - `GET /doc?uri=<uri-or-path>[&command=add|update][&timeout_ms=N]`
//! - `GET /health`
//!
//! Failures are returned as `application/problem+json`.

pub mod routes;
pub mod server;
pub mod solr;

mod error;

pub use error::{Problem, Result, WebError, PROBLEM_JSON};
pub use server::{router, start_server, AppState};
