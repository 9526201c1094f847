//! Document endpoint
//!
//! `GET /doc?uri=...` assembles the document for one repository resource
//! and returns it either bare or wrapped as a Solr update command.

use crate::server::AppState;
use crate::solr::{add_command, update_command};
use crate::{Result, WebError};
use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const WARNINGS_HEADER: HeaderName = HeaderName::from_static("x-quarry-warnings");

const JSON_UTF8: &str = "application/json;charset=utf-8";

pub fn doc_routes() -> Router<AppState> {
    Router::new().route("/doc", get(get_doc))
}

#[derive(Debug, Default, Deserialize)]
pub struct DocQuery {
    pub uri: Option<String>,
    pub command: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// How the assembled document is wrapped in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// The document itself
    #[default]
    Document,
    /// `{"add": {"doc": ...}}`
    Add,
    /// `[{"id": ..., "field": {"set": ...}}]`
    Update,
}

impl FromStr for Command {
    type Err = WebError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            other => Err(WebError::UnknownCommand(other.to_string())),
        }
    }
}

impl Command {
    fn wrap(self, doc: Value) -> Value {
        match (self, doc) {
            (Self::Add, doc) => add_command(doc),
            (Self::Update, Value::Object(fields)) => update_command(&fields),
            (_, doc) => doc,
        }
    }
}

async fn get_doc(State(state): State<AppState>, Query(query): Query<DocQuery>) -> Result<Response> {
    let uri = query
        .uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .ok_or(WebError::NoResource)?;
    let command = query
        .command
        .as_deref()
        .map(Command::from_str)
        .transpose()?
        .unwrap_or_default();
    let timeout = query.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis);

    let id = state.assembler.resource_id(uri);
    let assembled = state.assembler.assemble(&id, timeout).await?;

    for warning in &assembled.warnings {
        warn!(
            "{id}: stage {} ({}) skipped: {}",
            warning.stage, warning.category, warning.message
        );
    }
    info!(
        "Served {id} as {command:?} with {} warnings",
        assembled.warnings.len()
    );

    let body = serde_json::to_string(&command.wrap(assembled.document.to_value()))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, JSON_UTF8.to_string()),
            (WARNINGS_HEADER, assembled.warnings.len().to_string()),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!("add".parse::<Command>().unwrap(), Command::Add);
        assert_eq!("update".parse::<Command>().unwrap(), Command::Update);
        assert!(matches!(
            "delete".parse::<Command>(),
            Err(WebError::UnknownCommand(c)) if c == "delete"
        ));
    }

    #[test]
    fn test_document_command_passes_through() {
        let doc = serde_json::json!({"id": "a"});
        assert_eq!(Command::Document.wrap(doc.clone()), doc);
    }
}
