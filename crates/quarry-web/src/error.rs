//! HTTP error rendering
//!
//! Every failure leaves the server as an RFC 9457 problem document.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use quarry_pipeline::{AssembleError, PipelineError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const PROBLEM_JSON: &str = "application/problem+json";

#[derive(Debug, Error)]
pub enum WebError {
    #[error("No uri parameter was given")]
    NoResource,

    #[error("Unknown command \"{0}\", expected add or update")]
    UnknownCommand(String),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WebError>;

/// Problem details body
#[derive(Debug, Serialize)]
pub struct Problem {
    pub status: u16,
    pub title: &'static str,
    pub details: String,
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoResource | Self::UnknownCommand(_) => StatusCode::BAD_REQUEST,
            Self::Assemble(AssembleError::Fetch(_)) => StatusCode::NOT_FOUND,
            Self::Assemble(AssembleError::Pipeline(PipelineError::Timeout { .. })) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::NoResource => "No resource requested",
            Self::UnknownCommand(_) => "Unknown command",
            Self::Assemble(AssembleError::Fetch(_)) => "Resource is not available",
            Self::Assemble(AssembleError::Pipeline(PipelineError::Timeout { .. })) => "Indexing timed out",
            Self::Assemble(_) => "Indexing failed",
            _ => "Internal server error",
        }
    }

    pub fn problem(&self) -> Problem {
        Problem {
            status: self.status().as_u16(),
            title: self.title(),
            details: self.to_string(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let problem = self.problem();
        if problem.status >= 500 {
            error!("{}: {}", problem.title, problem.details);
        }

        let body = match serde_json::to_string(&problem) {
            Ok(body) => body,
            Err(e) => format!(r#"{{"status":500,"title":"Internal server error","details":"{e}"}}"#),
        };
        (self.status(), [(header::CONTENT_TYPE, PROBLEM_JSON)], body).into_response()
    }
}
