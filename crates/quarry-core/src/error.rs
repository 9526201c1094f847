//! Error types for fetching and stage execution

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a repository fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Transport failure or unexpected status
    Network,
    /// 401 / 403 from the repository
    Auth,
    /// 404 / 410 from the repository
    NotFound,
    /// Response body could not be parsed
    Malformed,
}

impl FetchErrorKind {
    /// Stable lowercase name, used in logs and problem details
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::NotFound => "not-found",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to retrieve a resource from the repository service.
///
/// Never retried inside Quarry.
#[derive(Debug, Clone, Error)]
#[error("{kind} error fetching {uri}: {message}")]
pub struct FetchError {
    /// Failure category
    pub kind: FetchErrorKind,
    /// The URI that was requested
    pub uri: String,
    /// Human-readable cause
    pub message: String,
}

impl FetchError {
    /// Create a fetch error of the given kind
    pub fn new(kind: FetchErrorKind, uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Transport failure
    pub fn network(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, uri, message)
    }

    /// Authentication / authorisation failure
    pub fn auth(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Auth, uri, message)
    }

    /// Resource does not exist
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotFound, uri, "resource not found")
    }

    /// Unparsable payload
    pub fn malformed(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Malformed, uri, message)
    }
}

/// Failure of a single stage.
///
/// Whether it aborts the document depends on the stage's severity; the
/// executor attaches the stage name.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// The stage's own logic failed
    #[error("{0}")]
    Failed(String),

    /// An auxiliary call did not complete in time
    #[error("auxiliary call timed out after {0:?}")]
    Timeout(Duration),

    /// A linked resource or binary could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The stage needs a setting that is not configured
    #[error("required setting \"{0}\" is not configured")]
    MissingSetting(String),
}

impl StageError {
    /// Create a generic failure
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Get error category for logs and warnings
    pub fn category(&self) -> &'static str {
        match self {
            Self::Failed(_) => "failed",
            Self::Timeout(_) => "timeout",
            Self::Fetch(_) => "fetch",
            Self::MissingSetting(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::not_found("http://repo/foo");
        assert_eq!(
            err.to_string(),
            "not-found error fetching http://repo/foo: resource not found"
        );
        assert_eq!(err.kind, FetchErrorKind::NotFound);
    }

    #[test]
    fn test_stage_error_category() {
        assert_eq!(StageError::Timeout(Duration::from_secs(1)).category(), "timeout");
        assert_eq!(
            StageError::from(FetchError::network("http://iiif", "refused")).category(),
            "fetch"
        );
        assert_eq!(StageError::failed("x").to_string(), "x");
    }
}
