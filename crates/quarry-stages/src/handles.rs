//! Handle identifiers and the `handles` stage
//!
//! A handle is a `{prefix}/{suffix}` pair. It is accepted as `hdl:p/s`,
//! `info:hdl/p/s`, a proxy URL such as `http://hdl.handle.net/p/s`, or bare
//! `p/s`.

use quarry_core::vocab::UMDTYPE_HANDLE;
use quarry_core::{Fields, PipelineContext, StageError};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Proxy used when the stage settings do not name one
pub const DEFAULT_PROXY_PREFIX: &str = "http://hdl.handle.net/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("Handle prefix cannot be empty")]
    EmptyPrefix,
    #[error("Handle suffix cannot be empty")]
    EmptySuffix,
    #[error("{0} does not look like a handle")]
    NotAHandle(String),
}

/// A parsed handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    pub prefix: String,
    pub suffix: String,
}

fn split_as_handle(value: &str) -> Result<Handle, HandleError> {
    let (prefix, suffix) = value
        .split_once('/')
        .ok_or_else(|| HandleError::NotAHandle(value.to_string()))?;
    if prefix.trim().is_empty() {
        return Err(HandleError::EmptyPrefix);
    }
    if suffix.trim().is_empty() {
        return Err(HandleError::EmptySuffix);
    }
    Ok(Handle {
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
    })
}

impl Handle {
    pub fn parse(value: &str, proxy_prefix: &str) -> Result<Self, HandleError> {
        if let Some(rest) = value.strip_prefix("hdl:") {
            return split_as_handle(rest);
        }
        if let Some(rest) = value.strip_prefix("info:hdl/") {
            return split_as_handle(rest);
        }
        if let Some(rest) = value.strip_prefix(proxy_prefix).filter(|_| !proxy_prefix.is_empty()) {
            return split_as_handle(rest);
        }
        if value.contains('/') {
            return split_as_handle(value);
        }
        Err(HandleError::NotAHandle(value.to_string()))
    }

    /// `hdl:{prefix}/{suffix}`
    pub fn hdl_uri(&self) -> String {
        format!("hdl:{self}")
    }

    /// `info:hdl/{prefix}/{suffix}`
    pub fn info_uri(&self) -> String {
        format!("info:hdl/{self}")
    }

    pub fn proxy_url(&self, proxy_prefix: &str) -> String {
        format!("{proxy_prefix}{self}")
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.suffix)
    }
}

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let proxy_prefix = ctx
        .settings
        .get_str("proxy_prefix")
        .unwrap_or(DEFAULT_PROXY_PREFIX);

    let graph = ctx.graph();
    let value = graph
        .about(&graph.uri)
        .filter_map(|t| t.object.as_literal())
        .find(|lit| lit.datatype.as_deref() == Some(UMDTYPE_HANDLE));

    let Some(value) = value else {
        debug!("{} has no handle", graph.uri);
        return Ok(Fields::new());
    };

    let handle = Handle::parse(&value.value, proxy_prefix)
        .map_err(|e| StageError::failed(e.to_string()))?;

    Ok(Fields::from([
        ("handle__id".to_string(), Value::from(handle.to_string())),
        ("handle__uri".to_string(), Value::from(handle.info_uri())),
        (
            "handle_proxied__uri".to_string(),
            Value::from(handle.proxy_url(proxy_prefix)),
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let expected = Handle {
            prefix: "1903.1".to_string(),
            suffix: "1673".to_string(),
        };
        for input in [
            "hdl:1903.1/1673",
            "info:hdl/1903.1/1673",
            "http://hdl.handle.net/1903.1/1673",
            "1903.1/1673",
        ] {
            assert_eq!(Handle::parse(input, DEFAULT_PROXY_PREFIX).unwrap(), expected, "{input}");
        }
        assert_eq!(
            Handle::parse("http://hdl-local/1903.1/1673", "http://hdl-local/").unwrap(),
            expected
        );
    }

    #[test]
    fn test_formats() {
        let handle = Handle::parse("1903.1/1673", DEFAULT_PROXY_PREFIX).unwrap();
        assert_eq!(handle.to_string(), "1903.1/1673");
        assert_eq!(handle.hdl_uri(), "hdl:1903.1/1673");
        assert_eq!(handle.info_uri(), "info:hdl/1903.1/1673");
        assert_eq!(
            handle.proxy_url("http://handle.example.org/"),
            "http://handle.example.org/1903.1/1673"
        );
    }

    #[test]
    fn test_invalid_handles() {
        assert_eq!(
            Handle::parse("hdl:/1673", DEFAULT_PROXY_PREFIX),
            Err(HandleError::EmptyPrefix)
        );
        assert_eq!(
            Handle::parse("1903.1/ ", DEFAULT_PROXY_PREFIX),
            Err(HandleError::EmptySuffix)
        );
        assert!(matches!(
            Handle::parse("nohandle", DEFAULT_PROXY_PREFIX),
            Err(HandleError::NotAHandle(_))
        ));
    }
}
