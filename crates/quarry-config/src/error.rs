//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// Every variant is fatal to process startup; none of them can occur while
/// serving a request.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read
    #[error("Config file \"{path}\" could not be read: {source}")]
    Io {
        /// File that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A config file has a suffix we have no loader for
    #[error("Cannot open a config file with suffix \"{0}\"")]
    UnsupportedFormat(String),

    /// A config file or value failed to deserialize
    #[error("Failed to parse {origin}: {message}")]
    Parse {
        /// File name or environment variable the value came from
        origin: String,
        /// Parser message
        message: String,
    },

    /// The indexer mapping has no `__default__` entry
    #[error("Indexer configuration has no \"{0}\" entry")]
    MissingDefault(&'static str),

    /// A content model maps to an empty stage list
    #[error("Indexer list for \"{0}\" is empty")]
    EmptyStageList(String),

    /// A content model references a stage name that is not registered
    #[error("No indexer named \"{stage}\" is registered (referenced by \"{model}\")")]
    UnknownStage {
        /// Content model whose list references the stage
        model: String,
        /// The unknown stage name
        stage: String,
    },

    /// Settings exist for a stage that is not registered
    #[error("Settings given for unknown indexer \"{0}\"")]
    UnknownStageSettings(String),

    /// A URI template does not contain exactly one identifier placeholder
    #[error("{name} must contain exactly one {{+id}} or {{id}} placeholder: \"{template}\"")]
    InvalidTemplate {
        /// Config key of the template
        name: &'static str,
        /// The offending template
        template: String,
    },

    /// Timeout values are zero or inconsistent
    #[error("Invalid timeout configuration: {0}")]
    InvalidTimeout(String),

    /// A glob pattern in the merge policy failed to compile
    #[error("Invalid accumulating field pattern \"{pattern}\": {message}")]
    InvalidPattern {
        /// Pattern as written
        pattern: String,
        /// Compiler message
        message: String,
    },
}

impl ConfigError {
    /// Create a parse error
    pub fn parse(origin: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            origin: origin.into(),
            message: message.to_string(),
        }
    }
}
