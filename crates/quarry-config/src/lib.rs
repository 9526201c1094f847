//! # Quarry Configuration Library
//!
//! Process-wide configuration for the Quarry indexing service. Configuration
//! is read once at startup, validated, and then shared read-only for the
//! lifetime of the process.
//!
//! ## Sources (lowest to highest precedence)
//!
//! 1. Built-in defaults
//! 2. A config file (YAML, JSON or TOML, chosen by extension)
//! 3. `QUARRY_*` environment variables
//! 4. `QUARRY_INDEXERS_FILE` / `QUARRY_INDEXER_SETTINGS_FILE` indirection,
//!    with `${NAME}` substitution applied to the loaded file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_config::QuarryConfig;
//!
//! let config = QuarryConfig::load(Some("quarry.yml".as_ref()))?;
//! let stages = config.indexers.stages_for("Page");
//! # Ok::<(), quarry_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod loader;

pub use config::*;
pub use error::ConfigError;
pub use loader::{envsubst, load_structured_file, ENV_PREFIX};
