pub mod check_config;
pub mod doc;
pub mod serve;

use anyhow::{Context, Result};
use quarry_config::QuarryConfig;
use quarry_fetch::RepositoryClient;
use quarry_pipeline::Assembler;
use std::sync::Arc;

/// Assembler over the configured repository, with the built-in stages
pub fn assembler(config: &QuarryConfig) -> Result<Assembler> {
    let client = RepositoryClient::new(&config.repository);
    Assembler::new(config, Arc::new(client)).context("Invalid indexer configuration")
}
