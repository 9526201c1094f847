//! Stage selection by content model

use quarry_config::IndexerConfig;
use quarry_core::ContentModelTag;
use tracing::debug;

/// Ordered stage names for `tag`: its own list if configured, otherwise the
/// default list. Performs no execution.
pub fn select<'c>(tag: &ContentModelTag, config: &'c IndexerConfig) -> &'c [String] {
    match config.get(tag.as_str()) {
        Some(stages) => stages,
        None => {
            debug!("No indexers configured for {tag}, using the default list");
            config.default_stages()
        }
    }
}
