//! `described_by`: where the resource's description lives
//!
//! Binaries point at their separate description; RDF sources describe
//! themselves, so their own URI is used.

use quarry_core::{Fields, PipelineContext, StageError};
use serde_json::Value;

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let graph = ctx.graph();
    let uri = graph.described_by.as_deref().unwrap_or(&graph.uri);
    Ok(Fields::from([(
        "described_by__uri".to_string(),
        Value::from(uri),
    )]))
}
