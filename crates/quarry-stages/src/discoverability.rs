//! `discoverability`: whether the resource should surface in search
//!
//! A resource is discoverable when it is a top-level object, published
//! and not hidden.

use quarry_core::content_model::{is_hidden, is_published};
use quarry_core::{Fields, PipelineContext, StageError};
use serde_json::Value;

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let graph = ctx.graph();
    let published = is_published(graph);
    let hidden = is_hidden(graph);
    let top_level = ctx.model().is_top_level();

    Ok(Fields::from([
        ("is_published".to_string(), Value::Bool(published)),
        ("is_hidden".to_string(), Value::Bool(hidden)),
        ("is_top_level".to_string(), Value::Bool(top_level)),
        (
            "is_discoverable".to_string(),
            Value::Bool(top_level && published && !hidden),
        ),
    ]))
}
