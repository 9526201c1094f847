//! `page_sequence`: ordered page labels and URIs
//!
//! Reads the proxy documents written by `content_model`, so it must run
//! after it.

use crate::sequence::PageSequence;
use quarry_core::{Fields, PipelineContext, StageError};
use serde_json::Value;

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let prefix = ctx.prefix();
    if !ctx.doc.contains(&format!("{prefix}first")) {
        return Ok(Fields::new());
    }

    let pages = PageSequence::from_doc(ctx.doc, &prefix);
    Ok(Fields::from([
        (
            "page_label_sequence__txts".to_string(),
            Value::from(pages.labels()),
        ),
        (
            "page_uri_sequence__uris".to_string(),
            Value::from(pages.uris().to_vec()),
        ),
    ]))
}
