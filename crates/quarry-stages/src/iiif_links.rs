//! `iiif_links`: IIIF manifest and thumbnail links
//!
//! The manifest identifier is derived from the resource's repository path;
//! thumbnails come from the first file of each page in sequence order.

use crate::sequence::PageSequence;
use quarry_core::graph::repo_path;
use quarry_core::{Fields, PipelineContext, StageError};
use serde_json::Value;
use tracing::warn;

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let links = &ctx.request.iiif;
    if !links.is_configured() {
        return Err(StageError::MissingSetting(
            "iiif.manifest_url_pattern / iiif.thumbnail_url_pattern".to_string(),
        ));
    }

    let identifier = links.identifier(&ctx.request.id.path);
    let endpoint = ctx.request.source.endpoint();

    let pages = PageSequence::from_doc(ctx.doc, &ctx.prefix());
    let mut thumbnail_ids = Vec::new();
    for (uri, page) in pages.uris().iter().zip(pages.pages()) {
        let file = page
            .and_then(|p| p.get("page__has_file"))
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .and_then(|f| f.get("id"))
            .and_then(Value::as_str);
        match file {
            Some(file) => thumbnail_ids.push(links.identifier(&repo_path(file, endpoint))),
            None => warn!("Page {uri} has no file to use as a thumbnail"),
        }
    }
    let thumbnail_uris: Vec<String> = thumbnail_ids
        .iter()
        .map(|id| links.thumbnail_url(id))
        .collect();

    Ok(Fields::from([
        ("iiif_manifest__uri".to_string(), Value::from(links.manifest_url(&identifier))),
        ("iiif_manifest__id".to_string(), Value::from(identifier)),
        ("iiif_thumbnail_sequence__ids".to_string(), Value::from(thumbnail_ids)),
        ("iiif_thumbnail_sequence__uris".to_string(), Value::from(thumbnail_uris)),
    ]))
}
