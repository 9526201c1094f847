//! `root`: the top-level object a nested resource belongs to
//!
//! Solr uses `_root_` to manage nested documents. Top-level resources get
//! no field; everything else follows `pcdm:memberOf` or `pcdm:fileOf`
//! upward until a top-level parent is found.

use quarry_core::vocab::PCDM;
use quarry_core::{ContentModelTag, Fields, PipelineContext, ResourceGraph, StageError};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

fn parent_of(graph: &ResourceGraph) -> Option<String> {
    let subject = graph.uri.as_str();
    graph
        .object_iri(subject, &format!("{PCDM}memberOf"))
        .or_else(|| graph.object_iri(subject, &format!("{PCDM}fileOf")))
        .map(str::to_string)
}

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    if ctx.model().is_top_level() {
        return Ok(Fields::new());
    }

    let mut visited = HashSet::from([ctx.graph().uri.clone()]);
    let mut parent = parent_of(ctx.graph());

    loop {
        let Some(uri) = parent else {
            return Err(StageError::failed(format!(
                "Unable to determine top-level parent of {}",
                ctx.graph().uri
            )));
        };
        if !visited.insert(uri.clone()) {
            return Err(StageError::failed(format!(
                "Cycle in parent links at {uri}"
            )));
        }

        let graph = ctx.fetch_linked(&uri).await?;
        let model = ContentModelTag::resolve(&graph);
        debug!("Parent {uri} has content model {model}");
        if model.is_top_level() {
            return Ok(Fields::from([("_root_".to_string(), Value::from(uri))]));
        }
        parent = parent_of(&graph);
    }
}
