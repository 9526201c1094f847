use crate::cli::DocCommand;
use anyhow::Result;
use quarry_config::QuarryConfig;
use quarry_web::solr::{add_command, update_command};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

pub async fn execute(
    config: QuarryConfig,
    uri: String,
    command: Option<DocCommand>,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let assembler = super::assembler(&config)?;
    let id = assembler.resource_id(&uri);
    let assembled = assembler
        .assemble(&id, timeout_ms.map(Duration::from_millis))
        .await?;

    for warning in &assembled.warnings {
        warn!("Stage {} skipped: {}", warning.stage, warning.message);
    }

    println!("{}", serde_json::to_string_pretty(&render(assembled.document.to_value(), command))?);
    Ok(())
}

/// Apply the optional Solr wrapping
pub fn render(doc: Value, command: Option<DocCommand>) -> Value {
    match (command, doc) {
        (Some(DocCommand::Add), doc) => add_command(doc),
        (Some(DocCommand::Update), Value::Object(fields)) => update_command(&fields),
        (_, doc) => doc,
    }
}
