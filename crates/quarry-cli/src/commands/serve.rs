use anyhow::Result;
use quarry_config::QuarryConfig;
use std::sync::Arc;

pub async fn execute(config: QuarryConfig, listen: Option<String>) -> Result<()> {
    let assembler = Arc::new(super::assembler(&config)?);
    let listen = listen.unwrap_or(config.server.listen);
    quarry_web::start_server(&listen, assembler).await?;
    Ok(())
}
