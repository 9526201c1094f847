use anyhow::Result;
use quarry_config::QuarryConfig;

/// Validate `config` against the built-in stages and print a summary
pub fn execute(config: QuarryConfig) -> Result<()> {
    println!("{}", summary(&config)?);
    Ok(())
}

pub fn summary(config: &QuarryConfig) -> Result<String> {
    let assembler = super::assembler(config)?;
    let mut lines = vec![format!(
        "Configuration OK: {} stages registered ({})",
        assembler.registry().len(),
        assembler.registry().names().join(", ")
    )];
    for (model, stages) in assembler.indexers().iter() {
        lines.push(format!("  {model}: {}", stages.join(", ")));
    }
    Ok(lines.join("\n"))
}
