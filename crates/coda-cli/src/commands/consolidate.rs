use anyhow::Result;

use coda_etl::{Config, ConsolidateStage};

pub async fn run_consolidate(config: &Config) -> Result<()> {
    let stage = ConsolidateStage::new(config.output_dir.clone());
    let summary = super::run_stage(&stage, &config.input_dir).await?;

    super::print_summary("📊 Consolidated history", &summary);
    println!("\n✓ Combined data written to {}", stage.output_path().display());
    Ok(())
}
