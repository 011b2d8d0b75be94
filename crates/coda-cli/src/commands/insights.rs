use anyhow::{Context, Result};

use coda_etl::{build_insights_pipeline, Config, ExportJob};

/// Compute all three rollups from the consolidated log.
pub async fn run_insights(config: &Config) -> Result<()> {
    let options = config.aggregate_options();
    println!("\n📈 Generating insights");
    println!("  Years: {}..={}", options.min_year, options.max_year);
    println!();

    let workflow = build_insights_pipeline(config).context("Failed to build pipeline")?;
    let state_path = config.output_dir.join("pipeline.db");
    let mut store = treadle::SqliteStateStore::open(&state_path)
        .await
        .context("Failed to open pipeline state store")?;

    super::watch_progress(&workflow);

    let job = ExportJob::new(config.input_dir.clone());
    workflow
        .advance(&job, &mut store)
        .await
        .context("Insight generation failed")?;

    println!("\n✓ Insights generated");
    super::status::print_output_files(&config.output_dir);
    Ok(())
}
