use anyhow::{Context, Result};
use coda_etl::{build_pipeline, Config, ExportJob, PipelineOptions};

/// Run every stage as one treadle workflow.
///
/// Stages:
/// 1. spotify - clean the Spotify export
/// 2. apple_music - clean the Apple Music export and map artists
/// 3. consolidate - merge both logs chronologically
/// 4. lifetime, annual, artists - compute the rollups
pub async fn run_process(config: &Config, options: &PipelineOptions) -> Result<()> {
    println!("\n🎵 Coda Full Processing Pipeline\n");
    println!("  Input directory: {}", config.input_dir.display());
    if let Some(dir) = &options.spotify_dir {
        println!("  Spotify export: {}", dir.display());
    }
    if options.skip_apple_music {
        println!("  Apple Music: skipped");
    } else if let Some(dir) = &options.apple_dir {
        println!("  Apple Music export: {}", dir.display());
    }
    println!("  Output directory: {}", config.output_dir.display());
    println!();

    let workflow = build_pipeline(config, options).context("Failed to build pipeline")?;

    let state_path = config.output_dir.join("pipeline.db");
    let mut store = treadle::SqliteStateStore::open(&state_path)
        .await
        .context("Failed to open pipeline state store")?;

    let job = ExportJob::new(config.input_dir.clone());
    log::debug!("Pipeline job id: {}", treadle::WorkItem::id(&job));

    super::watch_progress(&workflow);

    workflow
        .advance(&job, &mut store)
        .await
        .context("Pipeline execution failed")?;

    println!("\n✓ Full processing pipeline complete!");
    super::status::print_output_files(&config.output_dir);

    println!("\nNext steps:");
    println!("  - Run 'coda status' to see which documents exist");
    println!("  - Run 'coda generate-insights' after editing the consolidated data");

    Ok(())
}
