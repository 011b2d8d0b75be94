use anyhow::Result;
use std::path::PathBuf;

use coda_etl::{AppleMusicStage, Config};

pub async fn run_apple(
    config: &Config,
    apple_dir: Option<PathBuf>,
    spotify_file: Option<PathBuf>,
) -> Result<()> {
    let input_dir = apple_dir.unwrap_or_else(|| config.input_dir.clone());
    log::info!("Processing Apple Music export in {}", input_dir.display());

    let mut stage = AppleMusicStage::new(
        input_dir.clone(),
        config.output_dir.clone(),
        config.matching,
        config.anomaly_rules()?,
    );
    if let Some(path) = spotify_file {
        stage = stage.with_spotify_events(path);
    }
    let summary = super::run_stage(&stage, &input_dir).await?;

    super::print_summary("📊 Apple Music", &summary);
    println!("\n✓ Clean Apple Music data written to {}", stage.output_path().display());
    println!("  Artist mapping report: {}", stage.mapping_path().display());
    Ok(())
}
