use anyhow::Result;
use std::path::PathBuf;

use coda_etl::{Config, SpotifyStage};

pub async fn run_spotify(config: &Config, spotify_dir: Option<PathBuf>) -> Result<()> {
    let input_dir = spotify_dir.unwrap_or_else(|| config.input_dir.clone());
    log::info!("Processing Spotify export in {}", input_dir.display());

    let stage = SpotifyStage::new(
        input_dir.clone(),
        config.output_dir.clone(),
        config.spotify_filter(),
        config.anomaly_rules()?,
    );
    let summary = super::run_stage(&stage, &input_dir).await?;

    super::print_summary("📊 Spotify", &summary);
    println!("\n✓ Clean Spotify data written to {}", stage.output_path().display());
    Ok(())
}
