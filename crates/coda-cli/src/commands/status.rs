use anyhow::Result;
use std::path::Path;

use coda_etl::{io, Config};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn describe(file: &str) -> &'static str {
    match file {
        io::SPOTIFY_EVENTS_FILE => "Clean Spotify data",
        io::APPLE_MUSIC_EVENTS_FILE => "Clean Apple Music data",
        io::ARTIST_MAPPING_FILE => "Apple Music artist mapping",
        io::CONSOLIDATED_EVENTS_FILE => "Combined streaming data",
        io::LIFETIME_STATS_FILE => "Lifetime statistics",
        io::ANNUAL_RECAPS_FILE => "Year-by-year insights",
        io::ARTIST_SUMMARY_FILE => "Per-artist analytics",
        _ => "",
    }
}

/// List every pipeline document with its size.
pub fn print_output_files(output_dir: &Path) {
    println!("\n📁 Generated Files:");

    let mut total_mb = 0.0;
    for file in io::OUTPUT_FILES {
        let path = output_dir.join(file);
        match std::fs::metadata(&path) {
            Ok(meta) => {
                let size_mb = meta.len() as f64 / BYTES_PER_MB;
                total_mb += size_mb;
                println!("  ✅ {file} ({size_mb:.1} MB) - {}", describe(file));
            }
            Err(_) => println!("  ❌ {file} - {}", describe(file)),
        }
    }

    println!("\n  Total size: {total_mb:.1} MB");
    println!("  Output directory: {}", output_dir.display());
}

pub fn show_status(config: &Config) -> Result<()> {
    println!("\n📊 Coda Status");
    println!("\n  Input directory: {}", config.input_dir.display());

    let spotify = coda_etl::discover::find_spotify_files(&config.input_dir);
    println!("  Spotify export files: {}", spotify.len());
    match coda_etl::discover::find_apple_music_file(&config.input_dir) {
        Some(path) => println!("  Apple Music export: {}", path.display()),
        None => println!("  Apple Music export: not found"),
    }

    print_output_files(&config.output_dir);

    if !config.output_dir.join(io::CONSOLIDATED_EVENTS_FILE).exists() {
        println!("\n  Run `coda process-all` to build everything");
    }
    Ok(())
}
