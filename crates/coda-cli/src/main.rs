use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use coda_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "coda", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory searched for the exports (default: ./input)
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,

    /// Directory the cleaned data and statistics are written to (default: ./output)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Run the whole pipeline: clean both exports, consolidate, and
    /// generate every statistics document
    ///
    /// Stages run in order: spotify, apple_music, consolidate, then the
    /// lifetime, annual and artist rollups. A missing Apple Music export
    /// is not an error; the run continues with Spotify data only.
    ///
    /// Output files (in the output directory):
    /// - spotify_full_streaming_data_clean.json
    /// - apple_music_full_streaming_data_clean.json
    /// - apple_music_artist_mapping_summary.json
    /// - consolidated_full_streaming_data_clean.json
    /// - lifetime_streaming_stats.json
    /// - annual_recaps.json
    /// - artist_summary.json
    ProcessAll {
        /// Directory with the Spotify extended streaming history
        #[arg(long)]
        spotify_dir: Option<PathBuf>,
        /// Directory with the Apple Music play history CSV
        #[arg(long)]
        apple_dir: Option<PathBuf>,
        /// Leave Apple Music out entirely
        #[arg(long)]
        skip_apple: bool,
    },
    /// Clean the Spotify extended streaming history
    ProcessSpotify {
        /// Directory with the Spotify export (default: the input directory)
        #[arg(long)]
        spotify_dir: Option<PathBuf>,
    },
    /// Clean the Apple Music play history and map its artists onto
    /// Spotify spellings
    ProcessApple {
        /// Directory with the Apple Music export (default: the input directory)
        #[arg(long)]
        apple_dir: Option<PathBuf>,
        /// Cleaned Spotify events to take artist spellings from
        #[arg(long)]
        spotify_file: Option<PathBuf>,
    },
    /// Merge the cleaned Spotify and Apple Music data into one log
    Consolidate,
    /// Generate lifetime, annual and per-artist statistics from the
    /// consolidated log
    GenerateInsights,
    /// Show which output files exist
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write an example config file if none exists
    Init,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(dir) = &cli.input_dir {
        config.input_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir.clone_from(dir);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::config::show_config(&load_config(&cli)?),
            ConfigAction::Init => commands::config::init_config(),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
        };
    }

    let config = load_config(&cli)?;
    std::fs::create_dir_all(&config.output_dir)?;

    match cli.command {
        Commands::ProcessAll {
            spotify_dir,
            apple_dir,
            skip_apple,
        } => {
            let options = coda_etl::PipelineOptions {
                spotify_dir,
                apple_dir,
                skip_apple_music: skip_apple,
            };
            commands::run_process(&config, &options).await?;
        }
        Commands::ProcessSpotify { spotify_dir } => {
            commands::run_spotify(&config, spotify_dir).await?;
        }
        Commands::ProcessApple {
            apple_dir,
            spotify_file,
        } => {
            commands::run_apple(&config, apple_dir, spotify_file).await?;
        }
        Commands::Consolidate => {
            commands::run_consolidate(&config).await?;
        }
        Commands::GenerateInsights => {
            commands::run_insights(&config).await?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
