use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use coda_core::anomaly::AnomalyRules;
use coda_core::normalize::SpotifyFilter;
use coda_core::resolve::MatchingOptions;
use coda_core::stats::{AggregateOptions, DEFAULT_MIN_YEAR};

/// Configuration for coda.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CODA_* prefix)
/// 3. Config file (~/.config/coda/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory searched for the provider exports.
    ///
    /// Can be set via:
    /// - ENV: CODA_INPUT_DIR
    /// - Config: input_dir = "/path/to/exports"
    /// - Default: ./input
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory the pipeline writes its documents to.
    ///
    /// Can be set via:
    /// - ENV: CODA_OUTPUT_DIR
    /// - Config: output_dir = "/path/to/output"
    /// - Default: ./output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Spotify plays from before this year are dropped.
    #[serde(default)]
    pub cutoff_year: Option<i32>,

    /// Earliest year counted by the annual and artist rollups.
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    /// Apple Music to Spotify artist matching.
    #[serde(default)]
    pub matching: MatchingOptions,

    /// TOML file with anomaly deny-lists. Built-in rules when unset.
    #[serde(default)]
    pub anomaly_rules_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            cutoff_year: None,
            min_year: DEFAULT_MIN_YEAR,
            matching: MatchingOptions::default(),
            anomaly_rules_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/coda/config.toml
    /// Reads environment variables with CODA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("coda");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.matching.threshold) {
            anyhow::bail!(
                "matching.threshold must be between 0 and 1, got {}",
                self.matching.threshold
            );
        }
        if self.matching.top_k == 0 {
            anyhow::bail!("matching.top_k must be at least 1");
        }
        Ok(())
    }

    pub fn spotify_filter(&self) -> SpotifyFilter {
        SpotifyFilter {
            cutoff_year: self.cutoff_year,
        }
    }

    /// Year window for the rollups, ending at the current calendar year.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions::new(self.min_year, Utc::now().year())
    }

    /// The anomaly rule set: the configured file, or the built-in rules.
    pub fn anomaly_rules(&self) -> Result<AnomalyRules> {
        match &self.anomaly_rules_path {
            Some(path) => AnomalyRules::load(path)
                .with_context(|| format!("Failed to load anomaly rules from {}", path.display())),
            None => Ok(AnomalyRules::default()),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_min_year() -> i32 {
    DEFAULT_MIN_YEAR
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/coda/config.toml
/// - macOS: ~/Library/Application Support/coda/config.toml
/// - Windows: %APPDATA%\coda\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coda")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Coda Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CODA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Where the Spotify and Apple Music exports live. Searched recursively.
#
# Can also be set via:
# - CLI: coda process-all --spotify-dir /path --apple-dir /path
# - Environment: CODA_INPUT_DIR=/path/to/exports
#input_dir = "input"

# Where cleaned data and statistics are written.
#
# Can also be set via:
# - CLI: coda --output-dir /path process-all
# - Environment: CODA_OUTPUT_DIR=/path/to/output
#output_dir = "output"

# Drop Spotify plays from before this year.
#cutoff_year = 2015

# Earliest year counted in annual recaps and artist summaries. Plays dated
# earlier, or later than the current year, are treated as bad data.
#min_year = 2008

# Deny-lists and rapid-play thresholds for anomaly screening.
# See config/anomaly.toml for the format.
#anomaly_rules_path = "config/anomaly.toml"

[matching]
# Minimum similarity for an Apple Music artist to be mapped onto a
# Spotify artist.
threshold = 0.8

# Only the top_k Apple Music artists by listening time are fuzzy-matched.
# Raising it finds more matches and costs more time.
top_k = 50

# Similarity measure: "gestalt", "levenshtein" or "jaro_winkler".
metric = "gestalt"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
