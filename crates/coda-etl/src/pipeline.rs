use std::path::PathBuf;
use treadle::Workflow;

use crate::stage::{AppleMusicStage, ConsolidateStage, InsightsStage, Rollup, SpotifyStage};
use crate::Config;

/// Per-run overrides on top of [`Config`].
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Where to look for the Spotify export instead of `config.input_dir`.
    pub spotify_dir: Option<PathBuf>,
    /// Where to look for the Apple Music export instead of `config.input_dir`.
    pub apple_dir: Option<PathBuf>,
    /// Leave the Apple Music stage out entirely.
    pub skip_apple_music: bool,
}

/// Build the full spotify → apple_music → consolidate → rollups workflow.
///
/// # Errors
/// Returns an error if the anomaly rules cannot be loaded or the workflow
/// cannot be built.
pub fn build_pipeline(config: &Config, options: &PipelineOptions) -> treadle::Result<Workflow> {
    let rules = config.anomaly_rules().map_err(|e| {
        treadle::TreadleError::InvalidWorkflow(format!("Failed to load anomaly rules: {e:#}"))
    })?;
    let output_dir = config.output_dir.clone();
    let aggregate = config.aggregate_options();

    let spotify_stage = SpotifyStage::new(
        options
            .spotify_dir
            .clone()
            .unwrap_or_else(|| config.input_dir.clone()),
        output_dir.clone(),
        config.spotify_filter(),
        rules.clone(),
    );

    let mut builder = Workflow::builder().stage("spotify", spotify_stage);

    if options.skip_apple_music {
        builder = builder
            .stage(
                "consolidate",
                ConsolidateStage::new(output_dir.clone()).spotify_only(),
            )
            .dependency("consolidate", "spotify");
    } else {
        let apple_stage = AppleMusicStage::new(
            options
                .apple_dir
                .clone()
                .unwrap_or_else(|| config.input_dir.clone()),
            output_dir.clone(),
            config.matching,
            rules,
        );
        builder = builder
            .stage("apple_music", apple_stage)
            .stage("consolidate", ConsolidateStage::new(output_dir.clone()))
            .dependency("apple_music", "spotify")
            .dependency("consolidate", "apple_music");
    }

    for rollup in Rollup::ALL {
        builder = builder
            .stage(
                rollup.stage_name(),
                InsightsStage::new(output_dir.clone(), rollup, aggregate),
            )
            .dependency(rollup.stage_name(), "consolidate");
    }

    builder.build()
}

/// Build a workflow that only computes the rollups from an existing
/// consolidated corpus.
pub fn build_insights_pipeline(config: &Config) -> treadle::Result<Workflow> {
    let aggregate = config.aggregate_options();
    let mut builder = Workflow::builder();
    for rollup in Rollup::ALL {
        builder = builder.stage(
            rollup.stage_name(),
            InsightsStage::new(config.output_dir.clone(), rollup, aggregate),
        );
    }
    builder.build()
}
