//! Treadle stages. Each one reads whole documents from disk, runs a
//! `coda_core` pass over them and writes its documents back.
//!
//! Every stage also exposes a plain `run` method so it can be driven
//! without a workflow, and records its summary in the stage context
//! metadata under [`SUMMARY_KEY`].

pub mod apple_music;
pub mod consolidate;
pub mod insights;
pub mod spotify;

use serde::Serialize;
use treadle::StageContext;

pub use apple_music::{AppleMusicStage, AppleMusicSummary};
pub use consolidate::{ConsolidateStage, ConsolidateSummary};
pub use insights::{InsightsStage, InsightsSummary, Rollup};
pub use spotify::{SpotifyStage, SpotifySummary};

/// Metadata key each stage stores its summary under.
pub const SUMMARY_KEY: &str = "summary";

fn record_summary<T: Serialize>(ctx: &mut StageContext, summary: &T) -> treadle::Result<()> {
    let value = serde_json::to_value(summary).map_err(|e| {
        treadle::TreadleError::StageExecution(format!("Failed to serialize summary: {e}"))
    })?;
    ctx.metadata.insert(SUMMARY_KEY.to_string(), value);
    Ok(())
}
