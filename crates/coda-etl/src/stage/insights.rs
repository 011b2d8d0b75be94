//! Insight stages: the lifetime, annual and per-artist rollups.
//!
//! All three read the consolidated corpus and write one document each. They
//! only depend on the consolidate stage, never on each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use treadle::{Stage, StageContext, StageOutcome};

use coda_core::model::PlayEvent;
use coda_core::stats::{annual_recaps, artist_summaries, lifetime_stats, AggregateOptions};

use crate::error::StageResult;
use crate::io::{
    self, ANNUAL_RECAPS_FILE, ARTIST_SUMMARY_FILE, CONSOLIDATED_EVENTS_FILE, LIFETIME_STATS_FILE,
};

/// Which rollup an [`InsightsStage`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rollup {
    Lifetime,
    Annual,
    Artists,
}

impl Rollup {
    pub const ALL: [Self; 3] = [Self::Lifetime, Self::Annual, Self::Artists];

    pub const fn stage_name(self) -> &'static str {
        match self {
            Self::Lifetime => "lifetime",
            Self::Annual => "annual",
            Self::Artists => "artists",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Lifetime => LIFETIME_STATS_FILE,
            Self::Annual => ANNUAL_RECAPS_FILE,
            Self::Artists => ARTIST_SUMMARY_FILE,
        }
    }
}

impl fmt::Display for Rollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsSummary {
    pub rollup: Rollup,
    pub events: usize,
    /// Entries in the document: years for the annual rollup, artists for
    /// the artist rollup, 1 for the lifetime rollup.
    pub entries: usize,
    pub output: PathBuf,
}

/// Computes one rollup from the consolidated corpus.
#[derive(Debug)]
pub struct InsightsStage {
    output_dir: PathBuf,
    rollup: Rollup,
    options: AggregateOptions,
}

impl InsightsStage {
    #[must_use]
    pub fn new(output_dir: PathBuf, rollup: Rollup, options: AggregateOptions) -> Self {
        Self {
            output_dir,
            rollup,
            options,
        }
    }

    pub fn rollup(&self) -> Rollup {
        self.rollup
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.rollup.file_name())
    }

    /// Run the stage outside a workflow.
    pub fn run(&self) -> StageResult<InsightsSummary> {
        let events: Vec<PlayEvent> = io::read_json(&self.output_dir.join(CONSOLIDATED_EVENTS_FILE))?;
        self.write(&events)
    }

    /// Compute the rollup over `events` and write it.
    pub fn write(&self, events: &[PlayEvent]) -> StageResult<InsightsSummary> {
        let path = self.output_path();
        let entries = match self.rollup {
            Rollup::Lifetime => {
                io::write_json(&path, &lifetime_stats(events))?;
                1
            }
            Rollup::Annual => {
                let recaps = annual_recaps(events, &self.options);
                io::write_json(&path, &recaps)?;
                recaps.len()
            }
            Rollup::Artists => {
                let summaries = artist_summaries(events, &self.options);
                io::write_json(&path, &summaries)?;
                summaries.len()
            }
        };
        log::info!(
            "Wrote {} rollup over {} events to {}",
            self.rollup,
            events.len(),
            path.display()
        );

        Ok(InsightsSummary {
            rollup: self.rollup,
            events: events.len(),
            entries,
            output: path,
        })
    }
}

#[async_trait::async_trait]
impl Stage for InsightsStage {
    fn name(&self) -> &str {
        self.rollup.stage_name()
    }

    async fn execute(
        &self,
        item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Generating {} rollup for job {}", self.rollup, item.id());
        let summary = self.run()?;
        super::record_summary(ctx, &summary)?;
        Ok(StageOutcome::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coda_core::model::Provider;
    use tempfile::TempDir;

    fn corpus(dir: &TempDir) {
        let events = vec![
            PlayEvent::new(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), Provider::Spotify)
                .with_artist("X")
                .with_track("Y")
                .with_duration(200_000),
            PlayEvent::new(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(), Provider::Spotify)
                .with_artist("X")
                .with_track("Y")
                .with_duration(200_000),
        ];
        io::write_json(&dir.path().join(CONSOLIDATED_EVENTS_FILE), &events).unwrap();
    }

    fn stage(dir: &TempDir, rollup: Rollup) -> InsightsStage {
        InsightsStage::new(dir.path().to_path_buf(), rollup, AggregateOptions::up_to(2024))
    }

    #[test]
    fn test_each_rollup_writes_its_document() {
        let dir = TempDir::new().unwrap();
        corpus(&dir);

        let lifetime = stage(&dir, Rollup::Lifetime).run().unwrap();
        assert_eq!(lifetime.entries, 1);
        let doc: serde_json::Value = io::read_json(&lifetime.output).unwrap();
        assert_eq!(doc["content_stats"]["total_plays"], 2);
        assert_eq!(doc["content_stats"]["unique_artists"], 1);

        let annual = stage(&dir, Rollup::Annual).run().unwrap();
        assert_eq!(annual.entries, 2);
        let doc: serde_json::Value = io::read_json(&annual.output).unwrap();
        assert_eq!(doc["2020"]["year_stats"]["total_plays"], 1);
        assert_eq!(doc["2021"]["year_stats"]["unique_artists"], 1);

        let artists = stage(&dir, Rollup::Artists).run().unwrap();
        assert_eq!(artists.entries, 1);
        let doc: serde_json::Value = io::read_json(&artists.output).unwrap();
        assert_eq!(doc["X"]["total_streams"], 2);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        corpus(&dir);
        let stage = stage(&dir, Rollup::Annual);

        let first = std::fs::read(stage.run().unwrap().output).unwrap();
        let second = std::fs::read(stage.run().unwrap().output).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_corpus_fails() {
        let dir = TempDir::new().unwrap();
        let err = stage(&dir, Rollup::Lifetime).run().unwrap_err();
        assert!(err.is_missing_input());
    }

    #[test]
    fn test_stage_names() {
        let names: Vec<&str> = Rollup::ALL.iter().map(|r| r.stage_name()).collect();
        assert_eq!(names, ["lifetime", "annual", "artists"]);
        let dir = TempDir::new().unwrap();
        assert_eq!(stage(&dir, Rollup::Artists).name(), "artists");
    }
}
