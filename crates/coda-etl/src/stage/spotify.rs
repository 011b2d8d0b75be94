//! Spotify stage: clean the extended streaming history into canonical events.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use treadle::{Stage, StageContext, StageOutcome};

use coda_core::anomaly::{AnomalyDetector, AnomalyReport, AnomalyRules};
use coda_core::normalize::{NormalizeReport, SpotifyFilter, SpotifyNormalizer};

use crate::discover::find_spotify_files;
use crate::error::StageResult;
use crate::io::{self, SPOTIFY_EVENTS_FILE};

/// What one Spotify run read, dropped and wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotifySummary {
    pub files_found: usize,
    /// Files that could not be read or were not a JSON array.
    pub files_skipped: usize,
    pub normalize: NormalizeReport,
    pub anomalies: AnomalyReport,
    pub events_written: usize,
    pub output: PathBuf,
}

/// The Spotify stage: discover export files, normalize, screen, write.
#[derive(Debug)]
pub struct SpotifyStage {
    input_dir: PathBuf,
    output_dir: PathBuf,
    normalizer: SpotifyNormalizer,
    detector: AnomalyDetector,
}

impl SpotifyStage {
    #[must_use]
    pub fn new(
        input_dir: PathBuf,
        output_dir: PathBuf,
        filter: SpotifyFilter,
        rules: AnomalyRules,
    ) -> Self {
        Self {
            input_dir,
            output_dir,
            normalizer: SpotifyNormalizer::new(filter),
            detector: AnomalyDetector::new(rules),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(SPOTIFY_EVENTS_FILE)
    }

    /// Load every record of every export file. Unreadable files are skipped
    /// and counted; records inside a readable file are returned untyped.
    fn load_records(files: &[PathBuf]) -> (Vec<serde_json::Value>, usize) {
        let mut records = Vec::new();
        let mut skipped = 0;
        for path in files {
            match io::read_json::<Vec<serde_json::Value>>(path) {
                Ok(batch) => {
                    log::debug!("Loaded {} records from {}", batch.len(), path.display());
                    records.extend(batch);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {e}", path.display());
                    skipped += 1;
                }
            }
        }
        (records, skipped)
    }

    /// Run the stage outside a workflow.
    pub fn run(&self) -> StageResult<SpotifySummary> {
        let input_dir = &self.input_dir;
        log::info!("Looking for Spotify exports in {}", input_dir.display());
        let files = find_spotify_files(input_dir);
        if files.is_empty() {
            log::warn!(
                "No Spotify export files (StreamingHistory*.json, endsong*.json, Streaming_History*.json) in {}",
                input_dir.display()
            );
        }

        let (records, files_skipped) = Self::load_records(&files);
        let output = self.normalizer.normalize_values(records);
        let (events, anomalies) = self.detector.screen(output.events);
        log::info!(
            "Spotify anomaly screening: {} record discards, {} flagged groups ({} events), {} kept",
            anomalies.record_discards,
            anomalies.flagged_groups,
            anomalies.sequence_discards,
            anomalies.kept
        );

        let path = self.output_path();
        io::write_json(&path, &events)?;
        log::info!("Wrote {} Spotify events to {}", events.len(), path.display());

        Ok(SpotifySummary {
            files_found: files.len(),
            files_skipped,
            normalize: output.report,
            anomalies,
            events_written: events.len(),
            output: path,
        })
    }
}

#[async_trait::async_trait]
impl Stage for SpotifyStage {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn execute(
        &self,
        item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Cleaning Spotify history for job {}", item.id());
        let summary = self.run()?;
        super::record_summary(ctx, &summary)?;
        Ok(StageOutcome::Complete)
    }
}
