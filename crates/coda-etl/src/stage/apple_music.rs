//! Apple Music stage: clean the play history CSV and map its artists onto
//! Spotify spellings.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use treadle::{Stage, StageContext, StageOutcome};

use coda_core::anomaly::{AnomalyDetector, AnomalyReport, AnomalyRules};
use coda_core::model::{MappingReportEntry, PlayEvent};
use coda_core::normalize::{AppleMusicNormalizer, AppleMusicOutput, NormalizeReport};
use coda_core::resolve::MatchingOptions;

use crate::discover::find_apple_music_file;
use crate::error::{StageError, StageResult};
use crate::io::{self, APPLE_MUSIC_EVENTS_FILE, ARTIST_MAPPING_FILE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppleMusicSummary {
    /// The CSV that was read, if one was found.
    pub source: Option<PathBuf>,
    /// Spotify events used as the canonical artist vocabulary.
    pub canonical_events: usize,
    pub normalize: NormalizeReport,
    pub anomalies: AnomalyReport,
    pub distinct_artists: usize,
    pub matched_artists: usize,
    pub events_written: usize,
    pub output: PathBuf,
    pub mapping_output: PathBuf,
}

/// The Apple Music stage.
///
/// Reads the Spotify stage's output for the artist vocabulary. When that
/// file is absent every artist is left as spelled in the CSV.
#[derive(Debug)]
pub struct AppleMusicStage {
    input_dir: PathBuf,
    output_dir: PathBuf,
    spotify_events: PathBuf,
    normalizer: AppleMusicNormalizer,
    detector: AnomalyDetector,
}

impl AppleMusicStage {
    /// The canonical Spotify events are read from `output_dir` unless
    /// overridden with [`with_spotify_events`](Self::with_spotify_events).
    #[must_use]
    pub fn new(
        input_dir: PathBuf,
        output_dir: PathBuf,
        matching: MatchingOptions,
        rules: AnomalyRules,
    ) -> Self {
        let spotify_events = output_dir.join(io::SPOTIFY_EVENTS_FILE);
        Self {
            input_dir,
            output_dir,
            spotify_events,
            normalizer: AppleMusicNormalizer::new(matching),
            detector: AnomalyDetector::new(rules),
        }
    }

    #[must_use]
    pub fn with_spotify_events(mut self, path: PathBuf) -> Self {
        self.spotify_events = path;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(APPLE_MUSIC_EVENTS_FILE)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.output_dir.join(ARTIST_MAPPING_FILE)
    }

    fn normalize_file(&self, path: &Path, canonical: &[PlayEvent]) -> StageResult<AppleMusicOutput> {
        let file = File::open(path).map_err(|source| StageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self
            .normalizer
            .normalize_reader(BufReader::new(file), canonical)?)
    }

    /// Run the stage outside a workflow.
    pub fn run(&self) -> StageResult<AppleMusicSummary> {
        let canonical: Vec<PlayEvent> = io::read_json_or_default(&self.spotify_events)?;
        if canonical.is_empty() {
            log::warn!("No Spotify events to match Apple Music artists against");
        }

        let source = find_apple_music_file(&self.input_dir);
        let output = match &source {
            Some(path) => {
                log::info!("Processing Apple Music history from {}", path.display());
                self.normalize_file(path, &canonical)?
            }
            None => {
                log::warn!(
                    "No Apple Music play history CSV in {}",
                    self.input_dir.display()
                );
                AppleMusicOutput::default()
            }
        };

        let report: Vec<MappingReportEntry> = output.mapping_report();
        let matched_artists = report.iter().filter(|e| e.was_matched).count();
        log::info!(
            "Artist mapping: {} of {} artists matched to Spotify spellings",
            matched_artists,
            report.len()
        );

        let (events, anomalies) = self.detector.screen(output.events);
        log::info!(
            "Apple Music anomaly screening: {} record discards, {} flagged groups ({} events), {} kept",
            anomalies.record_discards,
            anomalies.flagged_groups,
            anomalies.sequence_discards,
            anomalies.kept
        );

        let path = self.output_path();
        let mapping_path = self.mapping_path();
        // Both documents are staged before either replaces its target.
        let staged_events = io::stage_json(&path, &events)?;
        let staged_mapping = io::stage_json(&mapping_path, &report)?;
        staged_events.commit()?;
        staged_mapping.commit()?;
        log::info!("Wrote {} Apple Music events to {}", events.len(), path.display());

        Ok(AppleMusicSummary {
            source,
            canonical_events: canonical.len(),
            normalize: output.report,
            anomalies,
            distinct_artists: report.len(),
            matched_artists,
            events_written: events.len(),
            output: path,
            mapping_output: mapping_path,
        })
    }
}

#[async_trait::async_trait]
impl Stage for AppleMusicStage {
    fn name(&self) -> &str {
        "apple_music"
    }

    async fn execute(
        &self,
        item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Cleaning Apple Music history for job {}", item.id());
        let summary = self.run()?;
        super::record_summary(ctx, &summary)?;
        Ok(StageOutcome::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::fixtures::{spotify_record, write_apple_export, write_spotify_export};
    use crate::stage::SpotifyStage;
    use coda_core::model::Provider;
    use coda_core::normalize::SpotifyFilter;
    use tempfile::TempDir;

    fn apple_stage(dir: &TempDir) -> AppleMusicStage {
        AppleMusicStage::new(
            dir.path().join("input"),
            dir.path().join("output"),
            MatchingOptions::default(),
            AnomalyRules::default(),
        )
    }

    fn run_spotify(dir: &TempDir) {
        write_spotify_export(
            &dir.path().join("input").join("spotify"),
            "StreamingHistory0.json",
            &[
                spotify_record("2021-01-01T00:00:00Z", "The Beatles", "Help!", 200_000),
                spotify_record("2021-01-02T00:00:00Z", "Beyoncé", "Halo", 200_000),
            ],
        );
        SpotifyStage::new(
            dir.path().join("input"),
            dir.path().join("output"),
            SpotifyFilter::default(),
            AnomalyRules::default(),
        )
        .run()
        .unwrap();
    }

    #[test]
    fn test_run_maps_artists_and_writes_both_documents() {
        let dir = TempDir::new().unwrap();
        run_spotify(&dir);
        write_apple_export(
            &dir.path().join("input").join("apple"),
            &[
                "United States,1,AUDIO,20230115,\"13, 14\",180000,IPHONE,1,0,false,1,The Beatles - Let It Be,NATURAL_END_OF_TRACK",
                "United States,2,AUDIO,20230116,9,200000,MACOS,1,0,false,2,Beyonce - Halo,PLAYBACK_MANUALLY_PAUSED",
                "United States,3,AUDIO,20230117,9,200000,MACOS,1,0,false,3,42,NATURAL_END_OF_TRACK",
                "United States,4,VIDEO,20230117,9,200000,MACOS,1,0,false,4,Someone - Video,NATURAL_END_OF_TRACK",
            ],
        );

        let summary = apple_stage(&dir).run().unwrap();
        assert!(summary.source.is_some());
        assert_eq!(summary.canonical_events, 2);
        assert_eq!(summary.events_written, 2);
        assert_eq!(summary.distinct_artists, 2);
        assert_eq!(summary.matched_artists, 2);

        let events: Vec<PlayEvent> = io::read_json(&summary.output).unwrap();
        assert!(events.iter().all(|e| e.provider == Provider::AppleMusic));
        let artists: Vec<_> = events.iter().filter_map(|e| e.artist.as_deref()).collect();
        assert_eq!(artists, ["The Beatles", "Beyoncé"]);
        assert_eq!(events[0].platform, "iOS");
        assert_eq!(events[0].country, "US");

        let mappings: Vec<MappingReportEntry> = io::read_json(&summary.mapping_output).unwrap();
        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn test_missing_csv_writes_empty_outputs() {
        let dir = TempDir::new().unwrap();
        let summary = apple_stage(&dir).run().unwrap();

        assert!(summary.source.is_none());
        let events: Vec<PlayEvent> = io::read_json(&summary.output).unwrap();
        assert!(events.is_empty());
        let mappings: Vec<MappingReportEntry> = io::read_json(&summary.mapping_output).unwrap();
        assert!(mappings.is_empty());
    }

    #[test]
    fn test_without_spotify_output_names_pass_through() {
        let dir = TempDir::new().unwrap();
        write_apple_export(
            &dir.path().join("input"),
            &["United States,1,AUDIO,20230115,13,180000,IPHONE,1,0,false,1,Beyonce - Halo,NATURAL_END_OF_TRACK"],
        );

        let summary = apple_stage(&dir).run().unwrap();
        assert_eq!(summary.canonical_events, 0);
        assert_eq!(summary.matched_artists, 0);

        let events: Vec<PlayEvent> = io::read_json(&summary.output).unwrap();
        assert_eq!(events[0].artist.as_deref(), Some("Beyonce"));
    }

    #[test]
    fn test_failed_mapping_write_leaves_no_events_file() {
        let dir = TempDir::new().unwrap();
        write_apple_export(
            &dir.path().join("input"),
            &["United States,1,AUDIO,20230115,13,180000,IPHONE,1,0,false,1,Beyonce - Halo,NATURAL_END_OF_TRACK"],
        );
        let stage = apple_stage(&dir);
        std::fs::create_dir_all(stage.mapping_path().with_extension("json.tmp")).unwrap();

        assert!(stage.run().is_err());
        assert!(!stage.output_path().exists());
        assert!(!stage.output_path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_execute_records_summary() {
        let dir = TempDir::new().unwrap();
        let stage = apple_stage(&dir);
        let job = crate::ExportJob::with_id("job", dir.path().join("input"));
        let mut ctx = StageContext::new("apple_music".to_string());

        let outcome = stage.execute(&job, &mut ctx).await.unwrap();
        assert_eq!(outcome, StageOutcome::Complete);
        assert!(ctx.metadata.contains_key(crate::stage::SUMMARY_KEY));
    }
}
