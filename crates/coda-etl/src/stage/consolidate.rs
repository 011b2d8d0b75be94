//! Consolidate stage: merge both cleaned logs into one chronological corpus.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use treadle::{Stage, StageContext, StageOutcome};

use coda_core::consolidate::{consolidate, ConsolidationSummary};
use coda_core::model::PlayEvent;

use crate::error::{StageError, StageResult};
use crate::io::{self, APPLE_MUSIC_EVENTS_FILE, CONSOLIDATED_EVENTS_FILE, SPOTIFY_EVENTS_FILE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidateSummary {
    pub spotify_events: usize,
    pub apple_music_events: usize,
    pub corpus: ConsolidationSummary,
    pub output: PathBuf,
}

/// The Consolidate stage.
///
/// Either cleaned log may be missing; the stage only fails when there is
/// nothing at all to consolidate.
#[derive(Debug)]
pub struct ConsolidateStage {
    output_dir: PathBuf,
    include_apple_music: bool,
}

impl ConsolidateStage {
    #[must_use]
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            include_apple_music: true,
        }
    }

    /// Ignore any Apple Music output left in the directory.
    #[must_use]
    pub fn spotify_only(mut self) -> Self {
        self.include_apple_music = false;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(CONSOLIDATED_EVENTS_FILE)
    }

    fn load(&self, file: &str) -> StageResult<Vec<PlayEvent>> {
        io::read_json_or_default(&self.output_dir.join(file))
    }

    /// Run the stage outside a workflow.
    pub fn run(&self) -> StageResult<ConsolidateSummary> {
        let spotify = self.load(SPOTIFY_EVENTS_FILE)?;
        let apple_music = if self.include_apple_music {
            self.load(APPLE_MUSIC_EVENTS_FILE)?
        } else {
            Vec::new()
        };

        if spotify.is_empty() && apple_music.is_empty() {
            return Err(StageError::MissingInput {
                path: self.output_dir.join(SPOTIFY_EVENTS_FILE),
            });
        }

        let (spotify_events, apple_music_events) = (spotify.len(), apple_music.len());
        log::info!(
            "Consolidating {} Spotify and {} Apple Music events",
            spotify_events,
            apple_music_events
        );

        let events = consolidate(spotify, apple_music);
        let corpus = ConsolidationSummary::from_events(&events);
        if corpus.fallback_timestamps > 0 {
            log::warn!(
                "{} events carry a fallback timestamp and sort first",
                corpus.fallback_timestamps
            );
        }

        let path = self.output_path();
        io::write_json(&path, &events)?;
        log::info!(
            "Wrote {} events ({:.1} hours) to {}",
            corpus.total_events,
            corpus.total_hours,
            path.display()
        );

        Ok(ConsolidateSummary {
            spotify_events,
            apple_music_events,
            corpus,
            output: path,
        })
    }
}

#[async_trait::async_trait]
impl Stage for ConsolidateStage {
    fn name(&self) -> &str {
        "consolidate"
    }

    async fn execute(
        &self,
        item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Consolidating listening history for job {}", item.id());
        let summary = self.run()?;
        super::record_summary(ctx, &summary)?;
        Ok(StageOutcome::Complete)
    }
}
