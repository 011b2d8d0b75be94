//! Aggregation engine: rollups derived from the consolidated corpus.
//!
//! Every rollup is a pure function of its input events and
//! [`AggregateOptions`]. Maps are `BTreeMap`s and every ranking breaks ties
//! by key, so serializing the same corpus twice produces identical bytes.

pub mod annual;
pub mod artist;
pub mod common;
pub mod lifetime;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::PlayEvent;

pub use annual::{annual_recaps, AnnualRecap, MonthBucket, YearStats, ANNUAL_TOP_N};
pub use artist::{artist_summaries, ArtistSummary, ArtistYear, ARTIST_TOP_N};
pub use common::{Rates, Tally, UNKNOWN_LABEL};
pub use lifetime::{lifetime_stats, LifetimeStats, LIFETIME_TOP_N};

/// Earliest year the annual and artist rollups accept.
pub const DEFAULT_MIN_YEAR: i32 = 2008;

/// Year window applied by the annual and artist rollups.
///
/// Plays dated outside `[min_year, max_year]` are treated as data errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateOptions {
    pub min_year: i32,
    pub max_year: i32,
}

impl AggregateOptions {
    pub fn new(min_year: i32, max_year: i32) -> Self {
        Self { min_year, max_year }
    }

    /// Window from [`DEFAULT_MIN_YEAR`] to `max_year`, usually the current year.
    pub fn up_to(max_year: i32) -> Self {
        Self::new(DEFAULT_MIN_YEAR, max_year)
    }

    pub fn includes_year(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }
}

/// The three rollup documents computed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rollups {
    pub lifetime: LifetimeStats,
    pub annual: BTreeMap<i32, AnnualRecap>,
    pub artists: BTreeMap<String, ArtistSummary>,
}

impl Rollups {
    pub fn compute(events: &[PlayEvent], options: &AggregateOptions) -> Self {
        log::info!(
            "Aggregating {} events (years {}..={})",
            events.len(),
            options.min_year,
            options.max_year
        );
        Self {
            lifetime: lifetime_stats(events),
            annual: annual_recaps(events, options),
            artists: artist_summaries(events, options),
        }
    }
}
