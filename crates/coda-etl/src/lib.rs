//! Pipeline stages for coda.
//!
//! Implements the spotify, apple_music, consolidate and rollup stages as
//! treadle `Stage` implementations, together with the file discovery,
//! configuration and JSON document I/O they share.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod discover;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod stage;
pub mod work_item;

pub use config::Config;
pub use error::{StageError, StageResult};
pub use pipeline::{build_insights_pipeline, build_pipeline, PipelineOptions};
pub use stage::{
    AppleMusicStage, ConsolidateStage, InsightsStage, Rollup, SpotifyStage, SUMMARY_KEY,
};
pub use work_item::ExportJob;
