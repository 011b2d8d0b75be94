//! Reconciling Apple Music artist spellings with the Spotify vocabulary.

pub mod resolver;
pub mod similarity;

pub use resolver::{
    mapping_report, target_vocabulary, top_artists_by_duration, IdentityResolver,
    MatchingOptions, DEFAULT_THRESHOLD, DEFAULT_TOP_K,
};
pub use similarity::{gestalt_ratio, SimilarityMetric};
