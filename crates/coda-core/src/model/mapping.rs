use serde::{Deserialize, Serialize};

/// A resolved link between an Apple Music artist spelling and the name used
/// in the canonical log.
///
/// Unresolved mappings still carry a usable `resolved_name` (the original
/// spelling), so resolution never blocks normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistMapping {
    /// The artist as it appeared in the Apple Music track description.
    pub source_name: String,

    /// The Spotify spelling when matched, otherwise `source_name`.
    pub resolved_name: String,

    /// Similarity score in `[0, 1]`. Exact matches score 1.0; artists that
    /// were never compared score 0.0.
    pub confidence: f64,

    /// `true` iff `confidence` reached the matching threshold.
    pub matched: bool,
}

impl ArtistMapping {
    /// A mapping that keeps the source spelling.
    #[must_use]
    pub fn unresolved(source_name: impl Into<String>, confidence: f64) -> Self {
        let source_name = source_name.into();
        Self {
            resolved_name: source_name.clone(),
            source_name,
            confidence,
            matched: false,
        }
    }

    #[must_use]
    pub fn matched(
        source_name: impl Into<String>,
        resolved_name: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            resolved_name: resolved_name.into(),
            confidence,
            matched: true,
        }
    }
}

/// One row of the artist mapping review report: a distinct source artist
/// and how often it occurred in the Apple Music export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingReportEntry {
    pub original_artist: String,
    pub matched_artist: String,
    pub similarity_score: f64,
    pub was_matched: bool,
    pub occurrence_count: u64,
}

impl MappingReportEntry {
    #[must_use]
    pub fn from_mapping(mapping: &ArtistMapping, occurrence_count: u64) -> Self {
        Self {
            original_artist: mapping.source_name.clone(),
            matched_artist: mapping.resolved_name.clone(),
            similarity_score: mapping.confidence,
            was_matched: mapping.matched,
            occurrence_count,
        }
    }
}
