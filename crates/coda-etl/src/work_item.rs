use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use treadle::WorkItem;

/// One processing run over a set of provider exports.
///
/// This is the treadle `WorkItem` that flows through the spotify →
/// apple_music → consolidate → {lifetime, annual, artists} stages. The
/// stages find their inputs through their own configuration; the job only
/// identifies the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Unique ID for this run, used as the key in the pipeline state store.
    id: String,
    /// Directory the exports were read from.
    pub input_dir: PathBuf,
}

impl ExportJob {
    /// Create a job with a fresh random ID.
    #[must_use]
    pub fn new(input_dir: PathBuf) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), input_dir)
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>, input_dir: PathBuf) -> Self {
        Self {
            id: id.into(),
            input_dir,
        }
    }
}

impl WorkItem for ExportJob {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ExportJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.input_dir.display())
    }
}
