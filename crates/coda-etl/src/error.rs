//! Stage error types for the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while a stage reads its inputs or writes its outputs.
#[derive(Debug, Error)]
pub enum StageError {
    /// An input file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An input file was read but is not valid JSON of the expected shape.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A required input is absent.
    #[error("missing input: {path}")]
    MissingInput { path: PathBuf },

    /// An error propagated from the core domain layer.
    #[error("core error: {0}")]
    Core(#[from] coda_core::Error),
}

impl StageError {
    /// Returns `true` when the error means an input was not there at all,
    /// as opposed to being present but unusable.
    pub fn is_missing_input(&self) -> bool {
        match self {
            Self::MissingInput { .. } => true,
            Self::Read { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<StageError> for treadle::TreadleError {
    fn from(err: StageError) -> Self {
        Self::StageExecution(err.to_string())
    }
}

/// Convenience alias for stage results.
pub type StageResult<T> = std::result::Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_detection() {
        let missing = StageError::MissingInput {
            path: PathBuf::from("/nowhere.json"),
        };
        assert!(missing.is_missing_input());

        let not_found = StageError::Read {
            path: PathBuf::from("/nowhere.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(not_found.is_missing_input());

        let denied = StageError::Write {
            path: PathBuf::from("/root.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!denied.is_missing_input());
    }

    #[test]
    fn test_converts_to_stage_execution() {
        let err = StageError::MissingInput {
            path: PathBuf::from("out/consolidated.json"),
        };
        let treadle_err: treadle::TreadleError = err.into();
        assert!(matches!(
            treadle_err,
            treadle::TreadleError::StageExecution(ref msg) if msg.contains("consolidated.json")
        ));
    }
}
