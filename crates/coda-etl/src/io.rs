//! JSON documents at stage boundaries.
//!
//! Every stage reads whole documents and writes whole documents. Writes go
//! to a sibling `.tmp` file that is renamed over the target, so a failed
//! write never leaves a truncated document behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{StageError, StageResult};

pub const SPOTIFY_EVENTS_FILE: &str = "spotify_full_streaming_data_clean.json";
pub const APPLE_MUSIC_EVENTS_FILE: &str = "apple_music_full_streaming_data_clean.json";
pub const ARTIST_MAPPING_FILE: &str = "apple_music_artist_mapping_summary.json";
pub const CONSOLIDATED_EVENTS_FILE: &str = "consolidated_full_streaming_data_clean.json";
pub const LIFETIME_STATS_FILE: &str = "lifetime_streaming_stats.json";
pub const ANNUAL_RECAPS_FILE: &str = "annual_recaps.json";
pub const ARTIST_SUMMARY_FILE: &str = "artist_summary.json";

/// Every file the pipeline writes, in stage order.
pub const OUTPUT_FILES: [&str; 7] = [
    SPOTIFY_EVENTS_FILE,
    APPLE_MUSIC_EVENTS_FILE,
    ARTIST_MAPPING_FILE,
    CONSOLIDATED_EVENTS_FILE,
    LIFETIME_STATS_FILE,
    ANNUAL_RECAPS_FILE,
    ARTIST_SUMMARY_FILE,
];

/// Read and decode a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StageResult<T> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StageError::MissingInput {
                path: path.to_path_buf(),
            }
        } else {
            StageError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_str(&content).map_err(|source| StageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON document, treating an absent file as `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StageResult<T> {
    match read_json(path) {
        Err(err) if err.is_missing_input() => {
            log::warn!("{} not found, continuing without it", path.display());
            Ok(T::default())
        }
        other => other,
    }
}

/// Serialize `value` as pretty-printed JSON and replace `path` with it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StageResult<()> {
    stage_json(path, value)?.commit()
}

/// A document fully written to its `.tmp` sibling but not yet renamed into
/// place. Dropping it without [`commit`](Self::commit) removes the temp file
/// and leaves the target untouched.
#[derive(Debug)]
#[must_use = "a staged document is discarded unless committed"]
pub struct StagedJson {
    path: PathBuf,
    tmp_path: PathBuf,
    committed: bool,
}

impl StagedJson {
    /// Rename the temp file over the target.
    pub fn commit(mut self) -> StageResult<()> {
        fs::rename(&self.tmp_path, &self.path).map_err(|source| StageError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.committed = true;
        log::debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

impl Drop for StagedJson {
    fn drop(&mut self) {
        if !self.committed {
            remove_tmp(&self.tmp_path);
        }
    }
}

/// Write `value` to the `.tmp` sibling of `path` without touching `path`.
///
/// Use this with [`StagedJson::commit`] when several documents must land
/// together: stage all of them first, then commit.
pub fn stage_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StageResult<StagedJson> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StageError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    if let Err(err) = write_to(&tmp_path, value) {
        remove_tmp(&tmp_path);
        return Err(err);
    }

    Ok(StagedJson {
        path: path.to_path_buf(),
        tmp_path,
        committed: false,
    })
}

fn remove_tmp(tmp_path: &Path) {
    if tmp_path.is_file() {
        if let Err(e) = fs::remove_file(tmp_path) {
            log::warn!("Failed to remove {}: {e}", tmp_path.display());
        }
    }
}

fn write_to<T: Serialize + ?Sized>(tmp_path: &Path, value: &T) -> StageResult<()> {
    let write_err = |source| StageError::Write {
        path: tmp_path.to_path_buf(),
        source,
    };

    let file = fs::File::create(tmp_path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| StageError::Write {
        path: tmp_path.to_path_buf(),
        source: e.into(),
    })?;
    writer.flush().map_err(write_err)?;
    writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?
        .sync_all()
        .map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("b".to_string(), 2);
        doc.insert("a".to_string(), 1);
        write_json(&path, &doc).unwrap();

        let back: BTreeMap<String, i32> = read_json(&path).unwrap();
        assert_eq!(back, doc);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");

        let err = read_json::<Vec<i32>>(&path).unwrap_err();
        assert!(err.is_missing_input());

        let fallback: Vec<i32> = read_json_or_default(&path).unwrap();
        assert!(fallback.is_empty());
    }

    #[test]
    fn test_read_invalid_json_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json::<Vec<i32>>(&path).unwrap_err();
        assert!(matches!(err, StageError::Decode { .. }));
        assert!(read_json_or_default::<Vec<i32>>(&path).is_err());
    }

    #[test]
    fn test_failed_write_keeps_previous_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();

        // A directory squatting on the temp path makes the write fail.
        fs::create_dir(path.with_extension("json.tmp")).unwrap();
        assert!(write_json(&path, &vec![4]).is_err());

        let back: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_dropped_stage_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &vec![1]).unwrap();

        let staged = stage_json(&path, &vec![2]).unwrap();
        assert!(path.with_extension("json.tmp").exists());
        drop(staged);

        assert!(!path.with_extension("json.tmp").exists());
        let back: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(back, vec![1]);
    }

    #[test]
    fn test_staged_documents_commit_together() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        let a = stage_json(&first, &vec![1]).unwrap();
        let b = stage_json(&second, &vec![2]).unwrap();
        assert!(!first.exists() && !second.exists());
        a.commit().unwrap();
        b.commit().unwrap();

        assert_eq!(read_json::<Vec<i32>>(&first).unwrap(), vec![1]);
        assert_eq!(read_json::<Vec<i32>>(&second).unwrap(), vec![2]);
    }
}
