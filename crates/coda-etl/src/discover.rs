//! Locating export files inside an input directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name prefixes used by the Spotify export over the years.
const SPOTIFY_PREFIXES: [&str; 3] = ["StreamingHistory", "endsong", "Streaming_History"];

/// Exact Apple Music file names, most specific first.
const APPLE_MUSIC_NAMES: [&str; 2] = [
    "Apple Music - Play History Daily Tracks.csv",
    "Play History Daily Tracks.csv",
];

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

fn is_spotify_export(path: &Path) -> bool {
    has_extension(path, "json")
        && file_name(path).is_some_and(|name| {
            SPOTIFY_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
        })
}

/// All Spotify streaming history files under `dir`, sorted by path.
pub fn find_spotify_files(dir: &Path) -> Vec<PathBuf> {
    let files: Vec<PathBuf> = files_under(dir)
        .into_iter()
        .filter(|path| is_spotify_export(path))
        .collect();
    log::debug!("Found {} Spotify export files in {}", files.len(), dir.display());
    files
}

/// The Apple Music play history CSV under `dir`, if any.
///
/// Exact export names win over the loose `*apple*music*.csv` match; within
/// one rule the first path in sorted order wins.
pub fn find_apple_music_file(dir: &Path) -> Option<PathBuf> {
    let files = files_under(dir);

    for wanted in APPLE_MUSIC_NAMES {
        if let Some(path) = files.iter().find(|p| file_name(p) == Some(wanted)) {
            return Some(path.clone());
        }
    }

    files.into_iter().find(|path| {
        has_extension(path, "csv")
            && file_name(path).is_some_and(|name| {
                let lower = name.to_lowercase();
                lower
                    .find("apple")
                    .is_some_and(|at| lower[at..].contains("music"))
            })
    })
}
