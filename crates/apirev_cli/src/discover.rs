//! Repository layout: where descriptions and behaviour tests live.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

const API_DIR: [&str; 2] = ["code", "API_definitions"];
const TEST_DIR: [&str; 2] = ["code", "Test_definitions"];
const API_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

pub fn api_dir(repo: &Path) -> PathBuf {
    API_DIR.iter().fold(repo.to_path_buf(), |p, part| p.join(part))
}

pub fn test_dir(repo: &Path) -> PathBuf {
    TEST_DIR.iter().fold(repo.to_path_buf(), |p, part| p.join(part))
}

/// Description files of `repo`, sorted by file name.
///
/// A repository without a definitions directory has none.
pub fn find_api_files(repo: &Path) -> Result<Vec<PathBuf>> {
    let dir = api_dir(repo);
    if !dir.is_dir() {
        debug!("No definitions directory at {:?}", dir);
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let is_description = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| API_EXTENSIONS.contains(&e));
        if entry.file_type().is_file() && is_description {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
