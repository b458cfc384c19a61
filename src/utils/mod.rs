//! Utility functions and helpers.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::ScreenName;

/// Read a seed file: one account handle per line.
///
/// Blank lines and `#` comments are ignored; handles keep their exact
/// casing. The list is returned in file order, duplicates included
/// (deduplication happens when the roster is built).
pub fn read_seed_file(path: impl AsRef<Path>) -> Result<Vec<ScreenName>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("cannot read seed file {}: {}", path.display(), e))
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ScreenName::new)
        .collect())
}

/// Directory name for a run started at `now` (path-safe timestamp).
pub fn run_dir_name(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S").to_string()
}
