//! Per-file filtering of discovered test files

use crate::config::FilterFn;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Drop every file the callback asks to ignore
///
/// The callback is called once per file, in order. Its first error aborts
/// filtering. Without a callback the files are returned unchanged.
pub fn filter_files(files: Vec<PathBuf>, callback: Option<&FilterFn>) -> Result<Vec<PathBuf>> {
    let Some(callback) = callback else {
        return Ok(files);
    };

    let mut kept = Vec::with_capacity(files.len());
    for file in files {
        let ignore = callback(&file).map_err(|e| Error::filter(&file, e))?;
        if ignore {
            tracing::debug!(file = %file.display(), "filtered out");
        } else {
            kept.push(file);
        }
    }
    Ok(kept)
}
