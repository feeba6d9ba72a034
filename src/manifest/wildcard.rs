// Wildcard pattern expansion module
// Expands input patterns and finds candidate manifest files using glob

use std::path::{Path, PathBuf};

use crate::error::{ManifestError, Result};

/// Expand a wildcard pattern into a list of matching paths
///
/// Supports patterns like:
/// - `*.nc` - matches all .nc files in current directory
/// - `file?.bin` - matches file1.bin, fileA.bin, etc.
/// - `data/*/output.bin` - matches output.bin in any subdirectory of data
///
/// Patterns without wildcard characters are returned as-is, whether or not
/// the file exists, so that the caller decides what a missing file means.
///
/// # Errors
/// Returns an error if the pattern is invalid or no matches are found
pub fn expand_pattern(pattern: &str) -> Result<Vec<String>> {
    if !contains_wildcard(pattern) {
        return Ok(vec![pattern.to_string()]);
    }

    let paths = glob::glob(pattern).map_err(|e| ManifestError::InvalidArguments {
        message: format!("Invalid glob pattern '{}': {}", pattern, e),
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ManifestError::InvalidArguments {
            message: format!("Error reading glob pattern '{}': {}", pattern, e),
        })?;
        matches.push(path.to_string_lossy().into_owned());
    }

    if matches.is_empty() {
        return Err(ManifestError::InvalidArguments {
            message: format!("No files match pattern '{}'", pattern),
        });
    }

    // Sort matches for consistent ordering
    matches.sort();
    Ok(matches)
}

/// Expand every input pattern, keeping the order the patterns were given in
pub fn expand_inputs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for pattern in patterns {
        files.extend(expand_pattern(pattern.as_ref())?);
    }
    Ok(files)
}

/// Recursively find files under `dir` whose names match any of `patterns`
///
/// Unreadable entries are skipped. Results are sorted.
pub fn find_files(dir: &Path, patterns: &[&str]) -> Vec<PathBuf> {
    let root = glob::Pattern::escape(&dir.to_string_lossy());
    let mut files = Vec::new();

    for pattern in patterns {
        let full = format!("{}/**/{}", root, pattern);
        let Ok(paths) = glob::glob(&full) else {
            continue;
        };
        files.extend(paths.filter_map(|entry| entry.ok()).filter(|p| p.is_file()));
    }

    files.sort();
    files.dedup();
    files
}

/// Check if a string contains wildcard characters
pub fn contains_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}
