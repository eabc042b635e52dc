use std::path::{Path, PathBuf};

use crate::error::Result;

/// A discovered extraction input file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the directory that was walked.
    pub relative_path: PathBuf,
    /// Fully resolved absolute path.
    pub absolute_path: PathBuf,
}

/// File extensions accepted as extraction inputs.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["json", "md", "txt"];

/// Recursively walk a directory and discover extraction input files.
///
/// Skips hidden files/directories (names starting with `.`) and only
/// returns files with supported extensions. Results are sorted by relative
/// path so ingestion order is stable.
pub fn discover_files(root: &Path) -> Result<Vec<DiscoveredFile>> {
    let canonical_root = root.canonicalize()?;
    let mut results = Vec::new();
    walk_dir(&canonical_root, &canonical_root, &mut results)?;
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    results: &mut Vec<DiscoveredFile>,
) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(root, &path, results)?;
        } else if file_type.is_symlink() {
            // Follow links to files only; linked directories could cycle.
            let Ok(resolved) = path.canonicalize() else {
                continue;
            };
            if resolved.is_file() && is_supported(&resolved) {
                results.push(discovered(root, &path, resolved));
            }
        } else if file_type.is_file() && is_supported(&path) {
            let absolute = path.canonicalize()?;
            results.push(discovered(root, &path, absolute));
        }
    }

    Ok(())
}

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

fn discovered(
    root: &Path,
    original_path: &Path,
    absolute_path: PathBuf,
) -> DiscoveredFile {
    let relative_path = original_path
        .strip_prefix(root)
        .unwrap_or(original_path)
        .to_path_buf();
    DiscoveredFile {
        relative_path,
        absolute_path,
    }
}
