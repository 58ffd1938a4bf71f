use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::base::{LoadError, LoadResult};

/// Read and parse one JSON file.
pub fn read_json(path: &Path) -> LoadResult<Value> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e))?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// A subdirectory found by [`list_subdirs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
}

/// List the immediate subdirectories of `dir`.
///
/// A missing `dir` is `NotFound`; any other listing failure is
/// `DirectoryUnavailable`. Entries that vanish or cannot be inspected
/// mid-listing are skipped.
pub fn list_subdirs(dir: &Path, sorted: bool) -> LoadResult<Vec<DirEntry>> {
    let listing = fs::read_dir(dir).map_err(|e| LoadError::from_dir_io(dir, e))?;

    let mut entries = Vec::new();
    for entry in listing {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 directory name");
            continue;
        };
        entries.push(DirEntry {
            name,
            path: entry.path(),
        });
    }

    if sorted {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(entries)
}
