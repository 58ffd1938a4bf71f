//! Host interfaces: the folder picker and last-opened-folder store.
//!
//! The shell owns the native dialog and persistence; the engine only sees
//! these two traits. [`Session`] wires them to [`ProjectIndex::open`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::project_index::ProjectIndex;
use crate::base::LoadResult;
use crate::project::{ResolveContext, ResolveOptions};

/// Native folder selection, supplied by the host shell.
pub trait FolderPicker {
    /// An absolute folder path, or `None` when the user cancelled.
    fn select_folder(&mut self) -> Option<PathBuf>;
}

impl<F> FolderPicker for F
where
    F: FnMut() -> Option<PathBuf>,
{
    fn select_folder(&mut self) -> Option<PathBuf> {
        self()
    }
}

/// Persistence for the last opened folder.
pub trait LastFolderStore {
    fn get(&self) -> Option<PathBuf>;
    fn set(&mut self, path: &Path);
}

/// In-memory store; forgets everything with the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryFolderStore {
    last: Option<PathBuf>,
}

impl LastFolderStore for MemoryFolderStore {
    fn get(&self) -> Option<PathBuf> {
        self.last.clone()
    }

    fn set(&mut self, path: &Path) {
        self.last = Some(path.to_owned());
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFolder {
    last_path: Option<PathBuf>,
}

/// Store backed by a small JSON file: `{ "lastPath": "..." }`.
///
/// Read and write failures are logged and otherwise ignored.
#[derive(Clone, Debug)]
pub struct JsonFolderStore {
    file: PathBuf,
}

impl JsonFolderStore {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl LastFolderStore for JsonFolderStore {
    fn get(&self) -> Option<PathBuf> {
        let text = fs::read_to_string(&self.file).ok()?;
        match serde_json::from_str::<StoredFolder>(&text) {
            Ok(stored) => stored.last_path,
            Err(err) => {
                tracing::warn!(
                    path = %self.file.display(),
                    error = %err,
                    "ignoring unreadable folder store"
                );
                None
            }
        }
    }

    fn set(&mut self, path: &Path) {
        let stored = StoredFolder {
            last_path: Some(path.to_owned()),
        };
        let result = serde_json::to_string_pretty(&stored)
            .map_err(std::io::Error::other)
            .and_then(|text| {
                if let Some(parent) = self.file.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.file, text)
            });
        if let Err(err) = result {
            tracing::warn!(path = %self.file.display(), error = %err, "failed to remember folder");
        }
    }
}

/// A host session: pick a folder, remember it, resolve it.
///
/// Every open builds a fresh [`ResolveContext`] and a fresh index.
pub struct Session<P, S> {
    picker: P,
    store: S,
    options: ResolveOptions,
}

impl<P: FolderPicker, S: LastFolderStore> Session<P, S> {
    pub fn new(picker: P, store: S, options: ResolveOptions) -> Self {
        Self {
            picker,
            store,
            options,
        }
    }

    /// Ask the host for a folder and open it. `Ok(None)` when cancelled.
    pub fn choose_and_open(&mut self) -> LoadResult<Option<ProjectIndex>> {
        let Some(folder) = self.picker.select_folder() else {
            tracing::debug!("folder selection cancelled");
            return Ok(None);
        };
        self.store.set(&folder);
        self.open(&folder).map(Some)
    }

    /// Reopen the remembered folder, if there is one.
    pub fn reopen_last(&self) -> LoadResult<Option<ProjectIndex>> {
        match self.store.get() {
            Some(folder) => self.open(&folder).map(Some),
            None => Ok(None),
        }
    }

    fn open(&self, folder: &Path) -> LoadResult<ProjectIndex> {
        let ctx = ResolveContext::new(self.options.clone());
        ProjectIndex::open(folder, &ctx)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
