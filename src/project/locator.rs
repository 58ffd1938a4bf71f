use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::config::{DEFAULT_REPORT_SUFFIX, ResolveContext};
use super::layout::bookmarks_index_in;
use crate::base::LoadResult;

/// Finds the bookmark index of the first report folder under a project root.
#[derive(Clone, Debug)]
pub struct FileLocator {
    report_suffix: String,
    sorted: bool,
}

impl FileLocator {
    pub fn new() -> Self {
        Self {
            report_suffix: DEFAULT_REPORT_SUFFIX.to_string(),
            sorted: false,
        }
    }

    /// Build a locator from the run options.
    pub fn from_context(ctx: &ResolveContext) -> Self {
        Self {
            report_suffix: ctx.options().report_suffix.clone(),
            sorted: ctx.options().sort_entries,
        }
    }

    pub fn with_report_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.report_suffix = suffix.into();
        self
    }

    /// Visit siblings sorted by name instead of in listing order.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Depth-first, pre-order search below `root`.
    ///
    /// Returns the index file of the first report folder that has one.
    /// A report folder without the file is descended into like any other
    /// directory. Unreadable directories are skipped.
    pub fn locate(&self, root: &Path) -> Option<PathBuf> {
        self.search(root, || Ok(())).ok().flatten()
    }

    /// Like [`locate`](Self::locate), checking for cancellation before
    /// each directory.
    pub fn locate_with(&self, root: &Path, ctx: &ResolveContext) -> LoadResult<Option<PathBuf>> {
        self.search(root, || ctx.checkpoint())
    }

    fn search(
        &self,
        root: &Path,
        checkpoint: impl Fn() -> LoadResult<()>,
    ) -> LoadResult<Option<PathBuf>> {
        let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
        if self.sorted {
            walker = walker.sort_by_file_name();
        }

        let dirs = walker.into_iter().filter_entry(|e| e.file_type().is_dir());
        for entry in dirs {
            checkpoint()?;
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable directory");
                    continue;
                }
            };
            if !self.is_report_dir(entry.file_name().to_str()) {
                continue;
            }
            let candidate = bookmarks_index_in(entry.path());
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "found bookmark index");
                return Ok(Some(candidate));
            }
            tracing::debug!(dir = %entry.path().display(), "report folder has no bookmark index");
        }
        Ok(None)
    }

    fn is_report_dir(&self, name: Option<&str>) -> bool {
        name.is_some_and(|n| n.ends_with(&self.report_suffix))
    }
}

impl Default for FileLocator {
    fn default() -> Self {
        Self::new()
    }
}
