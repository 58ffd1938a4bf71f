//! Page display names.

use std::path::{Path, PathBuf};

use crate::base::json::non_empty_str_at;
use crate::base::{LoadResult, PageId};
use crate::project::layout::{PAGE_FILE, page_folder};
use crate::project::read_json;

/// A report page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Page {
    pub id: PageId,
    pub display_name: String,
}

impl Page {
    /// The page used when its definition cannot be loaded.
    pub fn fallback(id: &PageId) -> Self {
        Self {
            id: id.clone(),
            display_name: id.to_string(),
        }
    }
}

/// Resolves page ids to pages under a definition folder.
#[derive(Clone, Debug)]
pub struct PageResolver {
    definition_folder: PathBuf,
}

impl PageResolver {
    pub fn new(definition_folder: impl Into<PathBuf>) -> Self {
        Self {
            definition_folder: definition_folder.into(),
        }
    }

    /// The folder holding `page.json` and `visuals/` for a page.
    pub fn page_folder(&self, id: &PageId) -> PathBuf {
        page_folder(&self.definition_folder, id)
    }

    pub fn definition_folder(&self) -> &Path {
        &self.definition_folder
    }

    /// Load `pages/<id>/page.json`. A file without a `displayName` names
    /// the page by its id.
    pub fn try_resolve(&self, id: &PageId) -> LoadResult<Page> {
        let value = read_json(&self.page_folder(id).join(PAGE_FILE))?;
        Ok(Page {
            id: id.clone(),
            display_name: non_empty_str_at(&value, &["displayName"])
                .map(str::to_owned)
                .unwrap_or_else(|| id.to_string()),
        })
    }

    /// Resolve a page, falling back to its id on any failure.
    pub fn resolve(&self, id: &PageId) -> Page {
        self.try_resolve(id).unwrap_or_else(|err| {
            tracing::debug!(page = %id, error = %err, "using page id as display name");
            Page::fallback(id)
        })
    }
}
