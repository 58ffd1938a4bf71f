//! Filesystem layout of a report folder.
//!
//! ```text
//! <name>.Report/
//!   definition/
//!     bookmarks/
//!       bookmarks.json              index
//!       <id>.bookmark.json          one bookmark
//!     pages/
//!       <pageId>/
//!         page.json
//!         visuals/<visualId>/visual.json
//! ```
//!
//! All paths are case-sensitive.

use std::path::{Path, PathBuf};

use crate::base::{BookmarkId, PageId};

/// Location of the bookmark index relative to a report folder.
pub const BOOKMARKS_INDEX_PATH: [&str; 3] = ["definition", "bookmarks", "bookmarks.json"];

pub const BOOKMARK_FILE_SUFFIX: &str = ".bookmark.json";
pub const PAGES_DIR: &str = "pages";
pub const PAGE_FILE: &str = "page.json";
pub const VISUALS_DIR: &str = "visuals";
pub const VISUAL_FILE: &str = "visual.json";

/// The bookmark index path inside a report folder.
pub fn bookmarks_index_in(report_dir: &Path) -> PathBuf {
    BOOKMARKS_INDEX_PATH
        .iter()
        .fold(report_dir.to_path_buf(), |path, part| path.join(part))
}

/// `<bookmark-folder>/<id>.bookmark.json`
pub fn bookmark_file(bookmark_folder: &Path, id: &BookmarkId) -> PathBuf {
    bookmark_folder.join(format!("{}{}", id, BOOKMARK_FILE_SUFFIX))
}

/// `<definition-folder>/pages/<pageId>`
pub fn page_folder(definition_folder: &Path, page: &PageId) -> PathBuf {
    definition_folder.join(PAGES_DIR).join(page.as_str())
}

/// Paths derived from a located bookmark index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportLayout {
    bookmarks_file: PathBuf,
    bookmark_folder: PathBuf,
    definition_folder: PathBuf,
}

impl ReportLayout {
    /// Derive the layout from the path of `bookmarks.json`.
    pub fn from_bookmarks_file(bookmarks_file: impl Into<PathBuf>) -> Self {
        let bookmarks_file = bookmarks_file.into();
        let bookmark_folder = bookmarks_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let definition_folder = bookmark_folder
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            bookmarks_file,
            bookmark_folder,
            definition_folder,
        }
    }

    pub fn bookmarks_file(&self) -> &Path {
        &self.bookmarks_file
    }

    pub fn bookmark_folder(&self) -> &Path {
        &self.bookmark_folder
    }

    pub fn definition_folder(&self) -> &Path {
        &self.definition_folder
    }

    pub fn page_folder(&self, page: &PageId) -> PathBuf {
        page_folder(&self.definition_folder, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_from_index() {
        let report = Path::new("/work/Sales.Report");
        let layout = ReportLayout::from_bookmarks_file(bookmarks_index_in(report));

        assert_eq!(layout.bookmark_folder(), report.join("definition/bookmarks"));
        assert_eq!(layout.definition_folder(), report.join("definition"));
        assert_eq!(
            layout.page_folder(&PageId::new("p1")),
            report.join("definition/pages/p1")
        );
    }

    #[test]
    fn test_bookmark_file_name() {
        let path = bookmark_file(Path::new("/b"), &BookmarkId::new("Bookmark42"));
        assert_eq!(path, Path::new("/b/Bookmark42.bookmark.json"));
    }
}
