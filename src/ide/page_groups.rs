//! Page groups: bookmarks arranged by the page they target.

use indexmap::IndexMap;

use crate::base::{BookmarkId, PageId};
use crate::hir::{BookmarkDefinition, BookmarkIndexEntry, Page};

/// Key for bookmarks whose target page is absent or could not be resolved.
pub const UNKNOWN_PAGE: &str = "Unknown";

/// The bookmarks targeting one page, as shown under that page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageGroup {
    /// The page, or `None` for the "Unknown" bucket.
    pub page: Option<Page>,
    /// Named bookmark groups, in index order.
    pub groups: IndexMap<String, Vec<BookmarkDefinition>>,
    /// Bookmarks not in any group, in index order.
    pub ungrouped: Vec<BookmarkDefinition>,
}

impl PageGroup {
    /// Every bookmark, grouped ones first.
    pub fn bookmarks(&self) -> impl Iterator<Item = &BookmarkDefinition> {
        self.groups.values().flatten().chain(self.ungrouped.iter())
    }

    pub fn bookmark_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum::<usize>() + self.ungrouped.len()
    }
}

/// Arrange bookmarks by target page name.
///
/// Pages appear in the order their first bookmark appears in the index.
/// `pages` holds only pages that resolved; a bookmark targeting any other
/// page lands in the [`UNKNOWN_PAGE`] bucket.
/// A group whose bookmarks target different pages is split across those
/// pages under the same group name.
pub fn group_by_page(
    entries: &[BookmarkIndexEntry],
    bookmarks: &IndexMap<BookmarkId, BookmarkDefinition>,
    pages: &IndexMap<PageId, Page>,
) -> IndexMap<String, PageGroup> {
    let mut grouped: IndexMap<String, PageGroup> = IndexMap::new();

    for entry in entries {
        for id in entry.bookmark_ids() {
            let bookmark = bookmarks
                .get(id)
                .cloned()
                .unwrap_or_else(|| BookmarkDefinition::fallback(id));
            let page = bookmark
                .target_page_id
                .as_ref()
                .and_then(|page_id| pages.get(page_id))
                .cloned();
            let key = page
                .as_ref()
                .map_or_else(|| UNKNOWN_PAGE.to_string(), |p| p.display_name.clone());

            let slot = grouped.entry(key).or_insert_with(|| PageGroup {
                page,
                ..PageGroup::default()
            });
            match entry.group_name() {
                Some(group) => slot.groups.entry(group.to_string()).or_default().push(bookmark),
                None => slot.ungrouped.push(bookmark),
            }
        }
    }

    grouped
}
