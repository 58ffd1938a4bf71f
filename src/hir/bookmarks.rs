//! Bookmark index and bookmark definitions.
//!
//! The index file lists bookmarks in display order. Entries are either
//! groups or leaves, told apart by shape rather than by a type tag:
//!
//! ```json
//! { "items": [
//!     { "name": "g1", "displayName": "Filters", "children": ["b1", "b2"] },
//!     { "name": "b3" }
//! ] }
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde_json::Value;

use crate::base::json::{flag_at, non_empty_str_at, str_at};
use crate::base::{BookmarkId, LoadResult, PageId, VisualId};
use crate::project::layout::bookmark_file;
use crate::project::read_json;

/// One entry of the bookmark index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookmarkIndexEntry {
    Group {
        display_name: String,
        children: Vec<BookmarkId>,
    },
    Leaf(BookmarkId),
}

impl BookmarkIndexEntry {
    /// Classify one element of the index array.
    ///
    /// An object with a `children` array is a group when it also has a
    /// `displayName` or at least one child. Anything else with a `name`
    /// (or `id`) is a leaf. A bare string is a leaf id.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(id) = value.as_str().filter(|s| !s.is_empty()) {
            return Some(BookmarkIndexEntry::Leaf(BookmarkId::new(id)));
        }

        let display_name = non_empty_str_at(value, &["displayName"]);
        if let Some(children) = value.get("children").and_then(Value::as_array) {
            if display_name.is_some() || !children.is_empty() {
                let display_name = display_name
                    .or_else(|| non_empty_str_at(value, &["name"]))
                    .unwrap_or("Group");
                return Some(BookmarkIndexEntry::Group {
                    display_name: display_name.to_string(),
                    children: children.iter().filter_map(child_id).collect(),
                });
            }
        }

        non_empty_str_at(value, &["name"])
            .or_else(|| non_empty_str_at(value, &["id"]))
            .map(|id| BookmarkIndexEntry::Leaf(BookmarkId::new(id)))
    }

    /// Bookmark ids referenced by this entry, in order.
    pub fn bookmark_ids(&self) -> &[BookmarkId] {
        match self {
            BookmarkIndexEntry::Group { children, .. } => children,
            BookmarkIndexEntry::Leaf(id) => std::slice::from_ref(id),
        }
    }

    pub fn group_name(&self) -> Option<&str> {
        match self {
            BookmarkIndexEntry::Group { display_name, .. } => Some(display_name),
            BookmarkIndexEntry::Leaf(_) => None,
        }
    }
}

fn child_id(value: &Value) -> Option<BookmarkId> {
    value
        .as_str()
        .or_else(|| str_at(value, &["name"]))
        .filter(|s| !s.is_empty())
        .map(BookmarkId::new)
}

/// Per-bookmark visual targeting options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookmarkOptions {
    pub apply_only_to_target_visuals: bool,
    pub suppress_active_section: bool,
    pub suppress_data: bool,
    pub suppress_display: bool,
    pub target_visual_ids: IndexSet<VisualId>,
}

impl BookmarkOptions {
    fn from_value(value: &Value) -> Self {
        let target_visual_ids = ["targetVisualNames", "targetVisualIds"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_array))
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(VisualId::new)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            apply_only_to_target_visuals: flag_at(value, &["applyOnlyToTargetVisuals"]),
            suppress_active_section: flag_at(value, &["suppressActiveSection"]),
            suppress_data: flag_at(value, &["suppressData"]),
            suppress_display: flag_at(value, &["suppressDisplay"]),
            target_visual_ids,
        }
    }

    /// Whether the bookmark applies to this visual.
    pub fn targets(&self, visual: &VisualId) -> bool {
        !self.apply_only_to_target_visuals || self.target_visual_ids.contains(visual)
    }
}

/// A bookmark definition: a saved view state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookmarkDefinition {
    pub id: BookmarkId,
    pub display_name: String,
    pub target_page_id: Option<PageId>,
    pub options: BookmarkOptions,
}

impl BookmarkDefinition {
    /// The definition used when the file cannot be loaded.
    pub fn fallback(id: &BookmarkId) -> Self {
        Self {
            id: id.clone(),
            display_name: id.to_string(),
            target_page_id: None,
            options: BookmarkOptions::default(),
        }
    }

    /// Read a parsed definition permissively.
    pub fn from_value(id: &BookmarkId, value: &Value) -> Self {
        let options = value
            .get("options")
            .map(BookmarkOptions::from_value)
            .unwrap_or_default();
        Self {
            id: id.clone(),
            display_name: non_empty_str_at(value, &["displayName"])
                .map(str::to_owned)
                .unwrap_or_else(|| id.to_string()),
            target_page_id: non_empty_str_at(value, &["explorationState", "activeSection"])
                .map(PageId::new),
            options,
        }
    }
}

/// Reads the bookmark index and per-bookmark definition files.
#[derive(Clone, Debug)]
pub struct BookmarkStore {
    folder: PathBuf,
}

impl BookmarkStore {
    /// Create a store over the folder holding `bookmarks.json`.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self { folder: folder.into() }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Load the index entries, in file order.
    ///
    /// The entry array may be the whole document or sit under `items` or
    /// `bookmarks`. Elements that are neither group nor leaf are dropped.
    pub fn load_index(bookmarks_file: &Path) -> LoadResult<Vec<BookmarkIndexEntry>> {
        let document = read_json(bookmarks_file)?;
        let entries = match &document {
            Value::Array(items) => Some(items),
            other => ["items", "bookmarks"]
                .iter()
                .find_map(|key| other.get(*key).and_then(Value::as_array)),
        };
        let Some(entries) = entries else {
            tracing::debug!(path = %bookmarks_file.display(), "bookmark index has no entry array");
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let parsed = BookmarkIndexEntry::from_value(entry);
                if parsed.is_none() {
                    tracing::debug!(entry = %entry, "ignoring unrecognized bookmark index entry");
                }
                parsed
            })
            .collect())
    }

    /// Load one definition, reporting why it could not be loaded.
    pub fn try_load_definition(&self, id: &BookmarkId) -> LoadResult<BookmarkDefinition> {
        let value = read_json(&bookmark_file(&self.folder, id))?;
        Ok(BookmarkDefinition::from_value(id, &value))
    }

    /// Load one definition, falling back to the id on any failure.
    pub fn load_definition(&self, id: &BookmarkId) -> BookmarkDefinition {
        self.try_load_definition(id).unwrap_or_else(|err| {
            tracing::debug!(bookmark = %id, error = %err, "using fallback bookmark definition");
            BookmarkDefinition::fallback(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::fs;

    #[rstest]
    #[case::group(json!({ "name": "g", "displayName": "Filters", "children": ["b1", "b2"] }), Some("Filters"), 2)]
    #[case::empty_group(json!({ "displayName": "Empty", "children": [] }), Some("Empty"), 0)]
    #[case::unnamed_group(json!({ "name": "g7", "children": ["b1"] }), Some("g7"), 1)]
    #[case::leaf(json!({ "name": "b3" }), None, 1)]
    #[case::leaf_with_empty_children(json!({ "name": "b4", "children": [] }), None, 1)]
    #[case::bare_string(json!("b5"), None, 1)]
    fn test_index_entry_shapes(
        #[case] value: Value,
        #[case] group: Option<&str>,
        #[case] bookmarks: usize,
    ) {
        let entry = BookmarkIndexEntry::from_value(&value).unwrap();
        assert_eq!(entry.group_name(), group);
        assert_eq!(entry.bookmark_ids().len(), bookmarks);
    }

    #[test]
    fn test_unrecognized_entry() {
        assert_eq!(BookmarkIndexEntry::from_value(&json!({ "displayName": "x" })), None);
        assert_eq!(BookmarkIndexEntry::from_value(&json!(42)), None);
    }

    #[test]
    fn test_load_index_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");

        fs::write(&path, r#"{ "items": [{ "name": "b1" }, { "name": "b2" }] }"#).unwrap();
        assert_eq!(BookmarkStore::load_index(&path).unwrap().len(), 2);

        fs::write(&path, r#"{ "bookmarks": [{ "name": "b1" }] }"#).unwrap();
        assert_eq!(BookmarkStore::load_index(&path).unwrap().len(), 1);

        fs::write(&path, r#"[{ "id": "b1" }, "b2", { "bogus": true }]"#).unwrap();
        let entries = BookmarkStore::load_index(&path).unwrap();
        assert_eq!(
            entries,
            vec![
                BookmarkIndexEntry::Leaf(BookmarkId::new("b1")),
                BookmarkIndexEntry::Leaf(BookmarkId::new("b2")),
            ]
        );
    }

    #[test]
    fn test_definition_fields() {
        let value = json!({
            "displayName": "Q1 view",
            "explorationState": { "activeSection": "p1" },
            "options": {
                "applyOnlyToTargetVisuals": true,
                "suppressData": true,
                "targetVisualNames": ["v1", "v2"]
            }
        });
        let def = BookmarkDefinition::from_value(&BookmarkId::new("b1"), &value);

        assert_eq!(def.display_name, "Q1 view");
        assert_eq!(def.target_page_id, Some(PageId::new("p1")));
        assert!(def.options.apply_only_to_target_visuals);
        assert!(def.options.suppress_data);
        assert!(!def.options.suppress_display);
        assert!(!def.options.suppress_active_section);
        assert!(def.options.targets(&VisualId::new("v2")));
        assert!(!def.options.targets(&VisualId::new("v3")));
    }

    #[test]
    fn test_options_absent_default_false() {
        let def = BookmarkDefinition::from_value(&BookmarkId::new("b1"), &json!({}));
        assert_eq!(def.display_name, "b1");
        assert_eq!(def.target_page_id, None);
        assert_eq!(def.options, BookmarkOptions::default());
        assert!(def.options.targets(&VisualId::new("any")));
    }

    #[test]
    fn test_corrupted_definition_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b1.bookmark.json"), "{ \"displayName\": ").unwrap();
        let store = BookmarkStore::new(dir.path());

        let id = BookmarkId::new("b1");
        assert!(store.try_load_definition(&id).is_err());
        let def = store.load_definition(&id);
        assert_eq!(def, BookmarkDefinition::fallback(&id));
        assert_eq!(def.display_name, "b1");
    }

    #[test]
    fn test_missing_definition_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookmarkStore::new(dir.path());
        let def = store.load_definition(&BookmarkId::new("ghost"));
        assert_eq!(def.display_name, "ghost");
    }
}
