//! Fixture projects built in temporary directories.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A report folder at `relative` (e.g. `"Sales.Report"`).
    pub fn report(&self, relative: &str) -> ReportFixture {
        let dir = self.root().join(relative);
        fs::create_dir_all(dir.join("definition/bookmarks")).unwrap();
        ReportFixture { dir }
    }
}

pub struct ReportFixture {
    dir: PathBuf,
}

impl ReportFixture {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn definition(&self) -> PathBuf {
        self.dir.join("definition")
    }

    pub fn index_path(&self) -> PathBuf {
        self.definition().join("bookmarks/bookmarks.json")
    }

    pub fn bookmarks_index(&self, items: Value) -> &Self {
        write(&self.index_path(), &json!({ "items": items }).to_string());
        self
    }

    pub fn bookmark(&self, id: &str, definition: Value) -> &Self {
        self.bookmark_raw(id, &definition.to_string())
    }

    pub fn bookmark_raw(&self, id: &str, text: &str) -> &Self {
        write(
            &self.definition().join(format!("bookmarks/{id}.bookmark.json")),
            text,
        );
        self
    }

    pub fn page(&self, id: &str, display_name: &str) -> &Self {
        let page = json!({ "name": id, "displayName": display_name });
        write(&self.page_dir(id).join("page.json"), &page.to_string());
        self
    }

    pub fn page_dir(&self, id: &str) -> PathBuf {
        self.definition().join("pages").join(id)
    }

    pub fn visual(&self, page: &str, id: &str, payload: Value) -> &Self {
        self.visual_raw(page, id, &payload.to_string())
    }

    pub fn visual_raw(&self, page: &str, id: &str, text: &str) -> &Self {
        write(
            &self.page_dir(page).join("visuals").join(id).join("visual.json"),
            text,
        );
        self
    }
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// A bookmark definition targeting `page`.
pub fn bookmark_on(display_name: &str, page: &str) -> Value {
    json!({
        "displayName": display_name,
        "explorationState": { "activeSection": page }
    })
}

/// A field reference node for a column.
pub fn column_ref(entity: &str, property: &str, query_ref: &str) -> Value {
    json!({
        "field": { "Column": {
            "Expression": { "SourceRef": { "Entity": entity } },
            "Property": property
        } },
        "queryRef": query_ref
    })
}
