//! Normalized model of a report folder, and the loaders that build it.
//!
//! Each loader returns `LoadResult<T>` from its `try_*` form; where a
//! documented fallback exists, an infallible form applies it:
//!
//! - [`BookmarkStore`] - bookmark index and bookmark definitions
//! - [`PageResolver`] - page display names
//! - [`VisualGraphBuilder`] - the visual forest of a page
//! - [`fields`] - field bindings of a visual
//! - [`diagnostics`] - record of applied fallbacks

mod bookmarks;
pub mod diagnostics;
pub mod fields;
mod pages;
mod visuals;

pub use bookmarks::{BookmarkDefinition, BookmarkIndexEntry, BookmarkOptions, BookmarkStore};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity};
pub use fields::{Field, FieldExpr, FieldType, VisualFields};
pub use pages::{Page, PageResolver};
pub use visuals::{Visual, VisualForest, VisualGraphBuilder};
