//! # pbir-lens
//!
//! Resolution engine for report project folders. Given a project directory,
//! it finds the report's bookmark index, loads bookmark and page definitions,
//! rebuilds visual-group hierarchies from flat parent pointers, and extracts
//! the data fields each visual is bound to.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide      → ProjectIndex, page groups, page detail, outline, host traits
//!   ↓
//! hir      → Bookmarks, pages, visual forest, field bindings, diagnostics
//!   ↓
//! project  → Report folder layout, locator, file loading, run options
//!   ↓
//! base     → Primitives (ids, LoadError, JSON node views)
//! ```
//!
//! Everything is read-only over the report folder. A run never fails on bad
//! input: missing or malformed definitions fall back to their identifiers
//! and are recorded as diagnostics.

/// Foundation types: ids, errors, JSON views
pub mod base;

/// Filesystem layout, locator, loaders and run options
pub mod project;

/// Normalized report model and its loaders
pub mod hir;

/// Presentation-facing composition root
pub mod ide;

pub use base::{BookmarkId, FailureKind, LoadError, PageId, VisualId};
pub use ide::ProjectIndex;
pub use project::{ResolveContext, ResolveOptions};
