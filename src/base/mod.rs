//! Foundation types for the resolution engine.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`BookmarkId`], [`PageId`], [`VisualId`] - Artifact identifiers
//! - [`LoadError`], [`FailureKind`] - Loader errors and their taxonomy
//! - [`json`] - Node classification and path lookups over parsed JSON
//!
//! This module has NO dependencies on other crate modules.

mod error;
mod ids;
pub mod json;

pub use error::{FailureKind, LoadError, LoadResult};
pub use ids::{BookmarkId, PageId, VisualId};
