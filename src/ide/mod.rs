//! Presentation-facing APIs built on the `hir` loaders.
//!
//! ## Design Principles
//!
//! 1. **Fresh results**: every run builds new, immutable values
//! 2. **No UI types**: rows and views are plain data, rendered by the host
//! 3. **Fallbacks at one place**: loader errors are settled in [`ProjectIndex`]
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use pbir_lens::ide::ProjectIndex;
//! use pbir_lens::project::ResolveContext;
//!
//! let ctx = ResolveContext::default();
//! let index = ProjectIndex::open(Path::new("/path/to/project"), &ctx)?;
//! for (page, group) in index.page_groups() {
//!     println!("{page}: {} bookmarks", group.bookmark_count());
//! }
//! # Ok::<(), pbir_lens::base::LoadError>(())
//! ```

mod host;
mod outline;
mod page_detail;
mod page_groups;
mod project_index;

pub use host::{FolderPicker, JsonFolderStore, LastFolderStore, MemoryFolderStore, Session};
pub use outline::{OutlineKind, OutlineRow, page_detail_outline, page_group_outline};
pub use page_detail::{PageDetail, VisualsView};
pub use page_groups::{PageGroup, UNKNOWN_PAGE, group_by_page};
pub use project_index::ProjectIndex;
