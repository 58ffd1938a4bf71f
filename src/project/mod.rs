//! Filesystem access: locating the report folder, reading definition files,
//! and the options that govern a resolution run.

pub mod config;
pub mod layout;
mod loader;
mod locator;

pub use config::{ResolveContext, ResolveOptions};
pub use layout::ReportLayout;
pub use loader::{DirEntry, list_subdirs, read_json};
pub use locator::FileLocator;
