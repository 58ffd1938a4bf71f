//! Load errors and their failure taxonomy.
//!
//! Every loader returns `Result<T, LoadError>`. Callers never inspect the
//! variants directly to decide on a fallback; they go through
//! [`LoadError::kind`], so that a single policy per [`FailureKind`] can be
//! applied at the call site.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure classes a resolution run distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Expected absence. Resolved through a documented fallback.
    NotFound,
    /// Malformed structured content.
    ParseFailure,
    /// A directory listing failed for a reason other than absence.
    DirectoryUnavailable,
    /// The run was cancelled or ran past its deadline.
    Interrupted,
}

/// An error raised while loading a project artifact.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("directory {} could not be listed: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("resolution cancelled")]
    Cancelled,

    #[error("resolution deadline exceeded")]
    DeadlineExceeded,
}

impl LoadError {
    /// Classify a file read failure.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound { path: path.to_owned() }
        } else {
            LoadError::Io { path: path.to_owned(), source }
        }
    }

    /// Classify a directory listing failure.
    pub fn from_dir_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound { path: path.to_owned() }
        } else {
            LoadError::DirectoryUnavailable { path: path.to_owned(), source }
        }
    }

    /// The failure class of this error.
    ///
    /// An unreadable regular file is treated like a missing one.
    pub fn kind(&self) -> FailureKind {
        match self {
            LoadError::NotFound { .. } | LoadError::Io { .. } => FailureKind::NotFound,
            LoadError::Parse { .. } => FailureKind::ParseFailure,
            LoadError::DirectoryUnavailable { .. } => FailureKind::DirectoryUnavailable,
            LoadError::Cancelled | LoadError::DeadlineExceeded => FailureKind::Interrupted,
        }
    }

    /// Whether this error ends the whole run rather than a single load.
    pub fn is_interrupt(&self) -> bool {
        self.kind() == FailureKind::Interrupted
    }

    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LoadError::NotFound { path }
            | LoadError::Io { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::DirectoryUnavailable { path, .. } => Some(path),
            LoadError::Cancelled | LoadError::DeadlineExceeded => None,
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
