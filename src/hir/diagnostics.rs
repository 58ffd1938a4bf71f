//! Diagnostics: recorded fallbacks and skipped artifacts.
//!
//! Nothing in a resolution run is fatal. When a loader fails and a fallback
//! is applied instead, the event is recorded here so the outcome stays
//! auditable even though the caller only sees the fallback value.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::base::{FailureKind, LoadError, VisualId};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Info,
}

/// A diagnostic message, optionally tied to a file or directory.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// The file or directory the event concerns.
    pub path: Option<PathBuf>,
    /// Severity level.
    pub severity: Severity,
    /// Diagnostic code (e.g., "F0001").
    pub code: Arc<str>,
    /// The diagnostic message.
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<Arc<str>>) -> Self {
        Self {
            path: None,
            severity: Severity::Warning,
            code: Arc::from(code),
            message: message.into(),
        }
    }

    pub fn info(code: &str, message: impl Into<Arc<str>>) -> Self {
        Self {
            path: None,
            severity: Severity::Info,
            code: Arc::from(code),
            message: message.into(),
        }
    }

    /// Attach the path the diagnostic concerns.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

pub mod codes {
    /// Definition file missing or unreadable; fallback applied.
    pub const DEFINITION_MISSING: &str = "F0001";
    /// Definition file malformed; fallback applied.
    pub const DEFINITION_MALFORMED: &str = "F0002";
    /// Directory listing failed.
    pub const DIRECTORY_UNAVAILABLE: &str = "F0003";
    /// Visual excluded from its page.
    pub const VISUAL_SKIPPED: &str = "F0004";
    /// Parent pointer ignored (dangling, self-referential, or cyclic).
    pub const PARENT_IGNORED: &str = "F0005";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a resolution run.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Record that `subject` fell back to its identifier because `err`.
    pub fn fallback_applied(&mut self, subject: &str, err: &LoadError) {
        let diag = match err.kind() {
            FailureKind::ParseFailure => Diagnostic::warning(
                codes::DEFINITION_MALFORMED,
                format!("{subject}: malformed definition, using fallback: {err}"),
            ),
            FailureKind::DirectoryUnavailable => Diagnostic::warning(
                codes::DIRECTORY_UNAVAILABLE,
                format!("{subject}: {err}"),
            ),
            FailureKind::NotFound | FailureKind::Interrupted => Diagnostic::info(
                codes::DEFINITION_MISSING,
                format!("{subject}: definition unavailable, using fallback: {err}"),
            ),
        };
        self.add(with_error_path(diag, err));
    }

    /// Record a visual excluded from its page.
    pub fn visual_skipped(&mut self, visual: &str, err: &LoadError) {
        let diag = Diagnostic::warning(
            codes::VISUAL_SKIPPED,
            format!("visual '{visual}' skipped: {err}"),
        );
        self.add(with_error_path(diag, err));
    }

    /// Record a parent pointer that was not followed.
    pub fn parent_ignored(&mut self, visual: &VisualId, parent: &VisualId, reason: &str) {
        self.add(Diagnostic::info(
            codes::PARENT_IGNORED,
            format!("visual '{visual}' parent '{parent}' ignored: {reason}"),
        ));
    }

    /// Record a directory that could not be listed.
    pub fn directory_unavailable(&mut self, path: &Path, err: &LoadError) {
        self.add(
            Diagnostic::warning(codes::DIRECTORY_UNAVAILABLE, err.to_string()).with_path(path),
        );
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics carrying a given code.
    pub fn with_code(&self, code: &str) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code.as_ref() == code).collect()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

fn with_error_path(diag: Diagnostic, err: &LoadError) -> Diagnostic {
    match err.path() {
        Some(path) => diag.with_path(path),
        None => diag,
    }
}
