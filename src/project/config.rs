//! Run configuration and the per-run resolution context.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::base::{LoadError, LoadResult};

/// Directory-name suffix that marks a report folder.
pub const DEFAULT_REPORT_SUFFIX: &str = ".Report";

/// Default cap on concurrent definition and visual loads.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Options for a resolution run.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveOptions {
    /// Directory-name suffix recognized as a report folder.
    pub report_suffix: String,
    /// Upper bound on concurrently loaded files.
    pub max_concurrency: usize,
    /// Deadline for the whole run, in milliseconds.
    pub deadline_ms: Option<u64>,
    /// Sort directory listings by file name instead of using listing order.
    pub sort_entries: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            report_suffix: DEFAULT_REPORT_SUFFIX.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            deadline_ms: None,
            sort_entries: false,
        }
    }
}

impl ResolveOptions {
    /// Load options from a JSON file.
    pub fn from_json_file(path: &Path) -> LoadResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e))?;
        serde_json::from_str(&text).map_err(|source| LoadError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn with_report_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.report_suffix = suffix.into();
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(deadline.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn with_sorted_entries(mut self, sorted: bool) -> Self {
        self.sort_entries = sorted;
        self
    }

    /// The concurrency cap, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

/// State shared by every stage of one resolution run.
///
/// Holds the cancellation token, the absolute deadline, and the bounded
/// thread pool used for independent file loads. Nothing in here is mutated
/// by the stages themselves.
pub struct ResolveContext {
    options: ResolveOptions,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    pool: Option<rayon::ThreadPool>,
}

impl ResolveContext {
    /// Create a context. The deadline clock starts now.
    pub fn new(options: ResolveOptions) -> Self {
        let deadline = options
            .deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(options.concurrency())
            .thread_name(|i| format!("pbir-load-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                tracing::warn!(error = %err, "load pool unavailable, loading sequentially");
                None
            }
        };
        Self {
            options,
            cancel: CancellationToken::new(),
            deadline,
            pool,
        }
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Override the deadline with an absolute instant.
    pub fn with_deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cooperative check between file operations and stages.
    pub fn checkpoint(&self) -> LoadResult<()> {
        if self.cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(LoadError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Map independent loads over `items`, bounded by the concurrency cap.
    ///
    /// Results keep the order of `items`.
    pub fn par_map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            None => items.iter().map(f).collect(),
        }
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(ResolveOptions::default())
    }
}

impl std::fmt::Debug for ResolveContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveContext")
            .field("options", &self.options)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let options: ResolveOptions = serde_json::from_str(r#"{ "maxConcurrency": 2 }"#).unwrap();
        assert_eq!(options.max_concurrency, 2);
        assert_eq!(options.report_suffix, ".Report");
        assert_eq!(options.deadline_ms, None);
        assert!(!options.sort_entries);
    }

    #[test]
    fn test_concurrency_clamped() {
        let options = ResolveOptions::default().with_max_concurrency(0);
        assert_eq!(options.concurrency(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lens.json");
        fs::write(&path, r#"{ "reportSuffix": ".Rpt", "sortEntries": true }"#).unwrap();

        let options = ResolveOptions::from_json_file(&path).unwrap();
        assert_eq!(options.report_suffix, ".Rpt");
        assert!(options.sort_entries);
    }

    #[test]
    fn test_checkpoint_cancelled() {
        let token = CancellationToken::new();
        let ctx = ResolveContext::default().with_cancellation(token.clone());
        assert!(ctx.checkpoint().is_ok());

        token.cancel();
        assert!(matches!(ctx.checkpoint(), Err(LoadError::Cancelled)));
    }

    #[test]
    fn test_checkpoint_deadline() {
        let ctx = ResolveContext::default().with_deadline_at(Instant::now());
        assert!(matches!(ctx.checkpoint(), Err(LoadError::DeadlineExceeded)));
    }

    #[test]
    fn test_par_map_keeps_order() {
        let ctx = ResolveContext::new(ResolveOptions::default().with_max_concurrency(3));
        let items: Vec<u32> = (0..50).collect();
        let doubled = ctx.par_map(&items, |n| n * 2);
        assert_eq!(doubled, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }
}
