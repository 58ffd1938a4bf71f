//! ProjectIndex: the composition root of a resolution run.
//!
//! Opening a project runs the loaders in order:
//!
//! ```text
//! FileLocator → BookmarkStore (index, then definitions in parallel)
//!             → PageResolver (each target page once, in parallel)
//!             → group_by_page
//! ```
//!
//! Selecting a bookmark afterwards runs PageResolver and VisualGraphBuilder
//! for its target page. Every loader failure is settled here by the
//! fallback for its failure kind and recorded in the index diagnostics;
//! only cancellation and deadline expiry end a run early.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};

use super::page_detail::{PageDetail, VisualsView};
use super::page_groups::{PageGroup, group_by_page};
use crate::base::{BookmarkId, FailureKind, LoadResult, PageId};
use crate::hir::{
    BookmarkDefinition, BookmarkIndexEntry, BookmarkStore, DiagnosticCollector, Page,
    PageResolver, VisualForest, VisualGraphBuilder,
};
use crate::project::{FileLocator, ReportLayout, ResolveContext};

/// The resolved bookmark and page structure of one project folder.
#[derive(Clone, Debug)]
pub struct ProjectIndex {
    root: PathBuf,
    layout: Option<ReportLayout>,
    entries: Vec<BookmarkIndexEntry>,
    bookmarks: IndexMap<BookmarkId, BookmarkDefinition>,
    pages: IndexMap<PageId, Page>,
    unresolved_pages: IndexSet<PageId>,
    page_groups: IndexMap<String, PageGroup>,
    diagnostics: DiagnosticCollector,
}

impl ProjectIndex {
    /// Resolve the project under `root`.
    ///
    /// A project without any report folder yields an empty index. Errors are
    /// only returned when the run is cancelled or misses its deadline.
    pub fn open(root: &Path, ctx: &ResolveContext) -> LoadResult<Self> {
        let mut index = Self::empty(root);

        ctx.checkpoint()?;
        let Some(bookmarks_file) = FileLocator::from_context(ctx).locate_with(root, ctx)? else {
            tracing::info!(root = %root.display(), "no report folder with bookmarks found");
            return Ok(index);
        };
        let layout = ReportLayout::from_bookmarks_file(bookmarks_file);

        ctx.checkpoint()?;
        index.entries = settle(
            BookmarkStore::load_index(layout.bookmarks_file()),
            Vec::new,
            "bookmark index",
            &mut index.diagnostics,
        )?;

        index.bookmarks = index.load_bookmarks(&layout, ctx)?;
        index.resolve_pages(&layout, ctx)?;
        index.page_groups = group_by_page(&index.entries, &index.bookmarks, &index.pages);
        index.layout = Some(layout);

        tracing::debug!(
            bookmarks = index.bookmarks.len(),
            pages = index.page_groups.len(),
            fallbacks = index.diagnostics.len(),
            "project resolved"
        );
        Ok(index)
    }

    fn empty(root: &Path) -> Self {
        Self {
            root: root.to_owned(),
            layout: None,
            entries: Vec::new(),
            bookmarks: IndexMap::new(),
            pages: IndexMap::new(),
            unresolved_pages: IndexSet::new(),
            page_groups: IndexMap::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn load_bookmarks(
        &mut self,
        layout: &ReportLayout,
        ctx: &ResolveContext,
    ) -> LoadResult<IndexMap<BookmarkId, BookmarkDefinition>> {
        let ids: Vec<BookmarkId> = self
            .entries
            .iter()
            .flat_map(|entry| entry.bookmark_ids().iter().cloned())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();

        let store = BookmarkStore::new(layout.bookmark_folder());
        let loaded = ctx.par_map(&ids, |id| {
            ctx.checkpoint()?;
            store.try_load_definition(id)
        });
        ctx.checkpoint()?;

        let mut bookmarks = IndexMap::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(loaded) {
            let definition = settle(
                result,
                || BookmarkDefinition::fallback(id),
                &format!("bookmark '{id}'"),
                &mut self.diagnostics,
            )?;
            bookmarks.insert(id.clone(), definition);
        }
        Ok(bookmarks)
    }

    /// Resolve every targeted page once. Pages that fail to load are kept
    /// out of `pages` and remembered as unresolved.
    fn resolve_pages(&mut self, layout: &ReportLayout, ctx: &ResolveContext) -> LoadResult<()> {
        let ids: Vec<PageId> = self
            .bookmarks
            .values()
            .filter_map(|b| b.target_page_id.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();

        let resolver = PageResolver::new(layout.definition_folder());
        let resolved = ctx.par_map(&ids, |id| {
            ctx.checkpoint()?;
            resolver.try_resolve(id)
        });
        ctx.checkpoint()?;

        for (id, result) in ids.iter().zip(resolved) {
            let page = settle(
                result.map(Some),
                || None,
                &format!("page '{id}'"),
                &mut self.diagnostics,
            )?;
            match page {
                Some(page) => {
                    self.pages.insert(id.clone(), page);
                }
                None => {
                    self.unresolved_pages.insert(id.clone());
                }
            }
        }
        Ok(())
    }

    /// Build the detail view for a bookmark.
    ///
    /// Unknown bookmark ids are treated like bookmarks without a definition.
    pub fn page_detail(
        &self,
        bookmark: &BookmarkId,
        ctx: &ResolveContext,
    ) -> LoadResult<PageDetail> {
        let bookmark = self
            .bookmarks
            .get(bookmark)
            .cloned()
            .unwrap_or_else(|| BookmarkDefinition::fallback(bookmark));

        let Some(page_id) = bookmark.target_page_id.clone() else {
            return Ok(PageDetail {
                bookmark,
                page: None,
                visuals: VisualsView::NoPage,
            });
        };

        let page = self.page(&page_id);
        let visuals = self.page_visuals(&page_id, ctx)?;
        Ok(PageDetail {
            bookmark,
            page: Some(page),
            visuals,
        })
    }

    /// Build the visual forest of a page.
    pub fn page_visuals(&self, page: &PageId, ctx: &ResolveContext) -> LoadResult<VisualsView> {
        let Some(layout) = &self.layout else {
            return Ok(VisualsView::Loaded(VisualForest::default()));
        };
        let page_folder = layout.page_folder(page);

        match VisualGraphBuilder::from_context(ctx).build(&page_folder, ctx) {
            Ok(forest) => Ok(VisualsView::Loaded(forest)),
            Err(err) => match err.kind() {
                FailureKind::Interrupted => Err(err),
                FailureKind::NotFound => {
                    tracing::debug!(page = %page, "page has no visuals directory");
                    Ok(VisualsView::Loaded(VisualForest::default()))
                }
                FailureKind::DirectoryUnavailable | FailureKind::ParseFailure => {
                    tracing::warn!(page = %page, error = %err, "visuals unavailable");
                    let mut diagnostics = DiagnosticCollector::new();
                    if err.kind() == FailureKind::DirectoryUnavailable {
                        let path = err.path().unwrap_or(page_folder.as_path());
                        diagnostics.directory_unavailable(path, &err);
                    } else {
                        diagnostics.fallback_applied(&format!("visuals of page '{page}'"), &err);
                    }
                    Ok(VisualsView::Unavailable {
                        reason: err.to_string(),
                        diagnostics,
                    })
                }
            },
        }
    }

    /// The resolved page, or its fallback when it could not be loaded.
    ///
    /// Pages no bookmark targets are resolved on demand.
    pub fn page(&self, id: &PageId) -> Page {
        if let Some(page) = self.pages.get(id) {
            return page.clone();
        }
        if self.unresolved_pages.contains(id) {
            return Page::fallback(id);
        }
        match &self.layout {
            Some(layout) => PageResolver::new(layout.definition_folder()).resolve(id),
            None => Page::fallback(id),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The located bookmark index, if any report folder had one.
    pub fn bookmarks_file(&self) -> Option<&Path> {
        self.layout.as_ref().map(ReportLayout::bookmarks_file)
    }

    pub fn layout(&self) -> Option<&ReportLayout> {
        self.layout.as_ref()
    }

    pub fn entries(&self) -> &[BookmarkIndexEntry] {
        &self.entries
    }

    pub fn bookmark(&self, id: &str) -> Option<&BookmarkDefinition> {
        self.bookmarks.get(id)
    }

    pub fn bookmarks(&self) -> impl Iterator<Item = &BookmarkDefinition> {
        self.bookmarks.values()
    }

    /// Targeted pages that loaded.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// Targeted pages whose definition could not be loaded.
    pub fn unresolved_pages(&self) -> impl Iterator<Item = &PageId> {
        self.unresolved_pages.iter()
    }

    /// Page name → page group, in index order.
    pub fn page_groups(&self) -> &IndexMap<String, PageGroup> {
        &self.page_groups
    }

    /// Fallbacks applied while opening the project.
    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }
}

/// Apply the fallback for a failed load, keeping interrupts as errors.
fn settle<T>(
    result: LoadResult<T>,
    fallback: impl FnOnce() -> T,
    subject: &str,
    diagnostics: &mut DiagnosticCollector,
) -> LoadResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_interrupt() => Err(err),
        Err(err) => {
            if err.kind() == FailureKind::ParseFailure {
                tracing::warn!(subject, error = %err, "malformed definition, using fallback");
            } else {
                tracing::debug!(subject, error = %err, "definition unavailable, using fallback");
            }
            diagnostics.fallback_applied(subject, &err);
            Ok(fallback())
        }
    }
}
