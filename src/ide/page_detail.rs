//! Page detail: the visuals of the page a bookmark targets.

use crate::base::VisualId;
use crate::hir::{BookmarkDefinition, DiagnosticCollector, Page, VisualForest};

/// What is known about a page's visuals.
#[derive(Clone, Debug)]
pub enum VisualsView {
    /// The visuals directory was read. The forest may be empty.
    Loaded(VisualForest),
    /// The visuals directory exists but could not be listed.
    Unavailable {
        reason: String,
        diagnostics: DiagnosticCollector,
    },
    /// The bookmark targets no page.
    NoPage,
}

impl VisualsView {
    pub fn forest(&self) -> Option<&VisualForest> {
        match self {
            VisualsView::Loaded(forest) => Some(forest),
            VisualsView::Unavailable { .. } | VisualsView::NoPage => None,
        }
    }

    /// Fallbacks applied while building this view.
    pub fn diagnostics(&self) -> Option<&DiagnosticCollector> {
        match self {
            VisualsView::Loaded(forest) => Some(forest.diagnostics()),
            VisualsView::Unavailable { diagnostics, .. } => Some(diagnostics),
            VisualsView::NoPage => None,
        }
    }
}

/// Detail view produced when a bookmark is selected.
#[derive(Clone, Debug)]
pub struct PageDetail {
    pub bookmark: BookmarkDefinition,
    pub page: Option<Page>,
    pub visuals: VisualsView,
}

impl PageDetail {
    /// Whether the selected bookmark applies to this visual.
    pub fn is_targeted(&self, visual: &VisualId) -> bool {
        self.bookmark.options.targets(visual)
    }
}
