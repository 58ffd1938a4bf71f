//! Outline rows: resolved structures flattened for display.
//!
//! Renderers consume rows in order and indent by `depth`; they never walk
//! the model themselves.

use indexmap::IndexMap;

use super::page_detail::{PageDetail, VisualsView};
use super::page_groups::{PageGroup, UNKNOWN_PAGE};
use crate::hir::Visual;

/// What an outline row stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutlineKind {
    Page,
    Group,
    Bookmark,
    Visual,
    VisualGroup,
    Bucket,
    Field,
    Notice,
}

/// One line of an outline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineRow {
    pub depth: usize,
    pub kind: OutlineKind,
    pub label: String,
    /// Set on visuals the selected bookmark applies to.
    pub highlighted: bool,
}

impl OutlineRow {
    fn new(depth: usize, kind: OutlineKind, label: impl Into<String>) -> Self {
        Self {
            depth,
            kind,
            label: label.into(),
            highlighted: false,
        }
    }
}

/// Page → group → bookmark rows.
pub fn page_group_outline(page_groups: &IndexMap<String, PageGroup>) -> Vec<OutlineRow> {
    let mut rows = Vec::new();
    for (page, group) in page_groups {
        rows.push(OutlineRow::new(0, OutlineKind::Page, page));
        for (name, bookmarks) in &group.groups {
            rows.push(OutlineRow::new(1, OutlineKind::Group, name));
            rows.extend(
                bookmarks
                    .iter()
                    .map(|b| OutlineRow::new(2, OutlineKind::Bookmark, &b.display_name)),
            );
        }
        rows.extend(
            group
                .ungrouped
                .iter()
                .map(|b| OutlineRow::new(1, OutlineKind::Bookmark, &b.display_name)),
        );
    }
    rows
}

/// Page → visual tree → bucket → field rows for a selected bookmark.
pub fn page_detail_outline(detail: &PageDetail) -> Vec<OutlineRow> {
    let mut rows = Vec::new();
    let page_label = detail
        .page
        .as_ref()
        .map_or(UNKNOWN_PAGE, |p| p.display_name.as_str());
    rows.push(OutlineRow::new(0, OutlineKind::Page, page_label));

    let forest = match &detail.visuals {
        VisualsView::Loaded(forest) => forest,
        VisualsView::Unavailable { .. } => {
            rows.push(OutlineRow::new(1, OutlineKind::Notice, "Could not load visuals"));
            return rows;
        }
        VisualsView::NoPage => {
            rows.push(OutlineRow::new(1, OutlineKind::Notice, "Bookmark has no target page"));
            return rows;
        }
    };
    if forest.is_empty() {
        rows.push(OutlineRow::new(1, OutlineKind::Notice, "No visuals"));
        return rows;
    }

    for (depth, visual) in forest.walk() {
        let depth = depth + 1;
        let mut row = OutlineRow::new(depth, visual_kind(visual), &visual.name);
        row.highlighted = detail.is_targeted(&visual.id);
        rows.push(row);
        push_fields(&mut rows, depth + 1, visual);
    }
    rows
}

fn visual_kind(visual: &Visual) -> OutlineKind {
    if visual.is_group {
        OutlineKind::VisualGroup
    } else {
        OutlineKind::Visual
    }
}

fn push_fields(rows: &mut Vec<OutlineRow>, depth: usize, visual: &Visual) {
    let mut current_bucket = None;
    for (bucket, field) in visual.fields.iter() {
        let field_depth = match bucket {
            Some(bucket) => {
                if current_bucket != Some(bucket) {
                    rows.push(OutlineRow::new(depth, OutlineKind::Bucket, bucket));
                    current_bucket = Some(bucket);
                }
                depth + 1
            }
            None => depth,
        };
        let label = format!("{} ({})", field.name, field.field_type.display());
        rows.push(OutlineRow::new(field_depth, OutlineKind::Field, label));
    }
}
