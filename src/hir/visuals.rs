//! Visual graph: the visuals of one page, arranged as a forest.
//!
//! Visual groups are visuals too. Membership is stored as a flat
//! `parentGroupName` pointer on the child rather than by nesting, so the
//! tree is rebuilt in two passes:
//!
//! 1. load every `visuals/<id>/visual.json` into a by-id map
//! 2. attach each visual to its declared parent, or make it a root when the
//!    parent is absent, unknown, or the visual itself
//!
//! A final pass promotes members of parent cycles to roots so the result is
//! always a proper forest.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde_json::Value;

use super::diagnostics::DiagnosticCollector;
use super::fields::{self, VisualFields};
use crate::base::json::{at, non_empty_str_at, str_at};
use crate::base::{LoadError, LoadResult, VisualId};
use crate::project::layout::{VISUAL_FILE, VISUALS_DIR};
use crate::project::{DirEntry, ResolveContext, list_subdirs, read_json};

/// A visual placed on a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visual {
    pub id: VisualId,
    pub name: String,
    /// Resolved parent group. `None` for roots.
    pub parent_id: Option<VisualId>,
    pub visual_type: Option<String>,
    /// Whether this visual is a group container.
    pub is_group: bool,
    pub fields: VisualFields,
}

impl Visual {
    /// Read a visual from its parsed definition.
    ///
    /// The display name is the first of: the group display name, the title
    /// text literal, the payload `name`, the directory name.
    pub fn from_payload(id: VisualId, payload: &Value) -> Self {
        let name = non_empty_str_at(payload, &["visualGroup", "displayName"])
            .or_else(|| title_literal(payload))
            .or_else(|| non_empty_str_at(payload, &["name"]))
            .unwrap_or(id.as_str())
            .to_string();

        Self {
            parent_id: declared_parent(payload),
            name,
            visual_type: str_at(payload, &["visual", "visualType"]).map(str::to_owned),
            is_group: payload.get("visualGroup").is_some_and(Value::is_object),
            fields: fields::extract(payload),
            id,
        }
    }
}

/// `parentGroupName`, when non-empty.
fn declared_parent(payload: &Value) -> Option<VisualId> {
    non_empty_str_at(payload, &["parentGroupName"]).map(VisualId::new)
}

/// The title text literal from the container formatting objects:
/// `visual.visualContainerObjects.title[*].properties.text.expr.Literal.Value`.
fn title_literal(payload: &Value) -> Option<&str> {
    at(payload, &["visual", "visualContainerObjects", "title"])?
        .as_array()?
        .iter()
        .find_map(|title| str_at(title, &["properties", "text", "expr", "Literal", "Value"]))
        .map(unquote)
        .filter(|s| !s.is_empty())
}

/// Strip one pair of matching surrounding quotes.
fn unquote(literal: &str) -> &str {
    for quote in ['\'', '"'] {
        if literal.len() >= 2 && literal.starts_with(quote) && literal.ends_with(quote) {
            return &literal[1..literal.len() - 1];
        }
    }
    literal
}

/// The visuals of a page as a forest.
#[derive(Clone, Debug, Default)]
pub struct VisualForest {
    visuals: IndexMap<VisualId, Visual>,
    payloads: IndexMap<VisualId, Arc<Value>>,
    roots: Vec<VisualId>,
    children: IndexMap<VisualId, Vec<VisualId>>,
    diagnostics: DiagnosticCollector,
}

impl VisualForest {
    /// Assemble a forest from visuals in listing order.
    pub fn assemble(
        loaded: Vec<(Visual, Arc<Value>)>,
        mut diagnostics: DiagnosticCollector,
    ) -> Self {
        let mut visuals = IndexMap::with_capacity(loaded.len());
        let mut payloads = IndexMap::with_capacity(loaded.len());
        for (visual, payload) in loaded {
            payloads.insert(visual.id.clone(), payload);
            visuals.insert(visual.id.clone(), visual);
        }

        let mut roots = Vec::new();
        let mut children: IndexMap<VisualId, Vec<VisualId>> = IndexMap::new();
        let ids: Vec<VisualId> = visuals.keys().cloned().collect();
        for id in &ids {
            let declared = visuals[id].parent_id.clone();
            let parent = match declared {
                Some(parent) if &parent == id => {
                    diagnostics.parent_ignored(id, &parent, "self-referential");
                    None
                }
                Some(parent) if !visuals.contains_key(&parent) => {
                    diagnostics.parent_ignored(id, &parent, "no such visual on this page");
                    None
                }
                other => other,
            };
            match &parent {
                Some(parent) => children.entry(parent.clone()).or_default().push(id.clone()),
                None => roots.push(id.clone()),
            }
            if let Some(visual) = visuals.get_mut(id) {
                visual.parent_id = parent;
            }
        }

        let mut forest = Self {
            visuals,
            payloads,
            roots,
            children,
            diagnostics,
        };
        forest.break_cycles(&ids);
        forest
    }

    /// Promote visuals unreachable from any root (parent cycles) to roots.
    fn break_cycles(&mut self, ids: &[VisualId]) {
        let mut reached = FxHashSet::default();
        for root in self.roots.clone() {
            self.mark_reachable(&root, &mut reached);
        }

        for id in ids {
            if reached.contains(id) {
                continue;
            }
            let parent = self.visuals.get_mut(id).and_then(|v| v.parent_id.take());
            if let Some(parent) = parent {
                if let Some(siblings) = self.children.get_mut(&parent) {
                    siblings.retain(|c| c != id);
                }
                self.diagnostics.parent_ignored(id, &parent, "parent cycle");
            }
            self.roots.push(id.clone());
            self.mark_reachable(id, &mut reached);
        }
    }

    fn mark_reachable(&self, from: &VisualId, reached: &mut FxHashSet<VisualId>) {
        let mut stack = vec![from.clone()];
        while let Some(id) = stack.pop() {
            if !reached.insert(id.clone()) {
                continue;
            }
            if let Some(children) = self.children.get(&id) {
                stack.extend(children.iter().cloned());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Visual> {
        self.visuals.get(id)
    }

    /// The raw definition a visual was read from.
    pub fn payload(&self, id: &str) -> Option<&Arc<Value>> {
        self.payloads.get(id)
    }

    /// All visuals in listing order.
    pub fn visuals(&self) -> impl Iterator<Item = &Visual> {
        self.visuals.values()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Visual> {
        self.roots.iter().filter_map(|id| self.visuals.get(id))
    }

    pub fn children(&self, id: &str) -> impl Iterator<Item = &Visual> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.visuals.get(child))
    }

    pub fn parent(&self, id: &str) -> Option<&Visual> {
        let parent = self.visuals.get(id)?.parent_id.as_ref()?;
        self.visuals.get(parent)
    }

    /// Distance from the visual's root; roots are at depth 0.
    pub fn depth(&self, id: &str) -> Option<usize> {
        let mut visual = self.visuals.get(id)?;
        let mut depth = 0;
        while let Some(parent) = visual.parent_id.as_ref().and_then(|p| self.visuals.get(p)) {
            depth += 1;
            visual = parent;
        }
        Some(depth)
    }

    /// Pre-order traversal with depth.
    pub fn walk(&self) -> Vec<(usize, &Visual)> {
        let mut out = Vec::with_capacity(self.visuals.len());
        let mut stack: Vec<(usize, &Visual)> = self.roots().map(|v| (0, v)).collect();
        stack.reverse();
        while let Some((depth, visual)) = stack.pop() {
            out.push((depth, visual));
            let mut children: Vec<_> = self
                .children(visual.id.as_str())
                .map(|c| (depth + 1, c))
                .collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Fallbacks and skipped visuals recorded while building.
    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }
}

/// Builds the visual forest of a page folder.
#[derive(Clone, Debug, Default)]
pub struct VisualGraphBuilder {
    sorted: bool,
}

impl VisualGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_context(ctx: &ResolveContext) -> Self {
        Self {
            sorted: ctx.options().sort_entries,
        }
    }

    /// Visit visual folders sorted by name instead of in listing order.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Build the forest for `page_folder`.
    ///
    /// A missing `visuals` directory is `NotFound`; an unlistable one is
    /// `DirectoryUnavailable`. Individual visuals that fail to load are
    /// skipped and recorded in the forest diagnostics.
    pub fn build(&self, page_folder: &Path, ctx: &ResolveContext) -> LoadResult<VisualForest> {
        ctx.checkpoint()?;
        let dirs = list_subdirs(&page_folder.join(VISUALS_DIR), self.sorted)?;

        let loaded = ctx.par_map(&dirs, |entry| load_visual(entry, ctx));
        ctx.checkpoint()?;

        let mut diagnostics = DiagnosticCollector::new();
        let mut visuals = Vec::with_capacity(loaded.len());
        for (entry, result) in dirs.iter().zip(loaded) {
            match result {
                Ok(visual) => visuals.push(visual),
                Err(err) if err.is_interrupt() => return Err(err),
                Err(err) => {
                    tracing::warn!(visual = %entry.name, error = %err, "skipping visual");
                    diagnostics.visual_skipped(&entry.name, &err);
                }
            }
        }

        Ok(VisualForest::assemble(visuals, diagnostics))
    }
}

fn load_visual(entry: &DirEntry, ctx: &ResolveContext) -> Result<(Visual, Arc<Value>), LoadError> {
    ctx.checkpoint()?;
    let payload = read_json(&entry.path.join(VISUAL_FILE))?;
    let visual = Visual::from_payload(VisualId::new(&entry.name), &payload);
    Ok((visual, Arc::new(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn visual(id: &str, parent: Option<&str>) -> (Visual, Arc<Value>) {
        let payload = match parent {
            Some(parent) => json!({ "name": id, "parentGroupName": parent }),
            None => json!({ "name": id }),
        };
        (Visual::from_payload(VisualId::new(id), &payload), Arc::new(payload))
    }

    #[rstest]
    #[case::group_name_first(
        json!({ "name": "n", "visualGroup": { "displayName": "Group A" },
                "visual": { "visualContainerObjects": { "title": [{ "properties": { "text": { "expr": { "Literal": { "Value": "'Title'" } } } } }] } } }),
        "Group A"
    )]
    #[case::title_literal(
        json!({ "name": "n", "visual": { "visualContainerObjects": { "title": [{ "properties": { "text": { "expr": { "Literal": { "Value": "'Revenue by Region'" } } } } }] } } }),
        "Revenue by Region"
    )]
    #[case::title_keeps_inner_quotes(
        json!({ "visual": { "visualContainerObjects": { "title": [{ "properties": { "text": { "expr": { "Literal": { "Value": "''Q1''" } } } } }] } } }),
        "'Q1'"
    )]
    #[case::payload_name(json!({ "name": "chart-7" }), "chart-7")]
    #[case::directory_name(json!({}), "dir-id")]
    fn test_display_name_precedence(#[case] payload: Value, #[case] expected: &str) {
        let visual = Visual::from_payload(VisualId::new("dir-id"), &payload);
        assert_eq!(visual.name, expected);
    }

    #[test]
    fn test_visual_metadata() {
        let payload = json!({
            "name": "g1",
            "visualGroup": { "displayName": "Header", "groupMode": "ScaleMode" },
            "parentGroupName": "outer"
        });
        let visual = Visual::from_payload(VisualId::new("g1"), &payload);
        assert!(visual.is_group);
        assert_eq!(visual.parent_id, Some(VisualId::new("outer")));
        assert!(visual.fields.is_empty());
    }

    #[test]
    fn test_dangling_parent_becomes_root() {
        let forest = VisualForest::assemble(
            vec![visual("a", None), visual("b", Some("missing"))],
            DiagnosticCollector::new(),
        );

        let roots: Vec<_> = forest.roots().map(|v| v.id.as_str()).collect();
        assert_eq!(roots, vec!["a", "b"]);
        assert_eq!(forest.get("b").unwrap().parent_id, None);
        assert_eq!(forest.diagnostics().len(), 1);
    }

    #[test]
    fn test_chain_depth() {
        let forest = VisualForest::assemble(
            vec![visual("c", Some("b")), visual("a", None), visual("b", Some("a"))],
            DiagnosticCollector::new(),
        );

        assert_eq!(forest.roots().count(), 1);
        assert_eq!(forest.depth("c"), Some(2));
        assert_eq!(forest.parent("c").map(|v| v.id.as_str()), Some("b"));
        let walk: Vec<_> = forest.walk().into_iter().map(|(d, v)| (d, v.id.as_str())).collect();
        assert_eq!(walk, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn test_self_parent_is_root() {
        let forest =
            VisualForest::assemble(vec![visual("a", Some("a"))], DiagnosticCollector::new());
        assert_eq!(forest.roots().count(), 1);
        assert_eq!(forest.depth("a"), Some(0));
    }

    #[test]
    fn test_cycle_is_broken() {
        let forest = VisualForest::assemble(
            vec![visual("x", Some("y")), visual("y", Some("x")), visual("z", None)],
            DiagnosticCollector::new(),
        );

        assert_eq!(forest.walk().len(), 3);
        let roots: Vec<_> = forest.roots().map(|v| v.id.as_str()).collect();
        assert_eq!(roots, vec!["z", "x"]);
        assert_eq!(forest.children("x").map(|v| v.id.as_str()).collect::<Vec<_>>(), vec!["y"]);
        assert_eq!(forest.depth("y"), Some(1));
    }

    #[test]
    fn test_children_keep_listing_order() {
        let forest = VisualForest::assemble(
            vec![visual("g", None), visual("v2", Some("g")), visual("v1", Some("g"))],
            DiagnosticCollector::new(),
        );
        let children: Vec<_> = forest.children("g").map(|v| v.id.as_str()).collect();
        assert_eq!(children, vec!["v2", "v1"]);
    }
}
