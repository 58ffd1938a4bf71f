//! Field bindings: which model fields a visual is bound to.
//!
//! A visual's query is a tree of heterogeneous JSON nodes. A node is a
//! field reference when it has a `field` wrapper and a `nativeQueryRef` or
//! `queryRef` name:
//!
//! ```json
//! { "field": { "Column": { "Expression": { "SourceRef": { "Entity": "Sales" } },
//!                          "Property": "Amount" } },
//!   "queryRef": "Sales.Amount", "nativeQueryRef": "Sum of Sales", "active": true }
//! ```
//!
//! When the query has a `queryState` object, fields are grouped by bucket
//! (the `queryState` keys). Otherwise the whole payload is walked and the
//! references found anywhere are returned as one flat list.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_json::{Map, Value};

use crate::base::json::{self, Visitor, at, retain_active, str_at};

/// Kind of model object a field reference points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Column,
    Measure,
    Hierarchy,
    HierarchyLevel,
    /// An aggregation over a column, e.g. an implicit "Sum of".
    ImplicitMeasure,
}

impl FieldType {
    pub fn display(&self) -> &'static str {
        match self {
            FieldType::Column => "column",
            FieldType::Measure => "measure",
            FieldType::Hierarchy => "hierarchy",
            FieldType::HierarchyLevel => "hierarchy level",
            FieldType::ImplicitMeasure => "implicit measure",
        }
    }
}

/// A data field bound to a visual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Display name; unique within a bucket.
    pub name: String,
    pub entity: Option<String>,
    pub property: Option<String>,
    pub field_type: FieldType,
    pub level: Option<String>,
}

/// The expression inside a `field` wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldExpr<'a> {
    Column {
        entity: Option<&'a str>,
        property: Option<&'a str>,
    },
    Measure {
        entity: Option<&'a str>,
        property: Option<&'a str>,
    },
    Hierarchy {
        entity: Option<&'a str>,
        hierarchy: Option<&'a str>,
    },
    HierarchyLevel {
        entity: Option<&'a str>,
        hierarchy: Option<&'a str>,
        level: Option<&'a str>,
    },
    /// Aggregation of a column. Only chosen when no other variant names an
    /// entity or property.
    Aggregation {
        entity: Option<&'a str>,
        property: Option<&'a str>,
    },
    Unrecognized,
}

impl<'a> FieldExpr<'a> {
    /// Classify a `field` wrapper.
    pub fn of(wrapper: &'a Value) -> Self {
        let direct = Self::direct(wrapper);
        if direct.names_anything() {
            return direct;
        }
        if let Some(column) = at(wrapper, &["Aggregation", "Expression", "Column"]) {
            return FieldExpr::Aggregation {
                entity: source_entity(column),
                property: str_at(column, &["Property"]),
            };
        }
        direct
    }

    fn direct(wrapper: &'a Value) -> Self {
        if let Some(column) = wrapper.get("Column") {
            return FieldExpr::Column {
                entity: source_entity(column),
                property: str_at(column, &["Property"]),
            };
        }
        if let Some(measure) = wrapper.get("Measure") {
            return FieldExpr::Measure {
                entity: source_entity(measure),
                property: str_at(measure, &["Property"]),
            };
        }
        if let Some(hierarchy) = wrapper.get("Hierarchy") {
            return FieldExpr::Hierarchy {
                entity: source_entity(hierarchy),
                hierarchy: str_at(hierarchy, &["Hierarchy"]),
            };
        }
        if let Some(level) = wrapper.get("HierarchyLevel") {
            return FieldExpr::HierarchyLevel {
                entity: str_at(
                    level,
                    &["Expression", "Hierarchy", "Expression", "SourceRef", "Entity"],
                ),
                hierarchy: str_at(level, &["Expression", "Hierarchy", "Hierarchy"]),
                level: str_at(level, &["Level"]),
            };
        }
        FieldExpr::Unrecognized
    }

    fn names_anything(&self) -> bool {
        match *self {
            FieldExpr::Column { entity, property }
            | FieldExpr::Measure { entity, property }
            | FieldExpr::Aggregation { entity, property } => entity.is_some() || property.is_some(),
            FieldExpr::Hierarchy { entity, hierarchy }
            | FieldExpr::HierarchyLevel { entity, hierarchy, .. } => {
                entity.is_some() || hierarchy.is_some()
            }
            FieldExpr::Unrecognized => false,
        }
    }

    /// Build the field this expression describes, named `name`.
    pub fn into_field(self, name: &str) -> Option<Field> {
        let (field_type, entity, property, level) = match self {
            FieldExpr::Column { entity, property } => (FieldType::Column, entity, property, None),
            FieldExpr::Measure { entity, property } => (FieldType::Measure, entity, property, None),
            FieldExpr::Hierarchy { entity, hierarchy } => {
                (FieldType::Hierarchy, entity, hierarchy, None)
            }
            FieldExpr::HierarchyLevel { entity, hierarchy, level } => {
                (FieldType::HierarchyLevel, entity, hierarchy, level)
            }
            FieldExpr::Aggregation { entity, property } => {
                (FieldType::ImplicitMeasure, entity, property, None)
            }
            FieldExpr::Unrecognized => return None,
        };
        Some(Field {
            name: name.to_string(),
            entity: entity.map(str::to_owned),
            property: property.map(str::to_owned),
            field_type,
            level: level.map(str::to_owned),
        })
    }
}

fn source_entity(expr: &Value) -> Option<&str> {
    str_at(expr, &["Expression", "SourceRef", "Entity"])
}

/// Read a node as a field reference.
pub fn field_ref(node: &Map<String, Value>) -> Option<Field> {
    let wrapper = node.get("field").filter(|f| f.is_object())?;
    let name = ["nativeQueryRef", "queryRef"]
        .iter()
        .find_map(|key| node.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))?;

    let field = FieldExpr::of(wrapper).into_field(name);
    if field.is_none() {
        tracing::trace!(name, "field reference with unrecognized expression");
    }
    field
}

/// Field list de-duplicated by name, first occurrence wins.
#[derive(Debug, Default)]
struct FieldSet(IndexMap<String, Field>);

impl FieldSet {
    fn insert(&mut self, field: Field) {
        if let Entry::Vacant(slot) = self.0.entry(field.name.clone()) {
            slot.insert(field);
        }
    }

    /// Fields ordered by name.
    fn into_sorted(self) -> Vec<Field> {
        let mut fields: Vec<Field> = self.0.into_values().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        fields
    }
}

/// Fields bound to one visual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisualFields {
    /// Grouped by query bucket, buckets in query order.
    Bucketed(IndexMap<String, Vec<Field>>),
    /// No bucket structure; every reference found in the payload.
    Flat(Vec<Field>),
}

impl Default for VisualFields {
    fn default() -> Self {
        VisualFields::Flat(Vec::new())
    }
}

impl VisualFields {
    /// Total number of fields across buckets.
    pub fn len(&self) -> usize {
        match self {
            VisualFields::Bucketed(buckets) => buckets.values().map(Vec::len).sum(),
            VisualFields::Flat(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fields of one bucket. Flat fields belong to no bucket.
    pub fn bucket(&self, name: &str) -> Option<&[Field]> {
        match self {
            VisualFields::Bucketed(buckets) => buckets.get(name).map(Vec::as_slice),
            VisualFields::Flat(_) => None,
        }
    }

    /// Every field with its bucket name.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Field)> + '_> {
        match self {
            VisualFields::Bucketed(buckets) => Box::new(buckets.iter().flat_map(|(bucket, fields)| {
                fields.iter().map(move |f| (Some(bucket.as_str()), f))
            })),
            VisualFields::Flat(fields) => Box::new(fields.iter().map(|f| (None, f))),
        }
    }
}

/// Extract fields by bucket, falling back to a flat walk.
pub fn extract(payload: &Value) -> VisualFields {
    match extract_by_bucket(payload) {
        Some(buckets) => VisualFields::Bucketed(buckets),
        None => VisualFields::Flat(extract_flat(payload)),
    }
}

/// Extract fields grouped by `queryState` bucket.
///
/// Returns `None` when the payload has no `queryState` with at least one
/// `projections` array. Buckets without any field are omitted.
pub fn extract_by_bucket(payload: &Value) -> Option<IndexMap<String, Vec<Field>>> {
    let query_state = find_query_state(payload)?;

    let mut recognized = false;
    let mut buckets = IndexMap::new();
    for (bucket, state) in query_state {
        let Some(projections) = state.get("projections").and_then(Value::as_array) else {
            continue;
        };
        recognized = true;

        let mut fields = FieldSet::default();
        for projection in retain_active(projections) {
            if let Some(field) = projection.as_object().and_then(field_ref) {
                fields.insert(field);
            }
        }
        let fields = fields.into_sorted();
        if !fields.is_empty() {
            buckets.insert(bucket.clone(), fields);
        }
    }

    recognized.then_some(buckets)
}

/// Extract every field reference anywhere in the payload.
pub fn extract_flat(payload: &Value) -> Vec<Field> {
    struct Collector(FieldSet);

    impl<'a> Visitor<'a> for Collector {
        fn visit_object(&mut self, object: &'a Map<String, Value>) {
            if let Some(field) = field_ref(object) {
                self.0.insert(field);
            }
        }

        fn select_elements(&mut self, elements: &'a [Value]) -> Vec<&'a Value> {
            retain_active(elements)
        }
    }

    let mut collector = Collector(FieldSet::default());
    json::walk(payload, &mut collector);
    collector.0.into_sorted()
}

/// `visual.query.queryState`, or the first `queryState` object anywhere.
fn find_query_state(payload: &Value) -> Option<&Map<String, Value>> {
    struct Finder<'a>(Option<&'a Map<String, Value>>);

    impl<'a> Visitor<'a> for Finder<'a> {
        fn visit_object(&mut self, object: &'a Map<String, Value>) {
            if self.0.is_none() {
                self.0 = object.get("queryState").and_then(Value::as_object);
            }
        }
    }

    if let Some(state) =
        at(payload, &["visual", "query", "queryState"]).and_then(Value::as_object)
    {
        return Some(state);
    }
    let mut finder = Finder(None);
    json::walk(payload, &mut finder);
    finder.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn column(entity: &str, property: &str, query_ref: &str) -> Value {
        json!({
            "field": { "Column": {
                "Expression": { "SourceRef": { "Entity": entity } },
                "Property": property
            } },
            "queryRef": query_ref
        })
    }

    fn visual_with(query_state: Value) -> Value {
        json!({ "visual": { "visualType": "barChart", "query": { "queryState": query_state } } })
    }

    #[test]
    fn test_native_query_ref_wins() {
        let mut node = column("Sales", "Amount", "Sales.Amount");
        node["nativeQueryRef"] = json!("Sum of Sales");

        let fields = extract_flat(&json!([node]));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "Sum of Sales");
        assert_eq!(fields[0].entity.as_deref(), Some("Sales"));
        assert_eq!(fields[0].property.as_deref(), Some("Amount"));
        assert_eq!(fields[0].field_type, FieldType::Column);
    }

    #[test]
    fn test_node_without_name_is_skipped() {
        let mut node = column("Sales", "Amount", "x");
        node.as_object_mut().unwrap().remove("queryRef");
        assert!(extract_flat(&node).is_empty());
    }

    #[rstest]
    #[case::measure(
        json!({ "Measure": { "Expression": { "SourceRef": { "Entity": "Sales" } }, "Property": "Total" } }),
        FieldType::Measure, Some("Sales"), Some("Total"), None
    )]
    #[case::hierarchy(
        json!({ "Hierarchy": { "Expression": { "SourceRef": { "Entity": "Date" } }, "Hierarchy": "Calendar" } }),
        FieldType::Hierarchy, Some("Date"), Some("Calendar"), None
    )]
    #[case::hierarchy_level(
        json!({ "HierarchyLevel": {
            "Expression": { "Hierarchy": { "Expression": { "SourceRef": { "Entity": "Date" } }, "Hierarchy": "Calendar" } },
            "Level": "Year"
        } }),
        FieldType::HierarchyLevel, Some("Date"), Some("Calendar"), Some("Year")
    )]
    #[case::aggregation(
        json!({ "Aggregation": { "Expression": { "Column": {
            "Expression": { "SourceRef": { "Entity": "Sales" } }, "Property": "Qty"
        } }, "Function": 0 } }),
        FieldType::ImplicitMeasure, Some("Sales"), Some("Qty"), None
    )]
    fn test_field_variants(
        #[case] wrapper: Value,
        #[case] field_type: FieldType,
        #[case] entity: Option<&str>,
        #[case] property: Option<&str>,
        #[case] level: Option<&str>,
    ) {
        let node = json!({ "field": wrapper, "queryRef": "ref" });
        let field = field_ref(node.as_object().unwrap()).unwrap();
        assert_eq!(field.field_type, field_type);
        assert_eq!(field.entity.as_deref(), entity);
        assert_eq!(field.property.as_deref(), property);
        assert_eq!(field.level.as_deref(), level);
    }

    #[test]
    fn test_unrecognized_wrapper_skipped() {
        let node = json!({ "field": { "Literal": { "Value": "1L" } }, "queryRef": "one" });
        assert!(field_ref(node.as_object().unwrap()).is_none());
    }

    #[test]
    fn test_inactive_ignored_without_explicit_active() {
        let mut first = column("T", "A", "A");
        first["active"] = json!(false);
        let payload = visual_with(json!({
            "Values": { "projections": [first, column("T", "B", "B"), column("T", "C", "C")] }
        }));

        let fields = extract(&payload);
        assert_eq!(fields.bucket("Values").map(<[Field]>::len), Some(3));
    }

    #[test]
    fn test_explicit_active_filters_inactive() {
        let mut on = column("T", "On", "On");
        on["active"] = json!(true);
        let mut off = column("T", "Off", "Off");
        off["active"] = json!(false);
        let payload = visual_with(json!({ "Category": { "projections": [on, off] } }));

        let fields = extract(&payload);
        let names: Vec<_> = fields.iter().map(|(_, f)| f.name.as_str()).collect();
        assert_eq!(names, vec!["On"]);
    }

    #[test]
    fn test_flat_walk_filters_per_array() {
        let mut on = column("T", "On", "On");
        on["active"] = json!(true);
        let mut off = column("T", "Off", "Off");
        off["active"] = json!(false);
        let mut other = column("T", "Other", "Other");
        other["active"] = json!(false);
        let payload = json!({ "a": [on, off], "b": [other] });

        let names: Vec<_> = extract_flat(&payload).into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["On", "Other"]);
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let payload = visual_with(json!({
            "Values": { "projections": [column("First", "X", "Dup"), column("Second", "Y", "Dup")] }
        }));

        let fields = extract(&payload);
        let values = fields.bucket("Values").unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].entity.as_deref(), Some("First"));
    }

    #[test]
    fn test_buckets_sorted_by_name() {
        let payload = visual_with(json!({
            "Y": { "projections": [column("T", "b", "beta"), column("T", "a", "Alpha"), column("T", "c", "alpha")] },
            "Category": { "projections": [column("T", "d", "Region")] }
        }));

        let VisualFields::Bucketed(buckets) = extract(&payload) else {
            panic!("expected bucketed fields");
        };
        assert_eq!(buckets.keys().collect::<Vec<_>>(), vec!["Y", "Category"]);
        let names: Vec<_> = buckets["Y"].iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta"]);
    }

    #[test]
    fn test_no_query_state_is_flat() {
        let payload = json!({ "visual": { "objects": { "x": [column("T", "A", "A")] } } });
        assert!(extract_by_bucket(&payload).is_none());
        assert!(matches!(extract(&payload), VisualFields::Flat(ref f) if f.len() == 1));
    }
}
