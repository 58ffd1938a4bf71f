//! Schema-tolerant views over parsed JSON.
//!
//! Report definition files come in several optional shapes. Instead of
//! sniffing shapes ad hoc, consumers classify a value once with [`Node::of`]
//! and drive traversal through a [`Visitor`].

use serde_json::{Map, Value};

/// The three node shapes traversal distinguishes.
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    Scalar(&'a Value),
}

impl<'a> Node<'a> {
    /// Classify a value.
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Node::Object(map),
            Value::Array(items) => Node::Array(items),
            other => Node::Scalar(other),
        }
    }
}

/// Callbacks for [`walk`]. All methods have no-op defaults.
pub trait Visitor<'a> {
    /// Called for every object, before its values are walked.
    fn visit_object(&mut self, _object: &'a Map<String, Value>) {}

    /// Choose which elements of an array are walked.
    fn select_elements(&mut self, elements: &'a [Value]) -> Vec<&'a Value> {
        elements.iter().collect()
    }
}

/// Walk a value pre-order, recursing into every object value and the
/// selected elements of every array.
pub fn walk<'a, V: Visitor<'a>>(value: &'a Value, visitor: &mut V) {
    match Node::of(value) {
        Node::Object(object) => {
            visitor.visit_object(object);
            for child in object.values() {
                walk(child, visitor);
            }
        }
        Node::Array(elements) => {
            for child in visitor.select_elements(elements) {
                walk(child, visitor);
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Follow a path of object keys.
pub fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Follow a path of object keys and read a string.
pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    at(value, path)?.as_str()
}

/// Follow a path of object keys and read a non-empty string.
pub fn non_empty_str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    str_at(value, path).filter(|s| !s.is_empty())
}

/// Follow a path of object keys and read a boolean, `false` when absent.
pub fn flag_at(value: &Value, path: &[&str]) -> bool {
    at(value, path).and_then(Value::as_bool).unwrap_or(false)
}

/// Tri-state `active` marker carried by query projections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveFlag {
    Active,
    Inactive,
    Unset,
}

impl ActiveFlag {
    /// Read the `active` key of an element. Non-boolean values count as unset.
    pub fn of(element: &Value) -> Self {
        match element.get("active").and_then(Value::as_bool) {
            Some(true) => ActiveFlag::Active,
            Some(false) => ActiveFlag::Inactive,
            None => ActiveFlag::Unset,
        }
    }
}

/// Drop explicitly inactive elements, but only when at least one element is
/// explicitly active. Arrays without any `active: true` pass through whole.
pub fn retain_active(elements: &[Value]) -> Vec<&Value> {
    let any_active = elements.iter().any(|e| ActiveFlag::of(e) == ActiveFlag::Active);
    elements
        .iter()
        .filter(|e| !any_active || ActiveFlag::of(e) != ActiveFlag::Inactive)
        .collect()
}
