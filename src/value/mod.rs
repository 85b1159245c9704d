//! Schema-typed value trees.
//!
//! A [`Value`] is a closed sum over every shape a resource attribute can take.
//! Null and Unknown are statuses valid at any shape; every other variant is a
//! known value carrying its shape. The [`Type`] of a value lives in the schema,
//! never in the value itself.

mod codec;
mod types;

pub use codec::{decode, decode_str, encode};
pub use types::Type;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::PathError;
use crate::path::{AttributePath, PathStep};

static NULL: Value = Value::Null;
static UNKNOWN: Value = Value::Unknown;

/// A node of a resource value tree.
#[derive(Debug, Clone)]
pub enum Value {
    /// No value.
    Null,
    /// A value that will only be known after apply.
    Unknown,
    /// A known boolean.
    Bool(bool),
    /// A known number.
    Number(serde_json::Number),
    /// A known string.
    String(String),
    /// An ordered, homogeneous sequence.
    List(Vec<Self>),
    /// An unordered collection of unique elements.
    Set(Vec<Self>),
    /// An ordered, heterogeneous sequence of fixed arity.
    Tuple(Vec<Self>),
    /// String-keyed, homogeneous elements.
    Map(BTreeMap<String, Self>),
    /// Named attributes fixed by the schema.
    Object(BTreeMap<String, Self>),
}

impl Value {
    /// Creates a boolean value.
    #[must_use]
    pub const fn bool(value: bool) -> Self {
        Self::Bool(value)
    }

    /// Creates an integer number value.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Number(value.into())
    }

    /// Creates a string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Creates a list value.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Creates a tuple value.
    #[must_use]
    pub fn tuple(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Creates a set value, dropping duplicate elements.
    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Self>) -> Self {
        let mut elements = Vec::new();
        for item in items {
            push_unique(&mut elements, item);
        }
        Self::Set(elements)
    }

    /// Creates a map value.
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Creates an object value.
    #[must_use]
    pub fn object<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Object(attributes.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns true if the value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if the value is unknown.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true if the value is neither null nor unknown. Children may
    /// still be unknown.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    /// Returns true if no node anywhere in the tree is unknown.
    #[must_use]
    pub fn is_fully_known(&self) -> bool {
        match self {
            Self::Unknown => false,
            Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_) => true,
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => {
                items.iter().all(Self::is_fully_known)
            }
            Self::Map(entries) | Self::Object(entries) => {
                entries.values().all(Self::is_fully_known)
            }
        }
    }

    /// Returns the shape name used in error messages.
    #[must_use]
    pub const fn shape_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unknown => "unknown",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Returns the number as `f64`, if the value is a known number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the element count of a known collection.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => Some(items.len()),
            Self::Map(entries) | Self::Object(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Applies one step to a known container.
    ///
    /// Returns `Ok(None)` when the container holds no element for the step,
    /// and an error when the step kind does not fit the container.
    pub fn child(&self, step: &PathStep) -> Result<Option<&Self>, &'static str> {
        match (self, step) {
            (Self::Object(attributes), PathStep::AttributeName(name)) => Ok(attributes.get(name)),
            (Self::List(items) | Self::Tuple(items), PathStep::ElementIndex(index)) => {
                Ok(items.get(*index))
            }
            (Self::Map(entries), PathStep::ElementKey(key)) => Ok(entries.get(key)),
            (Self::Set(items), PathStep::ElementValue(wanted)) => {
                Ok(items.iter().find(|item| *item == wanted))
            }
            (other, _) => Err(other.shape_name()),
        }
    }

    /// Returns the child for `step`, treating absence as null.
    ///
    /// An unknown container yields unknown children; a null container, a
    /// missing element, or a mismatched step yields null.
    #[must_use]
    pub fn child_or_missing(&self, step: &PathStep) -> &Self {
        if self.is_unknown() {
            return &UNKNOWN;
        }
        match self.child(step) {
            Ok(Some(child)) => child,
            _ => &NULL,
        }
    }

    /// Walks the tree along `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::ThroughNull`] or [`PathError::ThroughUnknown`]
    /// when an ancestor has no children to walk into, and
    /// [`PathError::NoSuchElement`] or [`PathError::StepMismatch`] when a step
    /// does not match the tree.
    pub fn walk(&self, path: &AttributePath) -> Result<&Self, PathError> {
        let mut current = self;
        let mut walked = AttributePath::root();

        for step in path.steps() {
            match current {
                Self::Null => return Err(PathError::ThroughNull { path: walked }),
                Self::Unknown => return Err(PathError::ThroughUnknown { path: walked }),
                _ => {}
            }

            current = match current.child(step) {
                Ok(Some(child)) => child,
                Ok(None) => {
                    return Err(PathError::NoSuchElement {
                        step: step.to_string(),
                        path: walked,
                    });
                }
                Err(shape) => {
                    return Err(PathError::StepMismatch {
                        step: step.to_string(),
                        shape,
                        path: walked,
                    });
                }
            };
            walked = walked.with_step(step.clone());
        }

        Ok(current)
    }

    /// Removes duplicate elements from a set value. Other shapes are left
    /// untouched. Returns the number of removed elements.
    pub fn dedup_set(&mut self) -> usize {
        let Self::Set(items) = self else {
            return 0;
        };
        let before = items.len();
        let mut unique = Vec::with_capacity(before);
        for item in items.drain(..) {
            push_unique(&mut unique, item);
        }
        *items = unique;
        before - items.len()
    }
}

/// Pushes `item` unless an equal element is already present.
pub(crate) fn push_unique(items: &mut Vec<Value>, item: Value) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Renders a number so that equal numbers render identically. An integral
/// float prints as the integer it holds, so `1.0` and `1` compare equal.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn canonical_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e38 => (f as i128).to_string(),
        _ => n.to_string(),
    }
}

fn same_elements(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Unknown, Self::Unknown) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => canonical_number(a) == canonical_number(b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => same_elements(a, b),
            (Self::Map(a), Self::Map(b)) | (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_entries(f: &mut fmt::Formatter<'_>, entries: &BTreeMap<String, Value>) -> fmt::Result {
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{key:?}: {value}")?;
    }
    Ok(())
}

/// Canonical rendering: two values render identically exactly when they are
/// equal, so set elements are printed in sorted order.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Unknown => write!(f, "unknown"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", canonical_number(n)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                write_joined(f, items.iter())?;
                write!(f, "]")
            }
            Self::Tuple(items) => {
                write!(f, "tuple[")?;
                write_joined(f, items.iter())?;
                write!(f, "]")
            }
            Self::Set(items) => {
                let mut rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                rendered.sort();
                write!(f, "set[{}]", rendered.join(", "))
            }
            Self::Map(entries) => {
                write!(f, "map{{")?;
                write_entries(f, entries)?;
                write!(f, "}}")
            }
            Self::Object(entries) => {
                write!(f, "{{")?;
                write_entries(f, entries)?;
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::object([
            ("name", Value::string("web")),
            ("ports", Value::list([Value::int(80), Value::int(443)])),
            ("tags", Value::map([("env", Value::string("prod"))])),
            ("nothing", Value::Null),
            ("later", Value::Unknown),
        ])
    }

    #[test]
    fn test_status_predicates() {
        assert!(Value::Null.is_null());
        assert!(Value::Unknown.is_unknown());
        assert!(!Value::Unknown.is_known());
        assert!(Value::string("x").is_known());

        let partially = Value::list([Value::int(1), Value::Unknown]);
        assert!(partially.is_known());
        assert!(!partially.is_fully_known());
    }

    #[test]
    fn test_unknown_equals_only_unknown() {
        assert_eq!(Value::Unknown, Value::Unknown);
        assert_ne!(Value::Unknown, Value::Null);
        assert_ne!(Value::Unknown, Value::string("unknown"));
        assert_ne!(Value::Null, Value::string("null"));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Value::set([Value::string("a"), Value::string("b")]);
        let b = Value::set([Value::string("b"), Value::string("a")]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());

        let lists_differ = Value::list([Value::int(1), Value::int(2)]);
        assert_ne!(lists_differ, Value::list([Value::int(2), Value::int(1)]));
    }

    #[test]
    fn test_set_constructor_dedups() {
        let set = Value::set([Value::int(1), Value::int(1), Value::int(2)]);
        assert_eq!(set.len(), Some(2));
    }

    #[test]
    fn test_walk() {
        let value = sample();
        let path = AttributePath::root().at_name("ports").at_list_index(1);
        assert_eq!(value.walk(&path), Ok(&Value::int(443)));

        let key = AttributePath::root().at_name("tags").at_map_key("env");
        assert_eq!(value.walk(&key), Ok(&Value::string("prod")));
    }

    #[test]
    fn test_walk_through_null_and_unknown() {
        let value = sample();

        let through_null = AttributePath::root().at_name("nothing").at_name("x");
        assert_eq!(
            value.walk(&through_null),
            Err(PathError::ThroughNull {
                path: AttributePath::root().at_name("nothing"),
            })
        );

        let through_unknown = AttributePath::root().at_name("later").at_list_index(0);
        assert!(matches!(
            value.walk(&through_unknown),
            Err(PathError::ThroughUnknown { .. })
        ));
    }

    #[test]
    fn test_walk_errors() {
        let value = sample();

        let missing = AttributePath::root().at_name("ports").at_list_index(9);
        assert!(matches!(value.walk(&missing), Err(PathError::NoSuchElement { .. })));

        let mismatch = AttributePath::root().at_name("name").at_list_index(0);
        assert!(matches!(
            value.walk(&mismatch),
            Err(PathError::StepMismatch { shape: "string", .. })
        ));
    }

    #[test]
    fn test_child_or_missing() {
        let step = PathStep::AttributeName(String::from("a"));
        assert!(Value::Null.child_or_missing(&step).is_null());
        assert!(Value::Unknown.child_or_missing(&step).is_unknown());
        assert!(Value::object([("b", Value::int(1))]).child_or_missing(&step).is_null());
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Value::string("a").to_string(), "\"a\"");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::object([("a", Value::int(1))]).to_string(),
            "{\"a\": 1}"
        );
        assert_ne!(
            Value::map([("a", Value::int(1))]).to_string(),
            Value::object([("a", Value::int(1))]).to_string()
        );
    }

    #[test]
    fn test_dedup_set() {
        let mut set = Value::Set(vec![Value::int(1), Value::int(1), Value::int(3)]);
        assert_eq!(set.dedup_set(), 1);
        assert_eq!(set, Value::set([Value::int(3), Value::int(1)]));

        let mut list = Value::list([Value::int(1), Value::int(1)]);
        assert_eq!(list.dedup_set(), 0);
    }

    fn float(f: f64) -> Value {
        Value::Number(serde_json::Number::from_f64(f).unwrap())
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(Value::int(1), float(1.0));
        assert_eq!(float(-0.0), Value::int(0));
        assert_eq!(Value::Number(serde_json::Number::from(7_u64)), Value::int(7));
        assert_ne!(Value::int(1), float(1.5));
        assert_eq!(float(2.5), float(2.5));

        assert_eq!(float(1.0).to_string(), Value::int(1).to_string());
        assert_eq!(float(1.5).to_string(), "1.5");
        assert_eq!(
            Value::object([("size", float(10.0))]),
            Value::object([("size", Value::int(10))])
        );
    }

    #[test]
    fn test_dedup_set_merges_equal_numbers() {
        let mut set = Value::Set(vec![Value::int(1), float(1.0), float(2.5)]);
        assert_eq!(set.dedup_set(), 1);
        assert_eq!(set, Value::set([Value::int(1), float(2.5)]));
        assert_eq!(set.to_string(), "set[1, 2.5]");
    }

    #[test]
    fn test_set_value_step_finds_equal_number() {
        let set = Value::set([Value::int(80), Value::int(443)]);
        let step = PathStep::ElementValue(float(80.0));
        assert_eq!(set.child(&step), Ok(Some(&Value::int(80))));
    }
}
