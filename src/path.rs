//! Attribute paths.
//!
//! An [`AttributePath`] is an ordered list of [`PathStep`]s that addresses one
//! location inside a resource value and, in parallel, inside its schema. Paths
//! are totally ordered so requires-replace lists can be sorted and deduplicated
//! deterministically: a parent always sorts before its descendants, and steps of
//! different kinds sort attribute name < element index < element key < element
//! value.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::value::Value;

/// A single step in an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Selects an attribute of an object by name.
    AttributeName(String),
    /// Selects a list or tuple element by position.
    ElementIndex(usize),
    /// Selects a map element by key.
    ElementKey(String),
    /// Selects a set element by its full value.
    ElementValue(Value),
}

/// An ordered sequence of steps addressing a location in a value tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributePath {
    steps: Vec<PathStep>,
}

impl PathStep {
    /// Rank of the step kind, used as the primary sort key.
    const fn kind_rank(&self) -> u8 {
        match self {
            Self::AttributeName(_) => 0,
            Self::ElementIndex(_) => 1,
            Self::ElementKey(_) => 2,
            Self::ElementValue(_) => 3,
        }
    }

    /// Returns true if the step selects an element rather than an attribute.
    #[must_use]
    pub const fn is_element(&self) -> bool {
        !matches!(self, Self::AttributeName(_))
    }
}

impl Ord for PathStep {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind_rank()
            .cmp(&other.kind_rank())
            .then_with(|| match (self, other) {
                (Self::AttributeName(a), Self::AttributeName(b))
                | (Self::ElementKey(a), Self::ElementKey(b)) => a.cmp(b),
                (Self::ElementIndex(a), Self::ElementIndex(b)) => a.cmp(b),
                // Canonical rendering is order-independent for sets, so equal
                // values always compare equal here.
                (Self::ElementValue(a), Self::ElementValue(b)) => {
                    a.to_string().cmp(&b.to_string())
                }
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for PathStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AttributePath {
    /// Returns the empty path, which addresses the resource itself.
    #[must_use]
    pub const fn root() -> Self {
        Self { steps: Vec::new() }
    }

    /// Returns a copy of this path extended by `step`.
    #[must_use]
    pub fn with_step(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Returns a copy of this path extended by an attribute name.
    #[must_use]
    pub fn at_name(&self, name: impl Into<String>) -> Self {
        self.with_step(PathStep::AttributeName(name.into()))
    }

    /// Returns a copy of this path extended by a list or tuple index.
    #[must_use]
    pub fn at_list_index(&self, index: usize) -> Self {
        self.with_step(PathStep::ElementIndex(index))
    }

    /// Returns a copy of this path extended by a map key.
    #[must_use]
    pub fn at_map_key(&self, key: impl Into<String>) -> Self {
        self.with_step(PathStep::ElementKey(key.into()))
    }

    /// Returns a copy of this path extended by a set element value.
    #[must_use]
    pub fn at_set_value(&self, value: Value) -> Self {
        self.with_step(PathStep::ElementValue(value))
    }

    /// Returns the steps of the path.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns the last step, if any.
    #[must_use]
    pub fn last_step(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Returns the parent path, or `None` for the root path.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.steps.split_last()?;
        Some(Self {
            steps: init.to_vec(),
        })
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns true if `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.steps.len() < other.steps.len() && other.steps.starts_with(&self.steps)
    }
}

impl From<Vec<PathStep>> for AttributePath {
    fn from(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }
}

impl FromIterator<PathStep> for AttributePath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeName(name) => write!(f, "{name}"),
            Self::ElementIndex(index) => write!(f, "[{index}]"),
            Self::ElementKey(key) => write!(f, "[{key:?}]"),
            Self::ElementValue(value) => write!(f, "[Value({value})]"),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "(root)");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 && !step.is_element() {
                write!(f, ".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl Serialize for AttributePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sorts and deduplicates a requires-replace path list.
///
/// The result is deterministic for any input order: parents precede their
/// descendants and each path appears once.
#[must_use]
pub fn normalize_requires_replace(mut paths: Vec<AttributePath>) -> Vec<AttributePath> {
    if paths.len() < 2 {
        return paths;
    }

    paths.sort();

    let before = paths.len();
    paths.dedup_by(|current, previous| {
        let duplicate = current == previous;
        if duplicate {
            debug!(
                attribute_path = %current,
                "attribute found multiple times in RequiresReplace, removing duplicate"
            );
        }
        duplicate
    });

    if paths.len() != before {
        debug!("Removed {} duplicate requires-replace paths", before - paths.len());
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = AttributePath::root()
            .at_name("rules")
            .at_list_index(0)
            .at_name("tags")
            .at_map_key("env");
        assert_eq!(path.to_string(), "rules[0].tags[\"env\"]");
        assert_eq!(AttributePath::root().to_string(), "(root)");
    }

    #[test]
    fn test_parent() {
        let path = AttributePath::root().at_name("a").at_list_index(3);
        assert_eq!(path.parent(), Some(AttributePath::root().at_name("a")));
        assert_eq!(AttributePath::root().parent(), None);
    }

    #[test]
    fn test_parent_sorts_before_descendant() {
        let parent = AttributePath::root().at_name("b");
        let child = parent.at_name("a");
        let sibling = AttributePath::root().at_name("c");

        assert!(parent < child);
        assert!(child < sibling);
        assert!(parent.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&parent));
    }

    #[test]
    fn test_step_kind_ordering() {
        let name = PathStep::AttributeName(String::from("zzz"));
        let index = PathStep::ElementIndex(0);
        let key = PathStep::ElementKey(String::from("aaa"));
        let value = PathStep::ElementValue(Value::string("aaa"));

        assert!(name < index);
        assert!(index < key);
        assert!(key < value);
    }

    #[test]
    fn test_normalize_dedups_and_orders() {
        let name1 = AttributePath::root().at_name("name1");
        let elem = AttributePath::root().at_name("list").at_list_index(1234);

        let normalized = normalize_requires_replace(vec![
            elem.clone(),
            name1.clone(),
            name1.clone(),
            elem.clone(),
        ]);

        assert_eq!(normalized, vec![elem, name1]);
    }

    #[test]
    fn test_normalize_parent_first() {
        let parent = AttributePath::root().at_name("block");
        let child = parent.at_list_index(0).at_name("id");

        let normalized = normalize_requires_replace(vec![child.clone(), parent.clone()]);
        assert_eq!(normalized, vec![parent, child]);
    }

    #[test]
    fn test_set_value_steps_ignore_element_order() {
        let a = PathStep::ElementValue(Value::set([Value::int(1), Value::int(2)]));
        let b = PathStep::ElementValue(Value::set([Value::int(2), Value::int(1)]));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }
}
