//! Value types.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{SchemaError, ValueError};
use crate::path::{AttributePath, PathStep};

use super::Value;

/// The declared type of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Boolean scalar.
    Bool,
    /// Number scalar.
    Number,
    /// String scalar.
    String,
    /// List with the given element type.
    List(Box<Self>),
    /// Set with the given element type.
    Set(Box<Self>),
    /// Map with the given element type.
    Map(Box<Self>),
    /// Object with the given attribute types.
    Object(BTreeMap<String, Self>),
    /// Tuple with the given element types.
    Tuple(Vec<Self>),
}

impl Type {
    /// Creates a list type.
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Creates a set type.
    #[must_use]
    pub fn set(element: Self) -> Self {
        Self::Set(Box::new(element))
    }

    /// Creates a map type.
    #[must_use]
    pub fn map(element: Self) -> Self {
        Self::Map(Box::new(element))
    }

    /// Creates an object type.
    #[must_use]
    pub fn object<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Object(attributes.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// Returns the type name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Returns the type one step below this one, if the step applies.
    #[must_use]
    pub fn at_step(&self, step: &PathStep) -> Option<&Self> {
        match (self, step) {
            (Self::Object(attributes), PathStep::AttributeName(name)) => attributes.get(name),
            (Self::List(element), PathStep::ElementIndex(_))
            | (Self::Set(element), PathStep::ElementValue(_))
            | (Self::Map(element), PathStep::ElementKey(_)) => Some(element),
            (Self::Tuple(elements), PathStep::ElementIndex(index)) => elements.get(*index),
            _ => None,
        }
    }

    /// Returns the type at `path` below this one.
    ///
    /// # Errors
    ///
    /// Returns an error if a step names an undeclared attribute or cannot be
    /// applied to the type at that position.
    pub fn at_path(&self, path: &AttributePath) -> Result<&Self, SchemaError> {
        let mut current = self;
        let mut walked = AttributePath::root();

        for step in path.steps() {
            current = match current.at_step(step) {
                Some(next) => next,
                None => {
                    return Err(match (current, step) {
                        (Self::Object(_), PathStep::AttributeName(name)) => {
                            SchemaError::AttributeNotFound {
                                name: name.clone(),
                                path: walked.with_step(step.clone()),
                            }
                        }
                        _ => SchemaError::InvalidStep {
                            step: step.to_string(),
                            type_name: current.name(),
                            path: walked,
                        },
                    });
                }
            };
            walked = walked.with_step(step.clone());
        }

        Ok(current)
    }

    /// Checks that `value` conforms to this type, all the way down.
    ///
    /// Null and unknown conform to every type.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch found, located by path.
    pub fn validate(&self, value: &Value, path: &AttributePath) -> Result<(), ValueError> {
        let mismatch = || ValueError::ShapeMismatch {
            expected: self.name(),
            found: value.shape_name(),
            path: path.clone(),
        };

        match (self, value) {
            (_, Value::Null | Value::Unknown)
            | (Self::Bool, Value::Bool(_))
            | (Self::Number, Value::Number(_))
            | (Self::String, Value::String(_)) => Ok(()),
            (Self::List(element), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    element.validate(item, &path.at_list_index(i))?;
                }
                Ok(())
            }
            (Self::Set(element), Value::Set(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if items[..i].contains(item) {
                        return Err(ValueError::DuplicateSetElement { path: path.clone() });
                    }
                    element.validate(item, &path.at_set_value(item.clone()))?;
                }
                Ok(())
            }
            (Self::Map(element), Value::Map(entries)) => {
                for (key, item) in entries {
                    element.validate(item, &path.at_map_key(key.clone()))?;
                }
                Ok(())
            }
            (Self::Tuple(elements), Value::Tuple(items)) => {
                if elements.len() != items.len() {
                    return Err(ValueError::TupleArity {
                        expected: elements.len(),
                        found: items.len(),
                        path: path.clone(),
                    });
                }
                for (i, (element, item)) in elements.iter().zip(items).enumerate() {
                    element.validate(item, &path.at_list_index(i))?;
                }
                Ok(())
            }
            (Self::Object(attributes), Value::Object(entries)) => {
                if attributes.len() != entries.len()
                    || attributes.keys().any(|k| !entries.contains_key(k))
                {
                    return Err(ValueError::ObjectKeys {
                        expected: attributes.keys().cloned().collect(),
                        found: entries.keys().cloned().collect(),
                        path: path.clone(),
                    });
                }
                for (name, attribute) in attributes {
                    if let Some(item) = entries.get(name) {
                        attribute.validate(item, &path.at_name(name.clone()))?;
                    }
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }

    /// Builds the container a missing ancestor is replaced with during a
    /// path-addressed write.
    ///
    /// Objects get every declared attribute set to null, or to unknown when
    /// `unknown_children` is true. Tuples are filled the same way. Lists, sets
    /// and maps start empty. Scalars have no container form and yield null.
    #[must_use]
    pub fn empty_container(&self, unknown_children: bool) -> Value {
        let fill = || {
            if unknown_children {
                Value::Unknown
            } else {
                Value::Null
            }
        };

        match self {
            Self::Object(attributes) => {
                Value::Object(attributes.keys().map(|k| (k.clone(), fill())).collect())
            }
            Self::Tuple(elements) => Value::Tuple(elements.iter().map(|_| fill()).collect()),
            Self::List(_) => Value::List(Vec::new()),
            Self::Set(_) => Value::Set(Vec::new()),
            Self::Map(_) => Value::Map(BTreeMap::new()),
            Self::Bool | Self::Number | Self::String => Value::Null,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool | Self::Number | Self::String => write!(f, "{}", self.name()),
            Self::List(element) => write!(f, "list({element})"),
            Self::Set(element) => write!(f, "set({element})"),
            Self::Map(element) => write!(f, "map({element})"),
            Self::Object(attributes) => {
                write!(f, "object({{")?;
                for (i, (name, ty)) in attributes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={ty}")?;
                }
                write!(f, "}})")
            }
            Self::Tuple(elements) => {
                write!(f, "tuple([")?;
                for (i, ty) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, "])")
            }
        }
    }
}
