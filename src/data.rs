//! Path-addressed access to resource data.
//!
//! [`ResourceData`] pairs a value tree with its schema so resource hooks can
//! read and write attributes by [`AttributePath`]. Reads through a null or
//! unknown ancestor are not errors. Writes synthesize missing ancestors and
//! are atomic: on any error the tree is left unchanged.

use std::fmt;

use tracing::trace;

use crate::diag::{Diagnostic, Diagnostics};
use crate::error::{PathError, SchemaError, SdkError};
use crate::path::{AttributePath, PathStep};
use crate::schema::Schema;
use crate::value::{Type, Value};

/// Which resource document a [`ResourceData`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDescription {
    /// The user configuration.
    Configuration,
    /// The planned state.
    Plan,
    /// The prior state.
    State,
}

impl DataDescription {
    /// Summary used for read errors, such as `Plan Read Error`.
    #[must_use]
    pub const fn read_error_title(self) -> &'static str {
        match self {
            Self::Configuration => "Configuration Read Error",
            Self::Plan => "Plan Read Error",
            Self::State => "State Read Error",
        }
    }

    /// Summary used for write errors, such as `Plan Write Error`.
    #[must_use]
    pub const fn write_error_title(self) -> &'static str {
        match self {
            Self::Configuration => "Configuration Write Error",
            Self::Plan => "Plan Write Error",
            Self::State => "State Write Error",
        }
    }
}

impl fmt::Display for DataDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Plan => write!(f, "plan"),
            Self::State => write!(f, "state"),
        }
    }
}

/// A resource value tree bound to its schema.
#[derive(Debug, Clone)]
pub struct ResourceData<'s> {
    schema: &'s Schema,
    description: DataDescription,
    value: Value,
}

impl<'s> ResourceData<'s> {
    /// Binds `value` to `schema`.
    #[must_use]
    pub const fn new(schema: &'s Schema, description: DataDescription, value: Value) -> Self {
        Self {
            schema,
            description,
            value,
        }
    }

    /// Returns the schema.
    #[must_use]
    pub const fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Returns which document this is.
    #[must_use]
    pub const fn description(&self) -> DataDescription {
        self.description
    }

    /// Returns the whole value tree.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the data and returns the value tree.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Reads the value at `path`.
    ///
    /// A null ancestor or a missing element yields null and an unknown
    /// ancestor yields unknown. Only a path that does not fit the schema, or
    /// a tree that does not fit its schema, produces an error diagnostic.
    #[must_use]
    pub fn get_at_path(&self, path: &AttributePath) -> (Value, Diagnostics) {
        let mut diags = Diagnostics::new();

        if let Err(err) = self.schema.type_at_path(path) {
            diags.add(
                Diagnostic::provider_bug(
                    self.description.read_error_title(),
                    &format!("retrieving type information from the {}", self.description),
                    &err,
                )
                .with_path(path.clone()),
            );
            return (Value::Null, diags);
        }

        match self.value.walk(path) {
            Ok(value) => (value.clone(), diags),
            Err(PathError::ThroughUnknown { .. }) => (Value::Unknown, diags),
            Err(PathError::ThroughNull { .. } | PathError::NoSuchElement { .. }) => {
                (Value::Null, diags)
            }
            Err(err) => {
                diags.add(
                    Diagnostic::provider_bug(
                        self.description.read_error_title(),
                        &format!("retrieving a value from the {}", self.description),
                        &err,
                    )
                    .with_path(path.clone()),
                );
                (Value::Null, diags)
            }
        }
    }

    /// Returns true if a value, even null, is present at `path`.
    #[must_use]
    pub fn path_exists(&self, path: &AttributePath) -> bool {
        self.value.walk(path).is_ok()
    }

    /// Writes `value` at `path`, creating missing ancestors.
    ///
    /// Missing objects are created with every attribute null, or unknown if
    /// the ancestor was unknown. A list can only grow by appending at its
    /// current length. Map keys and set elements are added as needed.
    pub fn set_at_path(&mut self, path: &AttributePath, value: Value) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let mut updated = self.value.clone();
        let result = self
            .schema
            .type_at_path(path)
            .map_err(SdkError::from)
            .and_then(|target| {
                target.validate(&value, path)?;
                let root_type = self.schema.value_type();
                upsert(&mut updated, &root_type, path.steps(), &AttributePath::root(), value)
            });

        match result {
            Ok(()) => {
                trace!(attribute_path = %path, data = %self.description, "Wrote value");
                self.value = updated;
            }
            Err(err) => {
                diags.add(
                    Diagnostic::provider_bug(
                        self.description.write_error_title(),
                        &format!("writing a value to the {}", self.description),
                        &err,
                    )
                    .with_path(path.clone()),
                );
            }
        }

        diags
    }
}

/// Writes `value` below `node` along `steps`, synthesizing containers for
/// null or unknown ancestors and validating each level written.
fn upsert(
    node: &mut Value,
    ty: &Type,
    steps: &[PathStep],
    path: &AttributePath,
    value: Value,
) -> Result<(), SdkError> {
    let Some((step, rest)) = steps.split_first() else {
        *node = value;
        return Ok(());
    };

    if !node.is_known() {
        *node = ty.empty_container(node.is_unknown());
    }

    let child_type = ty.at_step(step).ok_or_else(|| SchemaError::InvalidStep {
        step: step.to_string(),
        type_name: ty.name(),
        path: path.clone(),
    })?;
    let child_path = path.with_step(step.clone());

    let child = match (&mut *node, step) {
        (Value::Object(attributes), PathStep::AttributeName(name)) => {
            attributes.entry(name.clone()).or_insert(Value::Null)
        }
        (Value::Tuple(items), PathStep::ElementIndex(index)) => {
            items.get_mut(*index).ok_or_else(|| PathError::NoSuchElement {
                step: step.to_string(),
                path: path.clone(),
            })?
        }
        (Value::List(items), PathStep::ElementIndex(index)) => {
            let len = items.len();
            if *index > len {
                return Err(PathError::AmbiguousInsertion {
                    index: *index,
                    len,
                    path: path.clone(),
                }
                .into());
            }
            if *index == len {
                items.push(Value::Null);
            }
            &mut items[*index]
        }
        (Value::Map(entries), PathStep::ElementKey(key)) => {
            entries.entry(key.clone()).or_insert(Value::Null)
        }
        (Value::Set(items), PathStep::ElementValue(wanted)) => {
            let position = match items.iter().position(|item| item == wanted) {
                Some(position) => position,
                None => {
                    items.push(wanted.clone());
                    items.len() - 1
                }
            };
            &mut items[position]
        }
        (other, _) => {
            return Err(PathError::StepMismatch {
                step: step.to_string(),
                shape: other.shape_name(),
                path: path.clone(),
            }
            .into());
        }
    };

    upsert(child, child_type, rest, &child_path, value)?;

    // A rewritten set element may now equal a sibling.
    node.dedup_set();
    ty.validate(node, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;

    fn schema() -> Schema {
        Schema::builder()
            .attribute("name", Attribute::string().required())
            .attribute(
                "network",
                Attribute::single_nested([
                    ("subnet", Attribute::string().optional()),
                    ("address", Attribute::string().computed()),
                ]),
            )
            .attribute("ports", Attribute::list(Type::Number).optional())
            .attribute("tags", Attribute::map(Type::String).optional())
            .attribute("zones", Attribute::set(Type::String).optional())
            .build()
    }

    fn plan(schema: &Schema, network: Value) -> ResourceData<'_> {
        ResourceData::new(
            schema,
            DataDescription::Plan,
            Value::object([
                ("name", Value::string("vm")),
                ("network", network),
                ("ports", Value::list([Value::int(80)])),
                ("tags", Value::Null),
                ("zones", Value::set([Value::string("a")])),
            ]),
        )
    }

    #[test]
    fn test_get_through_null_and_unknown() {
        let schema = schema();
        let address = AttributePath::root().at_name("network").at_name("address");

        let (value, diags) = plan(&schema, Value::Null).get_at_path(&address);
        assert!(value.is_null());
        assert!(diags.is_empty());

        let (value, diags) = plan(&schema, Value::Unknown).get_at_path(&address);
        assert!(value.is_unknown());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_get_unknown_attribute_is_error() {
        let schema = schema();
        let (_, diags) = plan(&schema, Value::Null).get_at_path(&AttributePath::root().at_name("nope"));
        assert!(diags.has_error());
        assert_eq!(diags.iter().next().unwrap().summary, "Plan Read Error");
    }

    #[test]
    fn test_set_synthesizes_object() {
        let schema = schema();
        let mut data = plan(&schema, Value::Null);
        let address = AttributePath::root().at_name("network").at_name("address");

        let diags = data.set_at_path(&address, Value::string("10.0.0.1"));
        assert!(diags.is_empty(), "{diags:?}");

        let network = data.get_at_path(&AttributePath::root().at_name("network")).0;
        assert_eq!(
            network,
            Value::object([("subnet", Value::Null), ("address", Value::string("10.0.0.1"))])
        );
    }

    #[test]
    fn test_set_under_unknown_parent_keeps_siblings_unknown() {
        let schema = schema();
        let mut data = plan(&schema, Value::Unknown);
        let address = AttributePath::root().at_name("network").at_name("address");

        assert!(data.set_at_path(&address, Value::string("10.0.0.1")).is_empty());
        let subnet = AttributePath::root().at_name("network").at_name("subnet");
        assert!(data.get_at_path(&subnet).0.is_unknown());
    }

    #[test]
    fn test_list_append_only() {
        let schema = schema();
        let mut data = plan(&schema, Value::Null);
        let ports = AttributePath::root().at_name("ports");

        assert!(data.set_at_path(&ports.at_list_index(1), Value::int(443)).is_empty());
        assert!(data.set_at_path(&ports.at_list_index(0), Value::int(8080)).is_empty());

        let before = data.value().clone();
        let diags = data.set_at_path(&ports.at_list_index(5), Value::int(1));
        assert!(diags.has_error());
        assert!(diags.iter().next().unwrap().detail.contains("ambiguous"));
        assert_eq!(data.value(), &before);

        assert_eq!(
            data.get_at_path(&ports).0,
            Value::list([Value::int(8080), Value::int(443)])
        );
    }

    #[test]
    fn test_set_map_key_and_set_element() {
        let schema = schema();
        let mut data = plan(&schema, Value::Null);

        let env = AttributePath::root().at_name("tags").at_map_key("env");
        assert!(data.set_at_path(&env, Value::string("prod")).is_empty());
        assert_eq!(data.get_at_path(&env).0, Value::string("prod"));

        let zone = AttributePath::root().at_name("zones").at_set_value(Value::string("b"));
        assert!(data.set_at_path(&zone, Value::string("b")).is_empty());
        assert_eq!(
            data.get_at_path(&AttributePath::root().at_name("zones")).0,
            Value::set([Value::string("a"), Value::string("b")])
        );
    }

    #[test]
    fn test_set_wrong_type_is_atomic_error() {
        let schema = schema();
        let mut data = plan(&schema, Value::Null);
        let before = data.value().clone();

        let diags = data.set_at_path(&AttributePath::root().at_name("name"), Value::int(3));
        assert!(diags.has_error());
        assert!(diags.iter().next().unwrap().detail.contains("always a bug"));
        assert_eq!(data.value(), &before);
    }

    #[test]
    fn test_path_exists() {
        let schema = schema();
        let data = plan(&schema, Value::Null);
        assert!(data.path_exists(&AttributePath::root().at_name("network")));
        assert!(!data.path_exists(&AttributePath::root().at_name("network").at_name("subnet")));
    }
}
