//! Resource schemas.
//!
//! A [`Schema`] declares the attributes of a resource: their types or nested
//! attributes, their flags and their plan modifiers. Schemas are immutable once
//! built and are shared read-only by every plan pass.

mod attribute;

pub use attribute::{Attribute, AttributeKind, NestedAttributes, NestingMode};

use std::collections::BTreeMap;

use crate::error::SchemaError;
use crate::path::{AttributePath, PathStep};
use crate::value::Type;

/// A resource schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: BTreeMap<String, Attribute>,
    version: i64,
    description: Option<String>,
    deprecation_message: Option<String>,
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.schema.attributes.insert(name.into(), attribute);
        self
    }

    /// Sets the schema version.
    #[must_use]
    pub const fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = Some(description.into());
        self
    }

    /// Sets the deprecation message.
    #[must_use]
    pub fn deprecation_message(mut self, message: impl Into<String>) -> Self {
        self.schema.deprecation_message = Some(message.into());
        self
    }

    /// Builds the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Returns the top-level attributes.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    /// Returns a top-level attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Returns the schema version.
    #[must_use]
    pub const fn version(&self) -> i64 {
        self.version
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the deprecation message.
    #[must_use]
    pub fn deprecation_message(&self) -> Option<&str> {
        self.deprecation_message.as_deref()
    }

    /// Returns the object type of a whole resource value.
    #[must_use]
    pub fn value_type(&self) -> Type {
        Type::Object(
            self.attributes
                .iter()
                .map(|(name, attribute)| (name.clone(), attribute.value_type()))
                .collect(),
        )
    }

    /// Returns the type at `path`. The root path yields the resource type.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not fit the schema.
    pub fn type_at_path(&self, path: &AttributePath) -> Result<Type, SchemaError> {
        self.value_type().at_path(path).cloned()
    }

    /// Returns the attribute that `path` ends on.
    ///
    /// Steps into nested attributes must select an element (for list, set
    /// and map nesting) and then name a child attribute.
    ///
    /// # Errors
    ///
    /// Returns an error for the root path, for paths that continue inside an
    /// atomic attribute, for paths that end on a nested element, and for
    /// undeclared names.
    pub fn attribute_at_path(&self, path: &AttributePath) -> Result<&Attribute, SchemaError> {
        let mut steps = path.steps().iter();
        let mut walked = AttributePath::root();

        let Some(first) = steps.next() else {
            return Err(SchemaError::RootPath);
        };
        let mut current = Self::lookup(&self.attributes, first, &walked)?;
        walked = walked.with_step(first.clone());

        while let Some(step) = steps.next() {
            let Some(nested) = current.nested_attributes() else {
                return Err(SchemaError::PathInsideAtomicAttribute {
                    path: walked.with_step(step.clone()),
                });
            };

            let name_step = match (nested.mode, step) {
                (NestingMode::Single, PathStep::AttributeName(_)) => step,
                (NestingMode::List, PathStep::ElementIndex(_))
                | (NestingMode::Set, PathStep::ElementValue(_))
                | (NestingMode::Map, PathStep::ElementKey(_)) => {
                    walked = walked.with_step(step.clone());
                    match steps.next() {
                        Some(next) => next,
                        None => return Err(SchemaError::ElementOfNestedAttribute { path: walked }),
                    }
                }
                _ => {
                    return Err(SchemaError::InvalidStep {
                        step: step.to_string(),
                        type_name: current.value_type().name(),
                        path: walked,
                    });
                }
            };

            current = Self::lookup(&nested.attributes, name_step, &walked)?;
            walked = walked.with_step(name_step.clone());
        }

        Ok(current)
    }

    fn lookup<'a>(
        attributes: &'a BTreeMap<String, Attribute>,
        step: &PathStep,
        parent: &AttributePath,
    ) -> Result<&'a Attribute, SchemaError> {
        match step {
            PathStep::AttributeName(name) => {
                attributes
                    .get(name)
                    .ok_or_else(|| SchemaError::AttributeNotFound {
                        name: name.clone(),
                        path: parent.with_step(step.clone()),
                    })
            }
            other => Err(SchemaError::InvalidStep {
                step: other.to_string(),
                type_name: "object",
                path: parent.clone(),
            }),
        }
    }
}
