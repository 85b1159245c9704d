//! Schema document types.
//!
//! This module defines the structs that map to a `halldyll.schema.yaml` file,
//! which declares one resource type: its attributes, their flags and the
//! built-in plan modifiers attached to them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::planmodifier;
use crate::resource::Resource;
use crate::schema::{Attribute, NestingMode, Schema};
use crate::value::Type;

/// The root structure of a schema document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaDocument {
    /// Resource-level settings.
    pub resource: ResourceSpec,
    /// Top-level attributes by name.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSpec>,
}

/// Resource-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    /// Resource type name, such as `example_instance`.
    pub type_name: String,
    /// Schema version.
    #[serde(default)]
    pub version: i64,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Deprecation message, reported as a warning on every plan.
    #[serde(default)]
    pub deprecation_message: Option<String>,
}

/// One attribute declaration.
///
/// Exactly one of `type` and `nested` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    /// Type expression, such as `string` or `list(object({port=number}))`.
    #[serde(rename = "type", default)]
    pub type_expr: Option<String>,
    /// Nesting mode for nested attributes.
    #[serde(default)]
    pub nested: Option<NestingModeSpec>,
    /// Child attributes of a nested attribute.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSpec>,
    /// Must be set in configuration.
    #[serde(default)]
    pub required: bool,
    /// May be set in configuration.
    #[serde(default)]
    pub optional: bool,
    /// May be set by the provider.
    #[serde(default)]
    pub computed: bool,
    /// Hidden from output.
    #[serde(default)]
    pub sensitive: bool,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Deprecation message.
    #[serde(default)]
    pub deprecation_message: Option<String>,
    /// Built-in plan modifiers in execution order.
    #[serde(default)]
    pub plan_modifiers: Vec<ModifierSpec>,
}

/// Nesting mode of a nested attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NestingModeSpec {
    /// One object.
    Single,
    /// A list of objects.
    List,
    /// A set of objects.
    Set,
    /// A map of objects.
    Map,
}

impl From<NestingModeSpec> for NestingMode {
    fn from(mode: NestingModeSpec) -> Self {
        match mode {
            NestingModeSpec::Single => Self::Single,
            NestingModeSpec::List => Self::List,
            NestingModeSpec::Set => Self::Set,
            NestingModeSpec::Map => Self::Map,
        }
    }
}

/// A plan modifier reference: a bare catalogue name, or a name with a
/// condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ModifierSpec {
    /// Catalogue name only.
    Name(String),
    /// Catalogue name with options.
    Detailed {
        /// Catalogue name.
        name: String,
        /// Condition for `requires_replace_if`.
        #[serde(default)]
        condition: Option<String>,
    },
}

impl ModifierSpec {
    /// Returns the catalogue name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }

    /// Returns the condition, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::Detailed { condition, .. } => condition.as_deref(),
        }
    }
}

impl SchemaDocument {
    /// Builds the resource schema.
    ///
    /// # Errors
    ///
    /// Returns an error if a type expression is invalid, an attribute has
    /// neither or both of `type` and `nested`, or a modifier is unknown.
    pub fn to_schema(&self) -> Result<Schema, ConfigError> {
        let mut builder = Schema::builder().version(self.resource.version);
        if let Some(description) = &self.resource.description {
            builder = builder.description(description.clone());
        }
        if let Some(message) = &self.resource.deprecation_message {
            builder = builder.deprecation_message(message.clone());
        }

        for (name, spec) in &self.attributes {
            builder = builder.attribute(name.clone(), spec.to_attribute(name)?);
        }

        Ok(builder.build())
    }

    /// Builds the resource definition, without a plan hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be built.
    pub fn to_resource(&self) -> Result<Resource, ConfigError> {
        Ok(Resource::new(self.resource.type_name.clone(), self.to_schema()?))
    }

    /// Counts attributes at every nesting level.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        fn count(attributes: &BTreeMap<String, AttributeSpec>) -> usize {
            attributes.values().map(|a| 1 + count(&a.attributes)).sum()
        }
        count(&self.attributes)
    }
}

impl AttributeSpec {
    /// Builds the attribute. `field` is the dotted name used in errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is inconsistent.
    pub fn to_attribute(&self, field: &str) -> Result<Attribute, ConfigError> {
        let mut attribute = match (&self.type_expr, self.nested) {
            (Some(expr), None) => Attribute::typed(parse_type(expr).map_err(|message| {
                ConfigError::validation(message, field)
            })?),
            (None, Some(mode)) => {
                let mut children = Vec::with_capacity(self.attributes.len());
                for (name, child) in &self.attributes {
                    children.push((name.clone(), child.to_attribute(&format!("{field}.{name}"))?));
                }
                Attribute::nested(mode.into(), children)
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::validation(
                    "Attribute cannot declare both 'type' and 'nested'",
                    field,
                ));
            }
            (None, None) => {
                return Err(ConfigError::validation(
                    "Attribute must declare either 'type' or 'nested'",
                    field,
                ));
            }
        };

        if self.required {
            attribute = attribute.required();
        }
        if self.optional {
            attribute = attribute.optional();
        }
        if self.computed {
            attribute = attribute.computed();
        }
        if self.sensitive {
            attribute = attribute.sensitive();
        }
        if let Some(description) = &self.description {
            attribute = attribute.with_description(description.clone());
        }
        if let Some(message) = &self.deprecation_message {
            attribute = attribute.with_deprecation_message(message.clone());
        }
        for modifier in &self.plan_modifiers {
            attribute = attribute.with_shared_plan_modifier(planmodifier::from_name(
                modifier.name(),
                modifier.condition(),
                field,
            )?);
        }

        Ok(attribute)
    }
}

/// Parses a type expression.
///
/// Accepted forms are `bool`, `number`, `string`, `list(T)`, `set(T)`,
/// `map(T)`, `object({name=T, ...})` and `tuple([T, ...])`. Whitespace between
/// tokens is ignored.
///
/// # Errors
///
/// Returns a message describing the first syntax error.
pub fn parse_type(expr: &str) -> Result<Type, String> {
    let mut parser = TypeParser { input: expr, pos: 0 };
    let ty = parser.parse()?;
    parser.skip_whitespace();
    if parser.pos != expr.len() {
        return Err(format!(
            "Unexpected trailing input '{}' in type expression '{expr}'",
            &expr[parser.pos..]
        ));
    }
    Ok(ty)
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.input[self.pos..].chars().next()
    }

    fn expect(&mut self, wanted: char) -> Result<(), String> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(format!("Expected '{wanted}' at offset {}, found '{c}'", self.pos)),
            None => Err(format!("Expected '{wanted}' at end of type expression")),
        }
    }

    fn identifier(&mut self) -> Result<&str, String> {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(format!("Expected a name at offset {}", self.pos));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn parse(&mut self) -> Result<Type, String> {
        let keyword = self.identifier()?.to_string();
        match keyword.as_str() {
            "bool" => Ok(Type::Bool),
            "number" => Ok(Type::Number),
            "string" => Ok(Type::String),
            "list" | "set" | "map" => {
                self.expect('(')?;
                let element = self.parse()?;
                self.expect(')')?;
                Ok(match keyword.as_str() {
                    "list" => Type::list(element),
                    "set" => Type::set(element),
                    _ => Type::map(element),
                })
            }
            "object" => {
                self.expect('(')?;
                self.expect('{')?;
                let mut attributes = BTreeMap::new();
                while self.peek() != Some('}') {
                    if !attributes.is_empty() {
                        self.expect(',')?;
                    }
                    let name = self.identifier()?.to_string();
                    self.expect('=')?;
                    let ty = self.parse()?;
                    if attributes.insert(name.clone(), ty).is_some() {
                        return Err(format!("Duplicate object attribute '{name}'"));
                    }
                }
                self.expect('}')?;
                self.expect(')')?;
                Ok(Type::Object(attributes))
            }
            "tuple" => {
                self.expect('(')?;
                self.expect('[')?;
                let mut elements = Vec::new();
                while self.peek() != Some(']') {
                    if !elements.is_empty() {
                        self.expect(',')?;
                    }
                    elements.push(self.parse()?);
                }
                self.expect(']')?;
                self.expect(')')?;
                Ok(Type::Tuple(elements))
            }
            other => Err(format!("Unknown type '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("string"), Ok(Type::String));
        assert_eq!(parse_type(" list( number ) "), Ok(Type::list(Type::Number)));
        assert_eq!(
            parse_type("object({port=number, tags=map(string)})"),
            Ok(Type::object([
                ("port", Type::Number),
                ("tags", Type::map(Type::String)),
            ]))
        );
        assert_eq!(
            parse_type("tuple([string, bool])"),
            Ok(Type::Tuple(vec![Type::String, Type::Bool]))
        );
        assert_eq!(parse_type("object({})"), Ok(Type::Object(BTreeMap::new())));
    }

    #[test]
    fn test_parse_type_round_trips_display() {
        let ty = Type::object([("a", Type::set(Type::String)), ("b", Type::Number)]);
        assert_eq!(parse_type(&ty.to_string()), Ok(ty));
    }

    #[test]
    fn test_parse_type_errors() {
        assert!(parse_type("strng").is_err());
        assert!(parse_type("list(string").is_err());
        assert!(parse_type("list(string))").is_err());
        assert!(parse_type("object({a=string, a=number})").is_err());
        assert!(parse_type("").is_err());
    }

    #[test]
    fn test_to_attribute_requires_type_or_nested() {
        let spec = AttributeSpec::default();
        assert!(matches!(
            spec.to_attribute("name"),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r"
type: string
requried: true
";
        assert!(serde_yaml::from_str::<AttributeSpec>(yaml).is_err());
    }

    #[test]
    fn test_modifier_spec_forms() {
        let yaml = r"
- requires_replace
- name: requires_replace_if
  condition: value_decreased
";
        let modifiers: Vec<ModifierSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(modifiers[0].name(), "requires_replace");
        assert_eq!(modifiers[0].condition(), None);
        assert_eq!(modifiers[1].condition(), Some("value_decreased"));
    }
}
