//! Attribute definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::planmodifier::PlanModifier;
use crate::value::Type;

/// How the attributes of a nested attribute are repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingMode {
    /// One object.
    Single,
    /// An ordered list of objects.
    List,
    /// A set of objects.
    Set,
    /// A string-keyed map of objects.
    Map,
}

impl fmt::Display for NestingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::List => write!(f, "list"),
            Self::Set => write!(f, "set"),
            Self::Map => write!(f, "map"),
        }
    }
}

/// The child attributes of a nested attribute.
#[derive(Debug, Clone)]
pub struct NestedAttributes {
    /// Nesting mode.
    pub mode: NestingMode,
    /// Child attributes by name.
    pub attributes: BTreeMap<String, Attribute>,
}

impl NestedAttributes {
    /// Returns the type of one nested object.
    #[must_use]
    pub fn object_type(&self) -> Type {
        Type::Object(
            self.attributes
                .iter()
                .map(|(name, attribute)| (name.clone(), attribute.value_type()))
                .collect(),
        )
    }
}

/// What an attribute holds.
#[derive(Debug, Clone)]
pub enum AttributeKind {
    /// A value of a fixed type. Its children have no schema of their own.
    Typed(Type),
    /// Nested attributes, each with their own flags and modifiers.
    Nested(NestedAttributes),
}

/// A schema attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    kind: AttributeKind,
    required: bool,
    optional: bool,
    computed: bool,
    sensitive: bool,
    description: Option<String>,
    deprecation_message: Option<String>,
    plan_modifiers: Vec<Arc<dyn PlanModifier>>,
}

impl Attribute {
    /// Creates an attribute of any type. Flags default to unset.
    #[must_use]
    pub const fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: None,
            deprecation_message: None,
            plan_modifiers: Vec::new(),
        }
    }

    /// Creates a typed attribute.
    #[must_use]
    pub const fn typed(ty: Type) -> Self {
        Self::new(AttributeKind::Typed(ty))
    }

    /// Creates a string attribute.
    #[must_use]
    pub const fn string() -> Self {
        Self::typed(Type::String)
    }

    /// Creates a bool attribute.
    #[must_use]
    pub const fn bool() -> Self {
        Self::typed(Type::Bool)
    }

    /// Creates a number attribute.
    #[must_use]
    pub const fn number() -> Self {
        Self::typed(Type::Number)
    }

    /// Creates a list attribute.
    #[must_use]
    pub fn list(element: Type) -> Self {
        Self::typed(Type::list(element))
    }

    /// Creates a set attribute.
    #[must_use]
    pub fn set(element: Type) -> Self {
        Self::typed(Type::set(element))
    }

    /// Creates a map attribute.
    #[must_use]
    pub fn map(element: Type) -> Self {
        Self::typed(Type::map(element))
    }

    /// Creates a nested attribute.
    #[must_use]
    pub fn nested<K: Into<String>>(
        mode: NestingMode,
        attributes: impl IntoIterator<Item = (K, Self)>,
    ) -> Self {
        Self::new(AttributeKind::Nested(NestedAttributes {
            mode,
            attributes: attributes.into_iter().map(|(k, a)| (k.into(), a)).collect(),
        }))
    }

    /// Creates a single nested attribute.
    #[must_use]
    pub fn single_nested<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::nested(NestingMode::Single, attributes)
    }

    /// Creates a list nested attribute.
    #[must_use]
    pub fn list_nested<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::nested(NestingMode::List, attributes)
    }

    /// Creates a set nested attribute.
    #[must_use]
    pub fn set_nested<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::nested(NestingMode::Set, attributes)
    }

    /// Creates a map nested attribute.
    #[must_use]
    pub fn map_nested<K: Into<String>>(attributes: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::nested(NestingMode::Map, attributes)
    }

    /// Marks the attribute as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the attribute as optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the attribute as computed.
    #[must_use]
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Marks the attribute as sensitive.
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the deprecation message.
    #[must_use]
    pub fn with_deprecation_message(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = Some(message.into());
        self
    }

    /// Appends a plan modifier. Modifiers run in the order they are added.
    #[must_use]
    pub fn with_plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.plan_modifiers.push(Arc::new(modifier));
        self
    }

    /// Appends an already shared plan modifier.
    #[must_use]
    pub fn with_shared_plan_modifier(mut self, modifier: Arc<dyn PlanModifier>) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    /// Returns what the attribute holds.
    #[must_use]
    pub const fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Returns the nested attributes, if any.
    #[must_use]
    pub const fn nested_attributes(&self) -> Option<&NestedAttributes> {
        match &self.kind {
            AttributeKind::Nested(nested) => Some(nested),
            AttributeKind::Typed(_) => None,
        }
    }

    /// Returns the type of the attribute's value.
    #[must_use]
    pub fn value_type(&self) -> Type {
        match &self.kind {
            AttributeKind::Typed(ty) => ty.clone(),
            AttributeKind::Nested(nested) => {
                let object = nested.object_type();
                match nested.mode {
                    NestingMode::Single => object,
                    NestingMode::List => Type::list(object),
                    NestingMode::Set => Type::set(object),
                    NestingMode::Map => Type::map(object),
                }
            }
        }
    }

    /// Returns true if the attribute is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns true if the attribute is optional.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns true if the provider may set the attribute.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.computed
    }

    /// Returns true if the attribute is sensitive.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        self.sensitive
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

    /// Returns the plan modifiers in execution order.
    #[must_use]
    pub fn plan_modifiers(&self) -> &[Arc<dyn PlanModifier>] {
        &self.plan_modifiers
    }

    /// Returns a short flag summary such as `optional+computed`.
    #[must_use]
    pub fn flags(&self) -> String {
        let flags: Vec<&str> = [
            (self.required, "required"),
            (self.optional, "optional"),
            (self.computed, "computed"),
            (self.sensitive, "sensitive"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        flags.join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_of_nested() {
        let attribute = Attribute::list_nested([
            ("id", Attribute::string().computed()),
            ("port", Attribute::number().required()),
        ]);

        assert_eq!(
            attribute.value_type(),
            Type::list(Type::object([("id", Type::String), ("port", Type::Number)]))
        );
    }

    #[test]
    fn test_flags() {
        let attribute = Attribute::string().optional().computed();
        assert_eq!(attribute.flags(), "optional+computed");
        assert!(attribute.is_computed());
        assert!(!attribute.is_required());
    }
}
