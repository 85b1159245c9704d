//! Schema document validation.
//!
//! This module checks a parsed schema document for problems that would make
//! planning misbehave: invalid names, contradictory flags, malformed type
//! expressions and unknown plan modifiers.

use crate::error::{ConfigError, Result, SdkError};
use crate::planmodifier::{self, ReplaceCondition};
use std::collections::BTreeMap;
use tracing::debug;

use super::spec::{parse_type, AttributeSpec, SchemaDocument};

/// Validator for schema documents.
#[derive(Debug, Default)]
pub struct SchemaValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl SchemaValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a schema document.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any were found.
    pub fn validate(&self, document: &SchemaDocument) -> Result<ValidationResult> {
        let result = self.check(document);

        if result.errors.is_empty() {
            debug!("Schema validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(SdkError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Validates a schema document and returns every error and warning.
    #[must_use]
    pub fn check(&self, document: &SchemaDocument) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_resource(document, &mut result);
        Self::validate_attributes(&document.attributes, "attributes", &mut result);

        result
    }

    /// Validates resource-level settings.
    fn validate_resource(document: &SchemaDocument, result: &mut ValidationResult) {
        let resource = &document.resource;

        if resource.type_name.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("resource.type_name"),
                message: String::from("Resource type name cannot be empty"),
            });
        } else if !is_valid_name(&resource.type_name) {
            result.errors.push(ValidationError {
                field: String::from("resource.type_name"),
                message: format!(
                    "Resource type name '{}' is invalid. Must be lowercase alphanumeric with underscores.",
                    resource.type_name
                ),
            });
        }

        if resource.version < 0 {
            result.errors.push(ValidationError {
                field: String::from("resource.version"),
                message: format!("Schema version must not be negative, got {}", resource.version),
            });
        }

        if resource.deprecation_message.is_some() {
            result.warnings.push(format!(
                "resource: Resource type '{}' is deprecated",
                resource.type_name
            ));
        }

        if document.attributes.is_empty() {
            result.warnings.push(String::from("No attributes defined in schema"));
        }
    }

    /// Validates a level of attributes.
    fn validate_attributes(
        attributes: &BTreeMap<String, AttributeSpec>,
        prefix: &str,
        result: &mut ValidationResult,
    ) {
        for (name, attribute) in attributes {
            let field = format!("{prefix}.{name}");

            if !is_valid_name(name) {
                result.errors.push(ValidationError {
                    field: field.clone(),
                    message: format!(
                        "Attribute name '{name}' is invalid. Must be lowercase alphanumeric with underscores."
                    ),
                });
            }

            Self::validate_flags(attribute, &field, result);
            Self::validate_kind(attribute, &field, result);
            Self::validate_modifiers(attribute, &field, result);

            if attribute.deprecation_message.is_some() {
                result.warnings.push(format!("{field}: Attribute is deprecated"));
            }
        }
    }

    /// Validates the required/optional/computed combination.
    fn validate_flags(attribute: &AttributeSpec, field: &str, result: &mut ValidationResult) {
        if !attribute.required && !attribute.optional && !attribute.computed {
            result.errors.push(ValidationError {
                field: field.to_string(),
                message: String::from(
                    "Attribute must be at least one of required, optional or computed",
                ),
            });
        }

        if attribute.required && (attribute.optional || attribute.computed) {
            result.errors.push(ValidationError {
                field: field.to_string(),
                message: String::from("Required attributes cannot also be optional or computed"),
            });
        }
    }

    /// Validates the type expression or nested attributes.
    fn validate_kind(attribute: &AttributeSpec, field: &str, result: &mut ValidationResult) {
        match (&attribute.type_expr, attribute.nested) {
            (Some(expr), None) => {
                if let Err(message) = parse_type(expr) {
                    result.errors.push(ValidationError {
                        field: format!("{field}.type"),
                        message,
                    });
                }
                if !attribute.attributes.is_empty() {
                    result.errors.push(ValidationError {
                        field: format!("{field}.attributes"),
                        message: String::from("Child attributes require 'nested'"),
                    });
                }
            }
            (None, Some(_)) => {
                if attribute.attributes.is_empty() {
                    result.errors.push(ValidationError {
                        field: format!("{field}.attributes"),
                        message: String::from("Nested attributes must declare at least one child"),
                    });
                }
                Self::validate_attributes(&attribute.attributes, field, result);
            }
            (Some(_), Some(_)) => result.errors.push(ValidationError {
                field: field.to_string(),
                message: String::from("Attribute cannot declare both 'type' and 'nested'"),
            }),
            (None, None) => result.errors.push(ValidationError {
                field: field.to_string(),
                message: String::from("Attribute must declare either 'type' or 'nested'"),
            }),
        }
    }

    /// Validates plan modifier references.
    fn validate_modifiers(attribute: &AttributeSpec, field: &str, result: &mut ValidationResult) {
        for (i, modifier) in attribute.plan_modifiers.iter().enumerate() {
            let modifier_field = format!("{field}.plan_modifiers[{i}]");

            if let Err(err) = planmodifier::from_name(modifier.name(), modifier.condition(), field) {
                let message = match err {
                    ConfigError::ValidationError { message, .. } => message,
                    other => other.to_string(),
                };
                result.errors.push(ValidationError {
                    field: modifier_field,
                    message,
                });
                continue;
            }

            if modifier.name() != "requires_replace_if" && modifier.condition().is_some() {
                result.warnings.push(format!(
                    "{modifier_field}: Condition is ignored by '{}'",
                    modifier.name()
                ));
            }

            if modifier.name() == "use_state_for_unknown" && !attribute.computed {
                result.warnings.push(format!(
                    "{modifier_field}: use_state_for_unknown has no effect on a non-computed attribute"
                ));
            }

            let numeric_condition = matches!(
                modifier.condition().and_then(|c| c.parse::<ReplaceCondition>().ok()),
                Some(ReplaceCondition::ValueDecreased | ReplaceCondition::ValueIncreased)
            );
            if numeric_condition && attribute.type_expr.as_deref() != Some("number") {
                result.warnings.push(format!(
                    "{modifier_field}: Condition '{}' only applies to number attributes",
                    modifier.condition().unwrap_or_default()
                ));
            }
        }
    }
}

/// Validates that a name follows the naming convention.
/// Names must be lowercase alphanumeric with underscores, not starting with a digit.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaParser;

    fn document(yaml: &str) -> SchemaDocument {
        SchemaParser::new().parse_yaml(yaml, None).unwrap()
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("name"));
        assert!(is_valid_name("example_instance"));
        assert!(is_valid_name("_private"));
        assert!(is_valid_name("v2"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Name")); // uppercase
        assert!(!is_valid_name("2fast")); // starts with digit
        assert!(!is_valid_name("my-name")); // hyphen
    }

    #[test]
    fn test_valid_document() {
        let doc = document(
            r"
resource:
  type_name: example_instance
attributes:
  name:
    type: string
    required: true
    plan_modifiers: [requires_replace]
  id:
    type: string
    computed: true
    plan_modifiers: [use_state_for_unknown]
",
        );
        let result = SchemaValidator::new().validate(&doc).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_flag_errors() {
        let doc = document(
            r"
resource:
  type_name: example_instance
attributes:
  none:
    type: string
  both:
    type: string
    required: true
    computed: true
",
        );
        let result = SchemaValidator::new().check(&doc);
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.errors[0].field, "attributes.both");
        assert_eq!(result.errors[1].field, "attributes.none");
    }

    #[test]
    fn test_nested_and_type_errors() {
        let doc = document(
            r"
resource:
  type_name: example_instance
attributes:
  rules:
    nested: list
    optional: true
  tags:
    type: map(strng)
    optional: true
  network:
    nested: single
    optional: true
    attributes:
      Bad:
        type: string
        optional: true
",
        );
        let result = SchemaValidator::new().check(&doc);
        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["attributes.network.Bad", "attributes.rules.attributes", "attributes.tags.type"]
        );
    }

    #[test]
    fn test_modifier_errors_and_warnings() {
        let doc = document(
            r"
resource:
  type_name: example_instance
attributes:
  name:
    type: string
    optional: true
    plan_modifiers:
      - replace_always
      - use_state_for_unknown
      - name: requires_replace_if
        condition: value_decreased
      - name: requires_replace_if
        condition: sometimes
",
        );
        let result = SchemaValidator::new().check(&doc);
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.errors[0].field, "attributes.name.plan_modifiers[0]");
        assert_eq!(result.errors[1].field, "attributes.name.plan_modifiers[3]");
        assert_eq!(result.warning_count(), 2);

        let err = SchemaValidator::new().validate(&doc).unwrap_err();
        assert!(matches!(err, SdkError::Config(ConfigError::ValidationError { .. })));
    }
}
