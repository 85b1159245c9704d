//! Error types for the Halldyll provider SDK.
//!
//! This module provides the error hierarchy for every fallible operation
//! outside the plan passes themselves: schema lookups, path walking, value
//! shape validation, transport decoding, and schema document loading.
//!
//! The plan passes never surface these errors directly. They convert them into
//! [`Diagnostic`](crate::diag::Diagnostic)s so a single bad attribute cannot
//! abort a whole plan.

use std::path::PathBuf;
use thiserror::Error;

use crate::path::AttributePath;

/// The main error type for the Halldyll provider SDK.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Schema lookup errors.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Path walking errors.
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Value shape errors.
    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// Transport codec errors.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Schema document errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while resolving a path against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The path names an attribute that the schema does not declare.
    #[error("attribute {name:?} not found in schema at {path}")]
    AttributeNotFound {
        /// Missing attribute name.
        name: String,
        /// Path up to and including the missing step.
        path: AttributePath,
    },

    /// The path continues into the elements of an attribute that has no
    /// nested schema of its own.
    #[error("path {path} is inside an atomic attribute")]
    PathInsideAtomicAttribute {
        /// Offending path.
        path: AttributePath,
    },

    /// A path step cannot be applied to the schema type at that position.
    #[error("step {step} cannot be applied to {type_name} at {path}")]
    InvalidStep {
        /// Rendered step.
        step: String,
        /// Name of the type the step was applied to.
        type_name: &'static str,
        /// Path of the parent.
        path: AttributePath,
    },

    /// The path ends on an element of a nested attribute rather than on an
    /// attribute.
    #[error("path {path} addresses an element of a nested attribute")]
    ElementOfNestedAttribute {
        /// Offending path.
        path: AttributePath,
    },

    /// The empty path addresses the resource itself, not an attribute.
    #[error("the root path does not address an attribute")]
    RootPath,
}

/// Errors raised while walking a value along a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// An ancestor along the path is null, so nothing lies below it.
    #[error("no value below {path}: value is null")]
    ThroughNull {
        /// Path of the null ancestor.
        path: AttributePath,
    },

    /// An ancestor along the path is unknown, so nothing is known below it.
    #[error("no value below {path}: value is unknown")]
    ThroughUnknown {
        /// Path of the unknown ancestor.
        path: AttributePath,
    },

    /// The step names an element or attribute that the value does not contain.
    #[error("no element matches step {step} at {path}")]
    NoSuchElement {
        /// Rendered step.
        step: String,
        /// Path of the parent.
        path: AttributePath,
    },

    /// The step kind cannot be applied to the value shape at that position.
    #[error("step {step} cannot be applied to a {shape} value at {path}")]
    StepMismatch {
        /// Rendered step.
        step: String,
        /// Shape of the parent value.
        shape: &'static str,
        /// Path of the parent.
        path: AttributePath,
    },

    /// A list element can only be appended at the current list length.
    #[error(
        "cannot insert list element at index {index} of {path}: list has {len} elements, \
         intervening elements are ambiguous"
    )]
    AmbiguousInsertion {
        /// Requested index.
        index: usize,
        /// Current list length.
        len: usize,
        /// Path of the list.
        path: AttributePath,
    },
}

/// Errors raised when a value does not conform to its schema type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The value shape differs from the declared type.
    #[error("expected {expected} at {path}, found {found}")]
    ShapeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Found value shape.
        found: &'static str,
        /// Path of the value.
        path: AttributePath,
    },

    /// An object is missing a declared attribute or carries an undeclared one.
    #[error("object at {path} has attributes {found:?}, schema declares {expected:?}")]
    ObjectKeys {
        /// Declared attribute names.
        expected: Vec<String>,
        /// Present attribute names.
        found: Vec<String>,
        /// Path of the object.
        path: AttributePath,
    },

    /// A tuple has the wrong number of elements.
    #[error("tuple at {path} has {found} elements, schema declares {expected}")]
    TupleArity {
        /// Declared arity.
        expected: usize,
        /// Present arity.
        found: usize,
        /// Path of the tuple.
        path: AttributePath,
    },

    /// A set contains two equal elements.
    #[error("set at {path} contains duplicate elements")]
    DuplicateSetElement {
        /// Path of the set.
        path: AttributePath,
    },
}

/// Transport codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The JSON value does not match the schema type.
    #[error("cannot decode {found} as {expected} at {path}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// JSON kind found.
        found: &'static str,
        /// Path of the value.
        path: AttributePath,
    },

    /// The JSON object carries a key the schema does not declare.
    #[error("unexpected attribute {name:?} at {path}")]
    UnexpectedAttribute {
        /// Unexpected key.
        name: String,
        /// Path of the object.
        path: AttributePath,
    },

    /// The JSON text could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Schema document errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The schema file was not found.
    #[error("Schema file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The schema file could not be parsed.
    #[error("Failed to parse schema: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Schema validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Attribute that failed validation.
        field: Option<String>,
    },

    /// A plan modifier name is not part of the built-in catalogue.
    #[error("Unknown plan modifier {name:?} on attribute {attribute}")]
    UnknownModifier {
        /// Modifier name.
        name: String,
        /// Attribute it was declared on.
        attribute: String,
    },
}

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

impl SdkError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the error stems from a provider programming mistake
    /// rather than from user input.
    #[must_use]
    pub const fn is_provider_bug(&self) -> bool {
        matches!(
            self,
            Self::Schema(_) | Self::Value(_) | Self::Internal(_)
        )
    }
}

impl ConfigError {
    /// Creates a validation error for a specific attribute.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific attribute.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl PathError {
    /// Returns true if the walk stopped at a null or unknown ancestor, which
    /// callers treat as absence rather than failure.
    #[must_use]
    pub const fn is_missing_ancestor(&self) -> bool {
        matches!(self, Self::ThroughNull { .. } | Self::ThroughUnknown { .. })
    }
}
