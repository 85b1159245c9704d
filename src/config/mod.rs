//! Schema document module.
//!
//! This module loads resource schemas declared in YAML:
//! - Parsing and deserializing `halldyll.schema.yaml`
//! - Validation of names, flags, types and plan modifiers
//! - Building a [`Schema`](crate::schema::Schema) from the document

mod parser;
mod spec;
mod validator;

pub use parser::{find_schema_file, SchemaParser, DEFAULT_SCHEMA_FILES};
pub use spec::{parse_type, AttributeSpec, ModifierSpec, NestingModeSpec, ResourceSpec, SchemaDocument};
pub use validator::{SchemaValidator, ValidationError, ValidationResult};
