//! Schema document parser.
//!
//! This module loads resource schemas from YAML files and the JSON value
//! documents (configuration, prior state, proposal) the plan command reads.

use crate::error::{ConfigError, Result, SdkError};
use crate::value::{self, Type, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::SchemaDocument;

/// Parser for schema documents.
#[derive(Debug, Default)]
pub struct SchemaParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl SchemaParser {
    /// Creates a new schema parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Loads a schema document from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<SchemaDocument> {
        let path = self.resolve(path.as_ref());
        info!("Loading schema from: {}", path.display());

        let content = read_file(&path)?;
        self.parse_yaml(&content, Some(&path))
    }

    /// Parses a schema document from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<SchemaDocument> {
        debug!("Parsing YAML schema");

        let document: SchemaDocument = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            SdkError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed schema for resource type {} with {} attributes",
            document.resource.type_name,
            document.attribute_count()
        );
        Ok(document)
    }

    /// Loads a schema document with environment variable overrides.
    ///
    /// `HALLDYLL_RESOURCE_TYPE` replaces the resource type name and
    /// `HALLDYLL_SCHEMA_VERSION` the schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// version override is not an integer.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<SchemaDocument> {
        let mut document = self.load_file(path)?;
        Self::apply_env_overrides(&mut document)?;
        Ok(document)
    }

    fn apply_env_overrides(document: &mut SchemaDocument) -> Result<()> {
        if let Ok(type_name) = std::env::var("HALLDYLL_RESOURCE_TYPE") {
            debug!("Overriding resource.type_name from environment");
            document.resource.type_name = type_name;
        }

        if let Ok(version) = std::env::var("HALLDYLL_SCHEMA_VERSION") {
            debug!("Overriding resource.version from environment");
            document.resource.version = version.trim().parse().map_err(|_| {
                SdkError::Config(ConfigError::validation(
                    format!("HALLDYLL_SCHEMA_VERSION must be an integer, got '{version}'"),
                    "resource.version",
                ))
            })?;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                SdkError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Loads a JSON value document and decodes it against `ty`.
    ///
    /// The document uses the transport encoding: `null` for null and the
    /// object `{"@unknown": true}` for unknown values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not match `ty`.
    pub fn load_value(&self, path: impl AsRef<Path>, ty: &Type) -> Result<Value> {
        let path = self.resolve(path.as_ref());
        debug!("Loading value from: {}", path.display());

        let content = read_file(&path)?;
        Ok(value::decode_str(&content, ty)?)
    }
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(SdkError::Config(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }));
    }

    std::fs::read_to_string(path).map_err(|e| {
        SdkError::Config(ConfigError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })
    })
}

/// Default schema file names to search for.
pub const DEFAULT_SCHEMA_FILES: &[&str] = &[
    "halldyll.schema.yaml",
    "halldyll.schema.yml",
    "schema.yaml",
    "schema.yml",
];

/// Finds the schema file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no schema file is found.
pub fn find_schema_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_SCHEMA_FILES {
            let schema_path = current.join(filename);
            if schema_path.exists() {
                info!("Found schema file: {}", schema_path.display());
                return Ok(schema_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(SdkError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_SCHEMA_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::ModifierSpec;

    const INSTANCE: &str = r"
resource:
  type_name: example_instance
  version: 2
  description: A compute instance.
attributes:
  name:
    type: string
    required: true
    plan_modifiers:
      - requires_replace
  size:
    type: number
    optional: true
    plan_modifiers:
      - name: requires_replace_if
        condition: value_decreased
  id:
    type: string
    computed: true
    plan_modifiers:
      - use_state_for_unknown
  rules:
    nested: list
    optional: true
    attributes:
      port:
        type: number
        required: true
      id:
        type: string
        computed: true
";

    #[test]
    fn test_parse_minimal_schema() {
        let yaml = r"
resource:
  type_name: example_thing
";
        let parser = SchemaParser::new();
        let document = parser.parse_yaml(yaml, None).unwrap();
        assert_eq!(document.resource.type_name, "example_thing");
        assert_eq!(document.resource.version, 0);
        assert!(document.attributes.is_empty());
    }

    #[test]
    fn test_parse_full_schema() {
        let parser = SchemaParser::new();
        let document = parser.parse_yaml(INSTANCE, None).unwrap();

        assert_eq!(document.resource.version, 2);
        assert_eq!(document.attributes.len(), 4);
        assert_eq!(document.attribute_count(), 6);
        assert_eq!(
            document.attributes["size"].plan_modifiers,
            vec![ModifierSpec::Detailed {
                name: "requires_replace_if".to_string(),
                condition: Some("value_decreased".to_string()),
            }]
        );

        let schema = document.to_schema().unwrap();
        assert_eq!(schema.version(), 2);
        assert_eq!(schema.attribute("name").unwrap().plan_modifiers().len(), 1);
        assert!(schema.attribute("rules").unwrap().nested_attributes().is_some());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let parser = SchemaParser::new();
        let err = parser.parse_yaml("resource: [", None).unwrap_err();
        assert!(matches!(err, SdkError::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_file_and_find() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("halldyll.schema.yaml"), INSTANCE).unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_schema_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("halldyll.schema.yaml"));

        let parser = SchemaParser::new().with_base_path(dir.path());
        let document = parser.load_file("halldyll.schema.yaml").unwrap();
        assert_eq!(document.resource.type_name, "example_instance");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let parser = SchemaParser::new().with_base_path(dir.path());
        let err = parser.load_file("missing.yaml").unwrap_err();
        assert!(matches!(err, SdkError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_value() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"name": "web", "id": {"@unknown": true}}"#,
        )
        .unwrap();
        let ty = Type::object([("name", Type::String), ("id", Type::String)]);

        let parser = SchemaParser::new().with_base_path(dir.path());
        let value = parser.load_value("config.json", &ty).unwrap();
        assert_eq!(
            value,
            Value::object([("name", Value::string("web")), ("id", Value::Unknown)])
        );
    }
}
