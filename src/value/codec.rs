//! JSON transport for value trees.
//!
//! Known values map onto their natural JSON form. Null is JSON `null`, and
//! Unknown is the marker object `{"@unknown": true}`. Decoding is guided by the
//! schema type so sets, tuples, maps and objects can be told apart.

use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::error::CodecError;
use crate::path::AttributePath;

use super::{Type, Value, push_unique};

/// Key of the marker object that encodes an unknown value.
pub const UNKNOWN_MARKER: &str = "@unknown";

const fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn is_unknown_marker(json: &Json) -> bool {
    match json {
        Json::Object(fields) => {
            fields.len() == 1 && fields.get(UNKNOWN_MARKER) == Some(&Json::Bool(true))
        }
        _ => false,
    }
}

/// Decodes a JSON document into a value of type `ty`.
///
/// Object attributes absent from the document decode as null.
///
/// # Errors
///
/// Returns an error if the document does not match the type or carries an
/// undeclared object attribute.
pub fn decode(json: &Json, ty: &Type) -> Result<Value, CodecError> {
    decode_at(json, ty, &AttributePath::root())
}

/// Parses JSON text and decodes it into a value of type `ty`.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or does not match the type.
pub fn decode_str(text: &str, ty: &Type) -> Result<Value, CodecError> {
    let json: Json = serde_json::from_str(text)?;
    decode(&json, ty)
}

fn decode_at(json: &Json, ty: &Type, path: &AttributePath) -> Result<Value, CodecError> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    if is_unknown_marker(json) {
        return Ok(Value::Unknown);
    }

    let mismatch = || CodecError::TypeMismatch {
        expected: ty.name(),
        found: json_kind(json),
        path: path.clone(),
    };

    match (ty, json) {
        (Type::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (Type::Number, Json::Number(n)) => Ok(Value::Number(n.clone())),
        (Type::String, Json::String(s)) => Ok(Value::String(s.clone())),
        (Type::List(element), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode_at(item, element, &path.at_list_index(i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (Type::Set(element), Json::Array(items)) => {
            let mut elements = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                // Set elements have no identity until decoded, so errors are
                // located by their position in the document.
                push_unique(&mut elements, decode_at(item, element, &path.at_list_index(i))?);
            }
            Ok(Value::Set(elements))
        }
        (Type::Tuple(elements), Json::Array(items)) => {
            if elements.len() != items.len() {
                return Err(mismatch());
            }
            elements
                .iter()
                .zip(items)
                .enumerate()
                .map(|(i, (element, item))| decode_at(item, element, &path.at_list_index(i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Tuple)
        }
        (Type::Map(element), Json::Object(fields)) => fields
            .iter()
            .map(|(key, item)| {
                decode_at(item, element, &path.at_map_key(key.clone())).map(|v| (key.clone(), v))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Value::Map),
        (Type::Object(attributes), Json::Object(fields)) => {
            if let Some(extra) = fields.keys().find(|k| !attributes.contains_key(*k)) {
                return Err(CodecError::UnexpectedAttribute {
                    name: extra.clone(),
                    path: path.clone(),
                });
            }
            let mut decoded = BTreeMap::new();
            for (name, attribute) in attributes {
                let value = match fields.get(name) {
                    Some(item) => decode_at(item, attribute, &path.at_name(name.clone()))?,
                    None => Value::Null,
                };
                decoded.insert(name.clone(), value);
            }
            Ok(Value::Object(decoded))
        }
        _ => Err(mismatch()),
    }
}

/// Encodes a value tree as JSON.
#[must_use]
pub fn encode(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Unknown => {
            let mut marker = serde_json::Map::new();
            marker.insert(UNKNOWN_MARKER.to_string(), Json::Bool(true));
            Json::Object(marker)
        }
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
            Json::Array(items.iter().map(encode).collect())
        }
        Value::Map(entries) | Value::Object(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), encode(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance_type() -> Type {
        Type::object([
            ("name", Type::String),
            ("size", Type::Number),
            ("zones", Type::set(Type::String)),
            ("tags", Type::map(Type::String)),
            ("id", Type::String),
        ])
    }

    #[test]
    fn test_decode_object() {
        let doc = json!({
            "name": "web",
            "size": 2,
            "zones": ["a", "b", "a"],
            "tags": {"env": "prod"},
            "id": {"@unknown": true}
        });

        let value = decode(&doc, &instance_type()).unwrap();
        assert_eq!(value.walk(&AttributePath::root().at_name("id")), Ok(&Value::Unknown));
        assert_eq!(
            value.walk(&AttributePath::root().at_name("zones")),
            Ok(&Value::set([Value::string("a"), Value::string("b")]))
        );
    }

    #[test]
    fn test_decode_missing_attributes_are_null() {
        let value = decode(&json!({"name": "web"}), &instance_type()).unwrap();
        assert_eq!(value.walk(&AttributePath::root().at_name("size")), Ok(&Value::Null));
    }

    #[test]
    fn test_decode_rejects_extra_attribute() {
        let result = decode(&json!({"colour": "red"}), &instance_type());
        assert!(matches!(result, Err(CodecError::UnexpectedAttribute { name, .. }) if name == "colour"));
    }

    #[test]
    fn test_decode_type_mismatch() {
        let result = decode(&json!({"size": "large"}), &instance_type());
        assert!(matches!(
            result,
            Err(CodecError::TypeMismatch { expected: "number", found: "string", .. })
        ));
    }

    #[test]
    fn test_encode_unknown_marker() {
        let value = Value::object([("id", Value::Unknown), ("name", Value::Null)]);
        assert_eq!(encode(&value), json!({"id": {"@unknown": true}, "name": null}));
    }

    #[test]
    fn test_decode_str_invalid_json() {
        assert!(matches!(
            decode_str("{not json", &Type::String),
            Err(CodecError::Json(_))
        ));
    }
}
