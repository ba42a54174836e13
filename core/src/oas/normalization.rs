#![deny(missing_docs)]

//! # Document Normalization
//!
//! Raw JSON rewrites applied to every loaded document (root or external) before
//! it is deserialized into the typed model.

use serde_json::{json, Map, Value};

/// Normalizes boolean schemas (`true` / `false`) found in well-known schema
/// positions of a whole document.
///
/// - `true` becomes `{}` (accepts any instance)
/// - `false` becomes an unsatisfiable object schema
pub(crate) fn normalize_boolean_schemas(value: &mut Value) {
    if let Some(schemas) = value
        .get_mut("components")
        .and_then(|c| c.get_mut("schemas"))
        .and_then(|s| s.as_object_mut())
    {
        for schema in schemas.values_mut() {
            normalize_schema_node(schema);
        }
    }

    normalize_schema_fields(value);
}

/// Normalizes a value that is itself a schema (e.g. a fragment loaded from a
/// bare schema file).
pub(crate) fn normalize_schema_node(value: &mut Value) {
    match value {
        Value::Bool(flag) => {
            *value = bool_schema_replacement(*flag);
        }
        Value::Object(map) => {
            for key in ["properties", "patternProperties", "dependentSchemas"] {
                if let Some(nested) = map.get_mut(key).and_then(|v| v.as_object_mut()) {
                    nested.values_mut().for_each(normalize_schema_node);
                }
            }
            for key in ["allOf", "anyOf", "oneOf", "prefixItems"] {
                if let Some(branches) = map.get_mut(key).and_then(|v| v.as_array_mut()) {
                    branches.iter_mut().for_each(normalize_schema_node);
                }
            }
            for key in ["items", "not", "contains", "propertyNames", "if", "then", "else"] {
                if let Some(nested) = map.get_mut(key) {
                    normalize_schema_node(nested);
                }
            }
            // `additionalProperties: false` is meaningful as-is.
            if let Some(additional) = map.get_mut("additionalProperties") {
                if !additional.is_boolean() {
                    normalize_schema_node(additional);
                }
            }
        }
        _ => {}
    }
}

fn normalize_schema_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                match key.as_str() {
                    "schema" | "itemSchema" | "contentSchema" => normalize_schema_node(v),
                    _ => normalize_schema_fields(v),
                }
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                normalize_schema_fields(v);
            }
        }
        _ => {}
    }
}

fn bool_schema_replacement(flag: bool) -> Value {
    if flag {
        Value::Object(Map::new())
    } else {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["__never__"]
        })
    }
}
