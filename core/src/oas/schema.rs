#![deny(missing_docs)]

//! # Schema Model
//!
//! A schema is classified once, at load time, into one of four shapes:
//!
//! - **Composed**: carries `allOf`, `oneOf` or `anyOf`.
//! - **Array**: carries `items`.
//! - **Object**: carries `properties`.
//! - **Leaf**: everything else (scalars, free-form objects, maps).
//!
//! Attributes common to every shape live on [`Schema`] itself; unknown keywords
//! are kept in `extra` and written back untouched.

use crate::oas::models::RefOr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `type` keyword: a single name (OAS 3.0) or a list (OAS 3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `type: object`
    Single(String),
    /// `type: [string, "null"]`
    Multiple(Vec<String>),
}

impl SchemaType {
    /// Builds a single-name type.
    pub fn single(name: &str) -> Self {
        SchemaType::Single(name.to_string())
    }

    /// True when `name` is (one of) the declared type(s).
    pub fn contains(&self, name: &str) -> bool {
        match self {
            SchemaType::Single(single) => single == name,
            SchemaType::Multiple(many) => many.iter().any(|t| t == name),
        }
    }
}

/// `additionalProperties`: a flag or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `additionalProperties: true|false`
    Allowed(bool),
    /// `additionalProperties: { ... }`
    Schema(Box<RefOr<Schema>>),
}

/// Composition keywords of a composed schema.
///
/// Each list keeps its presence so that `allOf: []` survives a round trip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composition {
    /// `allOf` branches.
    pub all_of: Option<Vec<RefOr<Schema>>>,
    /// `oneOf` branches.
    pub one_of: Option<Vec<RefOr<Schema>>>,
    /// `anyOf` branches.
    pub any_of: Option<Vec<RefOr<Schema>>>,
    /// Properties declared next to the composition.
    pub properties: Option<IndexMap<String, RefOr<Schema>>>,
}

/// Shape of a schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaKind {
    /// Array with its item schema.
    Array {
        /// `items`
        items: Box<RefOr<Schema>>,
    },
    /// `allOf` / `oneOf` / `anyOf`.
    Composed(Composition),
    /// Object with declared properties.
    Object {
        /// `properties`
        properties: IndexMap<String, RefOr<Schema>>,
    },
    /// Any other schema.
    #[default]
    Leaf,
}

/// A Schema Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawSchema", into = "RawSchema")]
pub struct Schema {
    /// `title`
    pub title: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `type`
    pub schema_type: Option<SchemaType>,
    /// `format`
    pub format: Option<String>,
    /// `required` property names.
    pub required: Vec<String>,
    /// `additionalProperties`
    pub additional_properties: Option<AdditionalProperties>,
    /// `not`
    pub not: Option<Box<RefOr<Schema>>>,
    /// `example`
    pub example: Option<Value>,
    /// Shape-specific keywords.
    pub kind: SchemaKind,
    /// Every other keyword (`enum`, `nullable`, `x-...`).
    pub extra: IndexMap<String, Value>,
}

impl Schema {
    /// An object schema with the given properties.
    pub fn object(properties: IndexMap<String, RefOr<Schema>>) -> Self {
        Self {
            schema_type: Some(SchemaType::single("object")),
            kind: SchemaKind::Object { properties },
            ..Default::default()
        }
    }

    /// An array schema over `items`.
    pub fn array(items: RefOr<Schema>) -> Self {
        Self {
            schema_type: Some(SchemaType::single("array")),
            kind: SchemaKind::Array {
                items: Box::new(items),
            },
            ..Default::default()
        }
    }

    /// A scalar schema of the given type.
    pub fn of_type(name: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::single(name)),
            ..Default::default()
        }
    }

    /// True when the type is absent or includes `name`.
    pub fn is_type_or_untyped(&self, name: &str) -> bool {
        self.schema_type
            .as_ref()
            .map_or(true, |t| t.contains(name))
    }

    /// Declared properties (object or composed shapes).
    pub fn properties(&self) -> Option<&IndexMap<String, RefOr<Schema>>> {
        match &self.kind {
            SchemaKind::Object { properties } => Some(properties),
            SchemaKind::Composed(composition) => composition.properties.as_ref(),
            _ => None,
        }
    }

    /// Declared properties, mutably.
    pub fn properties_mut(&mut self) -> Option<&mut IndexMap<String, RefOr<Schema>>> {
        match &mut self.kind {
            SchemaKind::Object { properties } => Some(properties),
            SchemaKind::Composed(composition) => composition.properties.as_mut(),
            _ => None,
        }
    }

    /// Vendor extensions (`x-...`).
    pub fn extensions(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.extra.iter().filter(|(key, _)| key.starts_with("x-"))
    }
}

/// Wire form of a schema; every keyword the model knows is optional here.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<IndexMap<String, RefOr<Schema>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<RefOr<Schema>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all_of: Option<Vec<RefOr<Schema>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    one_of: Option<Vec<RefOr<Schema>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    any_of: Option<Vec<RefOr<Schema>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not: Option<Box<RefOr<Schema>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    example: Option<Value>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

impl From<RawSchema> for Schema {
    fn from(raw: RawSchema) -> Self {
        let mut extra = raw.extra;
        let composed = raw.all_of.is_some() || raw.one_of.is_some() || raw.any_of.is_some();

        let kind = if composed {
            SchemaKind::Composed(Composition {
                all_of: raw.all_of,
                one_of: raw.one_of,
                any_of: raw.any_of,
                properties: raw.properties,
            })
        } else if let Some(items) = raw.items {
            // Properties on an array are meaningless but kept verbatim.
            if let Some(properties) = raw.properties {
                if let Ok(value) = serde_json::to_value(properties) {
                    extra.insert("properties".to_string(), value);
                }
            }
            SchemaKind::Array { items }
        } else if let Some(properties) = raw.properties {
            SchemaKind::Object { properties }
        } else {
            SchemaKind::Leaf
        };

        Self {
            title: raw.title,
            description: raw.description,
            schema_type: raw.schema_type,
            format: raw.format,
            required: raw.required,
            additional_properties: raw.additional_properties,
            not: raw.not,
            example: raw.example,
            kind,
            extra,
        }
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        let mut raw = RawSchema {
            title: schema.title,
            description: schema.description,
            schema_type: schema.schema_type,
            format: schema.format,
            required: schema.required,
            additional_properties: schema.additional_properties,
            not: schema.not,
            example: schema.example,
            extra: schema.extra,
            ..Default::default()
        };

        match schema.kind {
            SchemaKind::Array { items } => raw.items = Some(items),
            SchemaKind::Composed(composition) => {
                raw.all_of = composition.all_of;
                raw.one_of = composition.one_of;
                raw.any_of = composition.any_of;
                raw.properties = composition.properties;
            }
            SchemaKind::Object { properties } => raw.properties = Some(properties),
            SchemaKind::Leaf => {}
        }

        raw
    }
}
