#![deny(missing_docs)]

//! # Inline Model Extraction
//!
//! Hoists anonymous object schemas (with at least one property) out of request
//! bodies, parameters, responses and component properties into named entries of
//! `components/schemas`, replacing each occurrence with a reference.
//!
//! Nested objects are hoisted before the object that contains them, so a
//! generated model only ever references other models. Structurally identical
//! models share one generated name unless matching is disabled.

use crate::oas::models::{OpenApi, Operation, RefOr};
use crate::oas::ref_utils::internal_ref;
use crate::oas::schema::{AdditionalProperties, Schema, SchemaKind};
use crate::oas::ComponentType;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

type Schemas = IndexMap<String, RefOr<Schema>>;

/// Flattens inline models into named schema components.
#[derive(Debug, Default)]
pub struct InlineModelResolver {
    skip_matches: bool,
    generated: HashMap<String, String>,
}

impl InlineModelResolver {
    /// Creates an extractor that deduplicates structurally identical models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables structural-duplicate matching: every inline model gets its own name.
    pub fn skip_matches(mut self, skip: bool) -> Self {
        self.skip_matches = skip;
        self
    }

    /// Runs the extraction over operations, then over existing schema components.
    pub fn flatten(&mut self, openapi: &mut OpenApi) {
        let OpenApi {
            paths, components, ..
        } = openapi;
        let schemas = &mut components.schemas;

        for (path, item) in paths.items.iter_mut() {
            for operation in item.operations_mut() {
                self.flatten_operation(path, operation, schemas);
            }
        }
        self.flatten_components(schemas);
    }

    fn flatten_operation(&mut self, path: &str, operation: &mut Operation, schemas: &mut Schemas) {
        if let Some(RefOr::T(body)) = operation.request_body.as_mut() {
            for media in body.content.values_mut() {
                if let Some(schema) = media.schema.as_mut() {
                    self.flatten_site(schema, "body", Some(path), schemas);
                }
            }
        }

        for parameter in operation.parameters.iter_mut() {
            if let RefOr::T(parameter) = parameter {
                if let Some(schema) = parameter.schema.as_mut() {
                    self.flatten_site(schema, &parameter.name, Some(path), schemas);
                }
            }
        }

        for (status, response) in operation.responses.items.iter_mut() {
            let RefOr::T(response) = response else {
                continue;
            };
            let key = format!("inline_response_{}", status);
            for media in response.content.values_mut() {
                if let Some(schema) = media.schema.as_mut() {
                    self.flatten_site(schema, &key, Some(path), schemas);
                }
            }
        }
    }

    fn flatten_components(&mut self, schemas: &mut Schemas) {
        let names: Vec<String> = schemas.keys().cloned().collect();

        for name in names {
            let Some(RefOr::T(mut model)) = schemas.get(&name).cloned() else {
                continue;
            };
            match &mut model.kind {
                SchemaKind::Object { properties } => {
                    self.flatten_properties(properties, &name, schemas);
                }
                SchemaKind::Array { items } => {
                    self.hoist_nested(items, &format!("{}_inner", name), None, schemas);
                }
                SchemaKind::Composed(composition) => {
                    let branches = composition
                        .all_of
                        .as_mut()
                        .or(composition.any_of.as_mut())
                        .or(composition.one_of.as_mut());
                    for branch in branches.into_iter().flatten() {
                        if let Some(properties) =
                            branch.as_inline_mut().and_then(Schema::properties_mut)
                        {
                            self.flatten_properties(properties, &name, schemas);
                        }
                    }
                }
                SchemaKind::Leaf => {}
            }
            fix_string_model(&mut model);
            schemas.insert(name, RefOr::T(model));
        }
    }

    fn flatten_properties(
        &mut self,
        properties: &mut IndexMap<String, RefOr<Schema>>,
        path: &str,
        schemas: &mut Schemas,
    ) {
        for (key, property) in properties.iter_mut() {
            let property_key = format!("{}_{}", path, key);
            self.flatten_site(property, &property_key, None, schemas);
        }
    }

    /// Replaces an inline model at `slot`, or the inline item/value model of
    /// an array or map schema, with a reference to a generated component.
    fn flatten_site(
        &mut self,
        slot: &mut RefOr<Schema>,
        key: &str,
        context: Option<&str>,
        schemas: &mut Schemas,
    ) {
        let RefOr::T(schema) = slot else {
            return;
        };

        if is_inline_model(schema) {
            let model = std::mem::take(schema);
            let name = self.hoist(model, key, context, schemas);
            *slot = schema_ref(&name);
            return;
        }

        match &mut schema.kind {
            SchemaKind::Array { items } => self.hoist_nested(items, key, context, schemas),
            _ => {
                if let Some(AdditionalProperties::Schema(values)) =
                    schema.additional_properties.as_mut()
                {
                    self.hoist_nested(values, key, context, schemas);
                }
            }
        }
    }

    fn hoist_nested(
        &mut self,
        slot: &mut RefOr<Schema>,
        key: &str,
        context: Option<&str>,
        schemas: &mut Schemas,
    ) {
        if let RefOr::T(inner) = slot {
            if is_inline_model(inner) {
                let model = std::mem::take(inner);
                let name = self.hoist(model, key, context, schemas);
                *slot = schema_ref(&name);
            }
        }
    }

    fn hoist(
        &mut self,
        mut model: Schema,
        key: &str,
        context: Option<&str>,
        schemas: &mut Schemas,
    ) -> String {
        let base = model.title.clone().unwrap_or_else(|| key.to_string());
        let prefix = context.unwrap_or(&base).to_string();
        if let Some(properties) = model.properties_mut() {
            self.flatten_properties(properties, &prefix, schemas);
        }

        let signature = serde_json::to_string(&model).ok();
        if !self.skip_matches {
            if let Some(existing) = signature.as_ref().and_then(|s| self.generated.get(s)) {
                tracing::debug!(name = %existing, "reusing structurally identical model");
                return existing.clone();
            }
        }

        let name = unique_name(&base, schemas);
        tracing::debug!(%name, "extracted inline model");
        if let Some(signature) = signature {
            self.generated.entry(signature).or_insert_with(|| name.clone());
        }
        schemas.insert(name.clone(), RefOr::T(model));
        name
    }
}

fn is_inline_model(schema: &Schema) -> bool {
    matches!(&schema.kind, SchemaKind::Object { properties } if !properties.is_empty())
        && schema.is_type_or_untyped("object")
}

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::new_ref(internal_ref(ComponentType::Schemas, name))
}

/// Strips characters outside `[A-Za-z0-9_. ]`, then appends `_1`, `_2`, ...
/// until the name is free.
fn unique_name(key: &str, schemas: &Schemas) -> String {
    static UNSAFE_RE: OnceLock<Regex> = OnceLock::new();
    let unsafe_re =
        UNSAFE_RE.get_or_init(|| Regex::new(r"[^a-z_\.A-Z0-9 ]").expect("Invalid regex"));

    let sanitized = unsafe_re.replace_all(key, "").into_owned();
    let base = if sanitized.is_empty() {
        "inline_object".to_string()
    } else {
        sanitized
    };

    let mut name = base.clone();
    let mut count = 0;
    while schemas.contains_key(&name) {
        count += 1;
        name = format!("{}_{}", base, count);
    }
    name
}

/// String models whose example is wrapped in literal quotes lose the quotes.
fn fix_string_model(model: &mut Schema) {
    let is_string = model
        .schema_type
        .as_ref()
        .is_some_and(|t| t.contains("string"));
    if !is_string {
        return;
    }
    if let Some(Value::String(example)) = model.example.as_mut() {
        if example.len() >= 2 && example.starts_with('"') && example.ends_with('"') {
            *example = example[1..example.len() - 1].to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(yaml: &str) -> OpenApi {
        OpenApi::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_unique_name_sanitizes_and_suffixes() {
        let mut schemas = Schemas::new();
        assert_eq!(unique_name("/pets_{id}", &schemas), "pets_id");
        schemas.insert("body".into(), RefOr::T(Schema::default()));
        schemas.insert("body_1".into(), RefOr::T(Schema::default()));
        assert_eq!(unique_name("body", &schemas), "body_2");
        assert_eq!(unique_name("{}", &schemas), "inline_object");
    }

    #[test]
    fn test_fix_string_model() {
        let mut model = Schema::of_type("string");
        model.example = Some(Value::String("\"quoted\"".into()));
        fix_string_model(&mut model);
        assert_eq!(model.example, Some(Value::String("quoted".into())));
    }

    #[test]
    fn test_body_with_nested_object() {
        let mut openapi = doc(r#"
openapi: 3.0.0
paths:
  /pets:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name:
                  type: string
                owner:
                  type: object
                  properties:
                    id:
                      type: integer
      responses:
        "200":
          description: ok
"#);
        InlineModelResolver::new().flatten(&mut openapi);

        let names: Vec<&str> = openapi
            .components
            .schemas
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["pets_owner", "body"]);

        let body = openapi.components.schemas["body"].as_inline().unwrap();
        assert_eq!(
            body.properties().unwrap()["owner"].ref_location(),
            Some("#/components/schemas/pets_owner")
        );
    }

    #[test]
    fn test_response_array_items_hoisted() {
        let mut openapi = doc(r#"
openapi: 3.0.0
paths:
  /pets:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items:
                  type: object
                  properties:
                    id:
                      type: integer
"#);
        InlineModelResolver::new().flatten(&mut openapi);
        assert!(openapi
            .components
            .schemas
            .contains_key("inline_response_200"));
    }

    #[test]
    fn test_skip_matches_keeps_duplicates_apart() {
        let yaml = r#"
openapi: 3.0.0
paths:
  /a:
    post:
      requestBody:
        content:
          application/json:
            schema:
              properties:
                id:
                  type: integer
  /b:
    post:
      requestBody:
        content:
          application/json:
            schema:
              properties:
                id:
                  type: integer
"#;
        let mut matched = doc(yaml);
        InlineModelResolver::new().flatten(&mut matched);
        assert_eq!(matched.components.schemas.len(), 1);

        let mut unmatched = doc(yaml);
        InlineModelResolver::new()
            .skip_matches(true)
            .flatten(&mut unmatched);
        let names: Vec<&str> = unmatched
            .components
            .schemas
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["body", "body_1"]);
    }

    #[test]
    fn test_component_properties_and_array_items() {
        let mut openapi = doc(r#"
openapi: 3.0.0
components:
  schemas:
    Pet:
      type: object
      properties:
        address:
          title: Address
          type: object
          properties:
            street:
              type: string
    Pets:
      type: array
      items:
        type: object
        properties:
          id:
            type: integer
"#);
        InlineModelResolver::new().flatten(&mut openapi);

        let schemas = &openapi.components.schemas;
        assert!(schemas.contains_key("Address"));
        assert!(schemas.contains_key("Pets_inner"));
        assert_eq!(
            schemas["Pet"].as_inline().unwrap().properties().unwrap()["address"].ref_location(),
            Some("#/components/schemas/Address")
        );
    }
}
