#![deny(missing_docs)]

//! # Full Resolution
//!
//! Substitutes every schema reference reachable from the operations by the
//! schema it points to, and named example references by their examples.
//!
//! With aggregation on, an `allOf` composition becomes a single object schema
//! holding the union of the branches' properties, required names and
//! extensions. Only the first composition keyword present is processed, in
//! the order `allOf`, `oneOf`, `anyOf`.
//!
//! Each named schema is resolved once; a reference met again while its own
//! resolution is still in progress stays a reference, which breaks cycles.

use crate::oas::models::{Example, MediaType, OpenApi, Parameter, PathItem, RefOr, Reference};
use crate::oas::ref_utils::extract_ref_name;
use crate::oas::schema::{AdditionalProperties, Composition, Schema, SchemaKind, SchemaType};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Inlines schema references reachable from the paths of a document.
#[derive(Debug)]
pub struct ResolverFully {
    aggregate_combinators: bool,
    schemas: IndexMap<String, RefOr<Schema>>,
    examples: IndexMap<String, RefOr<Example>>,
    resolved_models: HashMap<String, RefOr<Schema>>,
}

impl Default for ResolverFully {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResolverFully {
    /// Creates a resolver; `aggregate_combinators` merges `allOf` branches.
    pub fn new(aggregate_combinators: bool) -> Self {
        Self {
            aggregate_combinators,
            schemas: IndexMap::new(),
            examples: IndexMap::new(),
            resolved_models: HashMap::new(),
        }
    }

    /// Resolves every operation of every path item in place.
    pub fn resolve_fully(&mut self, openapi: &mut OpenApi) {
        self.schemas = openapi.components.schemas.clone();
        self.examples = openapi.components.examples.clone();
        self.resolved_models.clear();

        for (path, item) in openapi.paths.items.iter_mut() {
            tracing::trace!(%path, "fully resolving path item");
            self.resolve_path(item);
        }
    }

    fn resolve_path(&mut self, item: &mut PathItem) {
        for parameter in item.parameters.iter_mut() {
            if let RefOr::T(parameter) = parameter {
                self.resolve_parameter(parameter);
            }
        }

        for operation in item.operations_mut() {
            for parameter in operation.parameters.iter_mut() {
                if let RefOr::T(parameter) = parameter {
                    self.resolve_parameter(parameter);
                }
            }

            for callback in operation.callbacks.values_mut() {
                if let RefOr::T(callback) = callback {
                    for callback_item in callback.expressions.items.values_mut() {
                        self.resolve_path(callback_item);
                    }
                }
            }

            if let Some(RefOr::T(body)) = operation.request_body.as_mut() {
                self.resolve_content(&mut body.content);
            }

            for response in operation.responses.items.values_mut() {
                if let RefOr::T(response) = response {
                    self.resolve_content(&mut response.content);
                }
            }
        }
    }

    fn resolve_parameter(&mut self, parameter: &mut Parameter) {
        if let Some(schema) = parameter.schema.take() {
            parameter.schema = Some(self.resolve_schema(schema));
        }
        self.resolve_examples(&mut parameter.examples);
        self.resolve_content(&mut parameter.content);
    }

    fn resolve_content(&mut self, content: &mut IndexMap<String, MediaType>) {
        for media in content.values_mut() {
            if let Some(schema) = media.schema.take() {
                media.schema = Some(self.resolve_schema(schema));
            }
            self.resolve_examples(&mut media.examples);
        }
    }

    fn resolve_examples(&self, examples: &mut IndexMap<String, RefOr<Example>>) {
        for example in examples.values_mut() {
            let replacement = match example {
                RefOr::Ref(reference) => self
                    .examples
                    .get(&extract_ref_name(&reference.ref_location))
                    .cloned(),
                RefOr::T(_) => None,
            };
            if let Some(replacement) = replacement {
                *example = replacement;
            }
        }
    }

    fn resolve_schema(&mut self, schema: RefOr<Schema>) -> RefOr<Schema> {
        match schema {
            RefOr::Ref(reference) => self.resolve_reference(reference),
            RefOr::T(inline) => RefOr::T(self.resolve_inline(inline)),
        }
    }

    fn resolve_reference(&mut self, reference: Reference) -> RefOr<Schema> {
        let name = extract_ref_name(&reference.ref_location);
        if let Some(done) = self.resolved_models.get(&name) {
            return done.clone();
        }
        let Some(target) = self.schemas.get(&name).cloned() else {
            return RefOr::Ref(reference);
        };

        self.resolved_models
            .insert(name.clone(), RefOr::Ref(reference));
        let model = self.resolve_schema(target);
        self.resolved_models.insert(name, model.clone());
        model
    }

    fn resolve_inline(&mut self, mut schema: Schema) -> Schema {
        let kind = std::mem::take(&mut schema.kind);
        let mut schema = match kind {
            SchemaKind::Composed(composition)
                if self.aggregate_combinators && composition.all_of.is_some() =>
            {
                self.aggregate(schema, composition)
            }
            kind => {
                schema.kind = self.resolve_kind(kind);
                schema
            }
        };

        schema.additional_properties = match schema.additional_properties.take() {
            Some(AdditionalProperties::Schema(values)) => Some(AdditionalProperties::Schema(
                Box::new(self.resolve_schema(*values)),
            )),
            other => other,
        };
        schema.not = schema
            .not
            .take()
            .map(|not| Box::new(self.resolve_schema(*not)));
        schema
    }

    fn resolve_kind(&mut self, kind: SchemaKind) -> SchemaKind {
        match kind {
            SchemaKind::Array { items } => SchemaKind::Array {
                items: Box::new(self.resolve_schema(*items)),
            },
            SchemaKind::Object { properties } => SchemaKind::Object {
                properties: self.resolve_properties(properties),
            },
            SchemaKind::Composed(mut composition) => {
                if let Some(branches) = composition.all_of.take() {
                    composition.all_of = Some(self.resolve_branches(branches));
                } else if let Some(branches) = composition.one_of.take() {
                    composition.one_of = Some(self.resolve_branches(branches));
                } else if let Some(branches) = composition.any_of.take() {
                    composition.any_of = Some(self.resolve_branches(branches));
                }
                composition.properties = composition
                    .properties
                    .map(|properties| self.resolve_properties(properties));
                SchemaKind::Composed(composition)
            }
            SchemaKind::Leaf => SchemaKind::Leaf,
        }
    }

    fn resolve_branches(&mut self, branches: Vec<RefOr<Schema>>) -> Vec<RefOr<Schema>> {
        branches
            .into_iter()
            .map(|branch| self.resolve_schema(branch))
            .collect()
    }

    fn resolve_properties(
        &mut self,
        properties: IndexMap<String, RefOr<Schema>>,
    ) -> IndexMap<String, RefOr<Schema>> {
        properties
            .into_iter()
            .map(|(key, property)| (key, self.resolve_schema(property)))
            .collect()
    }

    /// Merges every `allOf` branch into one object schema.
    fn aggregate(&mut self, composed: Schema, composition: Composition) -> Schema {
        let mut extra: IndexMap<String, Value> = composed
            .extensions()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let mut required = composed.required;
        let mut properties = composition
            .properties
            .map(|own| self.resolve_properties(own))
            .unwrap_or_default();

        for branch in composition.all_of.unwrap_or_default() {
            let RefOr::T(resolved) = self.resolve_schema(branch) else {
                continue;
            };
            if let Some(branch_properties) = resolved.properties() {
                for (key, property) in branch_properties {
                    properties.insert(key.clone(), property.clone());
                }
            }
            for name in &resolved.required {
                if !required.contains(name) {
                    required.push(name.clone());
                }
            }
            for (key, value) in resolved.extensions() {
                extra.insert(key.clone(), value.clone());
            }
        }

        Schema {
            title: composed.title,
            description: composed.description,
            schema_type: Some(
                composed
                    .schema_type
                    .unwrap_or_else(|| SchemaType::single("object")),
            ),
            format: composed.format,
            required,
            additional_properties: composed.additional_properties,
            not: composed.not,
            example: composed.example,
            kind: SchemaKind::Object { properties },
            extra,
        }
    }
}
