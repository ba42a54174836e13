//! Re-anchors the references found inside a value loaded from an external file
//! so that they resolve from the root document. Only `$ref` strings change.

use crate::oas::models::{
    Callback, Example, Header, Link, MediaType, Operation, Parameter, PathItem, RefOr, Reference,
    RequestBody, Response,
};
use crate::oas::ref_utils::rebase;
use crate::oas::schema::{AdditionalProperties, Schema, SchemaKind};
use indexmap::IndexMap;

/// Re-anchors a single reference.
pub fn rebase_reference(reference: &mut Reference, file: &str) {
    reference.ref_location = rebase(file, &reference.ref_location);
}

fn rebase_ref_or<T>(node: &mut RefOr<T>, file: &str, inline: fn(&mut T, &str)) {
    match node {
        RefOr::Ref(reference) => rebase_reference(reference, file),
        RefOr::T(value) => inline(value, file),
    }
}

fn rebase_schema_node(node: &mut RefOr<Schema>, file: &str) {
    rebase_ref_or(node, file, rebase_schema);
}

fn rebase_examples(examples: &mut IndexMap<String, RefOr<Example>>, file: &str) {
    for example in examples.values_mut() {
        if let RefOr::Ref(reference) = example {
            rebase_reference(reference, file);
        }
    }
}

fn rebase_content(content: &mut IndexMap<String, MediaType>, file: &str) {
    for media in content.values_mut() {
        rebase_media_type(media, file);
    }
}

/// Re-anchors every reference inside a schema tree.
pub fn rebase_schema(schema: &mut Schema, file: &str) {
    match &mut schema.kind {
        SchemaKind::Array { items } => rebase_schema_node(items, file),
        SchemaKind::Composed(composition) => {
            let branches = composition
                .all_of
                .iter_mut()
                .chain(composition.one_of.iter_mut())
                .chain(composition.any_of.iter_mut())
                .flatten();
            for branch in branches {
                rebase_schema_node(branch, file);
            }
            if let Some(properties) = composition.properties.as_mut() {
                properties
                    .values_mut()
                    .for_each(|p| rebase_schema_node(p, file));
            }
        }
        SchemaKind::Object { properties } => {
            properties
                .values_mut()
                .for_each(|p| rebase_schema_node(p, file));
        }
        SchemaKind::Leaf => {}
    }
    if let Some(AdditionalProperties::Schema(inner)) = schema.additional_properties.as_mut() {
        rebase_schema_node(inner, file);
    }
    if let Some(not) = schema.not.as_mut() {
        rebase_schema_node(not, file);
    }
}

/// Re-anchors the schema and examples of a media type.
pub fn rebase_media_type(media: &mut MediaType, file: &str) {
    if let Some(schema) = media.schema.as_mut() {
        rebase_schema_node(schema, file);
    }
    rebase_examples(&mut media.examples, file);
}

/// Re-anchors a parameter.
pub fn rebase_parameter(parameter: &mut Parameter, file: &str) {
    if let Some(schema) = parameter.schema.as_mut() {
        rebase_schema_node(schema, file);
    }
    rebase_examples(&mut parameter.examples, file);
    rebase_content(&mut parameter.content, file);
}

/// Re-anchors a header.
pub fn rebase_header(header: &mut Header, file: &str) {
    if let Some(schema) = header.schema.as_mut() {
        rebase_schema_node(schema, file);
    }
    rebase_examples(&mut header.examples, file);
    rebase_content(&mut header.content, file);
}

/// Re-anchors a request body.
pub fn rebase_request_body(body: &mut RequestBody, file: &str) {
    rebase_content(&mut body.content, file);
}

/// Re-anchors a link.
pub fn rebase_link(link: &mut Link, file: &str) {
    for header in link.headers.values_mut() {
        rebase_ref_or(header, file, rebase_header);
    }
}

/// Re-anchors a response.
pub fn rebase_response(response: &mut Response, file: &str) {
    for header in response.headers.values_mut() {
        rebase_ref_or(header, file, rebase_header);
    }
    rebase_content(&mut response.content, file);
    for link in response.links.values_mut() {
        rebase_ref_or(link, file, rebase_link);
    }
}

/// Re-anchors an operation.
pub fn rebase_operation(operation: &mut Operation, file: &str) {
    for parameter in operation.parameters.iter_mut() {
        rebase_ref_or(parameter, file, rebase_parameter);
    }
    if let Some(body) = operation.request_body.as_mut() {
        rebase_ref_or(body, file, rebase_request_body);
    }
    for response in operation.responses.items.values_mut() {
        rebase_ref_or(response, file, rebase_response);
    }
    for callback in operation.callbacks.values_mut() {
        rebase_ref_or(callback, file, rebase_callback);
    }
}

/// Re-anchors a path item, including its own `$ref`.
pub fn rebase_path_item(item: &mut PathItem, file: &str) {
    if let Some(reference) = item.reference.as_mut() {
        *reference = rebase(file, reference);
    }
    for parameter in item.parameters.iter_mut() {
        rebase_ref_or(parameter, file, rebase_parameter);
    }
    for operation in item.operations_mut() {
        rebase_operation(operation, file);
    }
}

/// Re-anchors the `$ref` sentinel and every path item of a callback.
pub fn rebase_callback(callback: &mut Callback, file: &str) {
    if let Some(reference) = callback.reference.as_mut() {
        *reference = rebase(file, reference);
    }
    for item in callback.expressions.items.values_mut() {
        rebase_path_item(item, file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rebase_path_item_rewrites_nested_refs() {
        let mut item: PathItem = serde_json::from_value(json!({
            "parameters": [ { "$ref": "#/components/parameters/Limit" } ],
            "get": {
                "responses": {
                    "200": {
                        "description": "ok",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "array",
                                    "items": { "$ref": "../models/pet.yaml#/Pet" }
                                }
                            }
                        }
                    }
                }
            }
        }))
        .unwrap();

        rebase_path_item(&mut item, "./paths/pets.yaml");

        assert_eq!(
            item.parameters[0].ref_location(),
            Some("./paths/pets.yaml#/components/parameters/Limit")
        );
        let response = item.get.as_ref().unwrap().responses.items["200"]
            .as_inline()
            .unwrap();
        let schema = response.content["application/json"]
            .schema
            .as_ref()
            .unwrap()
            .as_inline()
            .unwrap();
        match &schema.kind {
            SchemaKind::Array { items } => {
                assert_eq!(items.ref_location(), Some("./models/pet.yaml#/Pet"))
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_rebase_keeps_urls() {
        let mut schema: Schema = serde_json::from_value(json!({
            "allOf": [ { "$ref": "https://h/base.yaml#/Base" } ],
            "not": { "$ref": "#/Never" }
        }))
        .unwrap();
        rebase_schema(&mut schema, "./a.yaml");
        match &schema.kind {
            SchemaKind::Composed(c) => assert_eq!(
                c.all_of.as_ref().unwrap()[0].ref_location(),
                Some("https://h/base.yaml#/Base")
            ),
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(schema.not.unwrap().ref_location(), Some("./a.yaml#/Never"));
    }
}
