//! Request body, media type and example walkers.

use crate::error::AppResult;
use crate::oas::models::{Example, MediaType, RefOr, RequestBody};
use crate::resolver::external::resolve_reference;
use crate::resolver::schemas::process_schema;
use crate::resolver::ResolveContext;
use indexmap::IndexMap;

/// Resolves a request body node.
pub fn process_request_body(
    ctx: &mut ResolveContext<'_, '_>,
    body: &mut RefOr<RequestBody>,
) -> AppResult<()> {
    match body {
        RefOr::Ref(reference) => resolve_reference::<RequestBody>(ctx, reference),
        RefOr::T(inline) => process_request_body_inline(ctx, inline),
    }
}

/// Walks the content of an inline request body.
pub fn process_request_body_inline(
    ctx: &mut ResolveContext<'_, '_>,
    body: &mut RequestBody,
) -> AppResult<()> {
    process_content(ctx, &mut body.content)
}

/// Walks every media type of a content map.
pub fn process_content(
    ctx: &mut ResolveContext<'_, '_>,
    content: &mut IndexMap<String, MediaType>,
) -> AppResult<()> {
    for media in content.values_mut() {
        process_media_type(ctx, media)?;
    }
    Ok(())
}

/// Walks the schema and named examples of a media type.
pub fn process_media_type(
    ctx: &mut ResolveContext<'_, '_>,
    media: &mut MediaType,
) -> AppResult<()> {
    if let Some(schema) = media.schema.as_mut() {
        process_schema(ctx, schema)?;
    }
    process_examples(ctx, &mut media.examples)
}

/// Imports externally referenced examples.
pub fn process_examples(
    ctx: &mut ResolveContext<'_, '_>,
    examples: &mut IndexMap<String, RefOr<Example>>,
) -> AppResult<()> {
    for example in examples.values_mut() {
        if let RefOr::Ref(reference) = example {
            resolve_reference::<Example>(ctx, reference)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::models::Components;
    use crate::resolver::{MemoryLoader, ResolverCache, ResolverSettings};
    use serde_json::json;

    #[test]
    fn test_request_body_ref_and_content() {
        let loader = MemoryLoader::new()
            .with(
                "bodies.yaml",
                concat!(
                    "NewPet:\n",
                    "  content:\n",
                    "    application/json:\n",
                    "      schema:\n",
                    "        $ref: './pet.yaml#/Pet'\n",
                ),
            )
            .with("pet.yaml", "Pet:\n  type: object\n")
            .with("examples.yaml", "cat:\n  value:\n    name: Tom\n");
        let mut components = Components::default();
        let mut ctx = ResolveContext::new(
            &mut components,
            ResolverCache::new(&loader, vec![], None),
            ResolverSettings::default(),
        );

        let mut by_ref = RefOr::new_ref("./bodies.yaml#/NewPet");
        process_request_body(&mut ctx, &mut by_ref).unwrap();
        assert_eq!(
            by_ref.ref_location(),
            Some("#/components/requestBodies/NewPet")
        );

        let mut inline: RefOr<RequestBody> = serde_json::from_value(json!({
            "content": {
                "application/json": {
                    "examples": { "cat": { "$ref": "./examples.yaml#/cat" } }
                }
            }
        }))
        .unwrap();
        process_request_body(&mut ctx, &mut inline).unwrap();
        let media = &inline.as_inline().unwrap().content["application/json"];
        assert_eq!(
            media.examples["cat"].ref_location(),
            Some("#/components/examples/cat")
        );

        let imported = components.request_bodies["NewPet"].as_inline().unwrap();
        let schema = imported.content["application/json"].schema.as_ref().unwrap();
        assert_eq!(schema.ref_location(), Some("#/components/schemas/Pet"));
        assert!(components.schemas.contains_key("Pet"));
    }
}
