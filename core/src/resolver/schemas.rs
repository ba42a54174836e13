//! Schema walker.

use crate::error::AppResult;
use crate::oas::models::RefOr;
use crate::oas::schema::{AdditionalProperties, Schema, SchemaKind};
use crate::resolver::external::resolve_reference;
use crate::resolver::ResolveContext;

/// Resolves a schema node: imports it when it is an external reference,
/// otherwise walks its structure.
pub fn process_schema(
    ctx: &mut ResolveContext<'_, '_>,
    schema: &mut RefOr<Schema>,
) -> AppResult<()> {
    match schema {
        RefOr::Ref(reference) => resolve_reference::<Schema>(ctx, reference),
        RefOr::T(inline) => process_schema_inline(ctx, inline),
    }
}

/// Walks every nested schema position: array items, composition branches,
/// properties, `additionalProperties` and `not`.
pub fn process_schema_inline(
    ctx: &mut ResolveContext<'_, '_>,
    schema: &mut Schema,
) -> AppResult<()> {
    match &mut schema.kind {
        SchemaKind::Array { items } => process_schema(ctx, items)?,
        SchemaKind::Composed(composition) => {
            let branches = composition
                .all_of
                .iter_mut()
                .chain(composition.one_of.iter_mut())
                .chain(composition.any_of.iter_mut())
                .flatten();
            for branch in branches {
                process_schema(ctx, branch)?;
            }
            if let Some(properties) = composition.properties.as_mut() {
                for property in properties.values_mut() {
                    process_schema(ctx, property)?;
                }
            }
        }
        SchemaKind::Object { properties } => {
            for property in properties.values_mut() {
                process_schema(ctx, property)?;
            }
        }
        SchemaKind::Leaf => {}
    }

    if let Some(AdditionalProperties::Schema(inner)) = schema.additional_properties.as_mut() {
        process_schema(ctx, inner)?;
    }
    if let Some(not) = schema.not.as_mut() {
        process_schema(ctx, not)?;
    }
    Ok(())
}
