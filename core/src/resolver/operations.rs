//! Operation and callback walkers.

use crate::error::AppResult;
use crate::oas::models::{Callback, Operation, PathItem, RefOr, Reference};
use crate::resolver::body::process_request_body;
use crate::resolver::external::resolve_reference;
use crate::resolver::params::{merge_parameters, process_parameter};
use crate::resolver::paths::resolve_path_item_ref;
use crate::resolver::responses::process_response;
use crate::resolver::ResolveContext;

/// Walks an operation: merged parameters, request body, responses, callbacks.
pub fn process_operation(
    ctx: &mut ResolveContext<'_, '_>,
    operation: &mut Operation,
) -> AppResult<()> {
    let parameters = std::mem::take(&mut operation.parameters);
    operation.parameters = merge_parameters(ctx, parameters)?;
    walk_operation(ctx, operation)
}

/// Walks an operation whose parameter list is already merged.
pub fn walk_operation(
    ctx: &mut ResolveContext<'_, '_>,
    operation: &mut Operation,
) -> AppResult<()> {
    for parameter in operation.parameters.iter_mut() {
        process_parameter(ctx, parameter)?;
    }

    if let Some(body) = operation.request_body.as_mut() {
        process_request_body(ctx, body)?;
    }

    for response in operation.responses.items.values_mut() {
        process_response(ctx, response)?;
    }

    for callback in operation.callbacks.values_mut() {
        process_callback(ctx, callback)?;
    }
    Ok(())
}

/// Resolves a callback node.
pub fn process_callback(
    ctx: &mut ResolveContext<'_, '_>,
    callback: &mut RefOr<Callback>,
) -> AppResult<()> {
    match callback {
        RefOr::Ref(reference) => resolve_reference::<Callback>(ctx, reference),
        RefOr::T(inline) => process_callback_inline(ctx, inline),
    }
}

/// Imports the `$ref` sentinel of an inline callback, then walks every path
/// item of the callback.
///
/// Local references are never dereferenced, so a callback whose operations
/// point back at the callback itself does not recurse.
pub fn process_callback_inline(
    ctx: &mut ResolveContext<'_, '_>,
    callback: &mut Callback,
) -> AppResult<()> {
    if let Some(location) = callback.reference.take() {
        let mut sentinel = Reference::new(location);
        resolve_reference::<Callback>(ctx, &mut sentinel)?;
        callback.reference = Some(sentinel.ref_location);
    }
    for item in callback.expressions.items.values_mut() {
        process_callback_path_item(ctx, item)?;
    }
    Ok(())
}

fn process_callback_path_item(
    ctx: &mut ResolveContext<'_, '_>,
    item: &mut PathItem,
) -> AppResult<()> {
    resolve_path_item_ref(ctx, item, None)?;
    for parameter in item.parameters.iter_mut() {
        process_parameter(ctx, parameter)?;
    }
    for operation in item.operations_mut() {
        process_operation(ctx, operation)?;
    }
    Ok(())
}
