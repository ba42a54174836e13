#![deny(missing_docs)]

//! # Paths Pass
//!
//! For every path item, in document order:
//!
//! 1. Substitute a path-item `$ref` (external file, or `#/paths/...` within
//!    the document).
//! 2. Merge and walk the shared parameters.
//! 3. Merge each operation's own parameters, then distribute the shared ones
//!    it does not declare (when enabled).
//! 4. Walk each operation.

use crate::error::AppResult;
use crate::oas::models::{PathItem, Paths, RefOr};
use crate::oas::ref_utils::{classify, decode_pointer_segment, document_part, RefFormat};
use crate::resolver::operations::walk_operation;
use crate::resolver::params::{
    add_shared_parameters_to_operations, merge_parameters, process_parameter,
};
use crate::resolver::rebase::rebase_path_item;
use crate::resolver::ResolveContext;

/// Runs the paths pass.
pub fn process_paths(ctx: &mut ResolveContext<'_, '_>, paths: &mut Paths) -> AppResult<()> {
    let has_local_refs = paths.items.values().any(|item| {
        item.reference
            .as_deref()
            .is_some_and(|r| classify(r) == RefFormat::Internal)
    });
    let snapshot = has_local_refs.then(|| paths.clone());

    for (path, item) in paths.items.iter_mut() {
        tracing::trace!(%path, "resolving path item");
        resolve_path_item_ref(ctx, item, snapshot.as_ref())?;

        let shared = std::mem::take(&mut item.parameters);
        item.parameters = merge_parameters(ctx, shared)?;
        for parameter in item.parameters.iter_mut() {
            process_parameter(ctx, parameter)?;
        }
        for operation in item.operations_mut() {
            let own = std::mem::take(&mut operation.parameters);
            operation.parameters = merge_parameters(ctx, own)?;
        }
        add_shared_parameters_to_operations(ctx, item);

        for operation in item.operations_mut() {
            walk_operation(ctx, operation)?;
        }
    }
    Ok(())
}

/// Replaces a path item that carries a `$ref` by its target.
///
/// External targets are re-anchored onto their file. Local `#/paths/...`
/// targets are taken from `local_paths` when given. Unresolvable references
/// are logged and left in place.
pub fn resolve_path_item_ref(
    ctx: &mut ResolveContext<'_, '_>,
    item: &mut PathItem,
    local_paths: Option<&Paths>,
) -> AppResult<()> {
    let Some(reference) = item.reference.clone() else {
        return Ok(());
    };

    let resolved = match classify(&reference) {
        RefFormat::Internal => local_paths.and_then(|paths| lookup_local(paths, &reference)),
        format => match ctx.cache.load_reference::<PathItem>(&reference, format)? {
            Some(RefOr::T(mut target)) => {
                rebase_path_item(&mut target, document_part(&reference));
                Some(target)
            }
            Some(RefOr::Ref(_)) | None => None,
        },
    };

    match resolved {
        Some(target) => *item = target,
        None => tracing::warn!(%reference, "unresolvable path item reference left in place"),
    }
    Ok(())
}

fn lookup_local(paths: &Paths, reference: &str) -> Option<PathItem> {
    let key = reference.strip_prefix("#/paths/")?;
    let target = paths.items.get(&decode_pointer_segment(key))?;
    // A target that is itself a reference would only chain back here.
    target.reference.is_none().then(|| target.clone())
}
