//! Components pass: walks every entry of the nine registries.

use crate::error::AppResult;
use crate::oas::models::{
    Callback, Example, Header, Link, Parameter, RefOr, RequestBody, Response, SecurityScheme,
};
use crate::oas::ref_utils::internal_ref;
use crate::oas::schema::Schema;
use crate::resolver::external::{resolve_reference, Importable};
use crate::resolver::ResolveContext;

/// Runs the components pass.
pub fn process_components(ctx: &mut ResolveContext<'_, '_>) -> AppResult<()> {
    process_registry::<Schema>(ctx)?;
    process_registry::<Response>(ctx)?;
    process_registry::<Parameter>(ctx)?;
    process_registry::<Example>(ctx)?;
    process_registry::<RequestBody>(ctx)?;
    process_registry::<Header>(ctx)?;
    process_registry::<SecurityScheme>(ctx)?;
    process_registry::<Link>(ctx)?;
    process_registry::<Callback>(ctx)?;
    Ok(())
}

/// Walks the entries present when the pass starts. Entries imported during
/// the pass were already walked by the importer.
///
/// An entry that is itself an external reference becomes a local alias of the
/// imported target, unless the import landed under the entry's own name.
fn process_registry<T: Importable>(ctx: &mut ResolveContext<'_, '_>) -> AppResult<()> {
    let names: Vec<String> = T::registry(ctx.components).keys().cloned().collect();

    for name in names {
        let Some(original) = T::registry(ctx.components).get(&name).cloned() else {
            continue;
        };
        let mut entry = original.clone();
        match &mut entry {
            RefOr::Ref(reference) => resolve_reference::<T>(ctx, reference)?,
            RefOr::T(value) => T::walk(ctx, value)?,
        }

        if entry == original {
            continue;
        }
        if entry.ref_location() == Some(internal_ref(T::TYPE, &name).as_str()) {
            continue;
        }
        T::registry_mut(ctx.components).insert(name, entry);
    }
    Ok(())
}
