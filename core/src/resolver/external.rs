#![deny(missing_docs)]

//! # External Importer
//!
//! Copies the target of an external `$ref` into the matching component
//! registry and returns the local name it was stored under.
//!
//! Naming: the candidate is the last pointer segment (or the file stem). An
//! occupied slot is shared when it already holds a structurally equal value,
//! taken over when it only holds a dangling pointer from the input document,
//! and otherwise skipped in favour of `Name_1`, `Name_2`, ...
//!
//! The name is recorded before the imported value is walked, so a target that
//! refers back to itself (directly or through other files) resolves to the
//! name already being imported.

use crate::error::AppResult;
use crate::oas::models::{
    Callback, Component, Example, Header, Link, Parameter, RefOr, Reference, RequestBody,
    Response, SecurityScheme,
};
use crate::oas::ref_utils::{
    classify, compute_definition_name, document_part, internal_ref, RefFormat,
};
use crate::oas::schema::Schema;
use crate::resolver::{body, operations, params, rebase, responses, schemas, ResolveContext};

/// A component kind the importer can walk after loading it.
pub trait Importable: Component {
    /// Re-bases every reference inside an imported value onto `file`.
    fn rebase(&mut self, file: &str);

    /// Resolves the external references nested inside an imported value.
    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()>;
}

/// Imports the target of an external reference.
///
/// Returns the local name, or `None` when the target could not be loaded (the
/// caller then leaves the reference untouched).
pub fn import_external<T: Importable>(
    ctx: &mut ResolveContext<'_, '_>,
    reference: &str,
    format: RefFormat,
) -> AppResult<Option<String>> {
    if let Some(name) = ctx.cache.assigned_name(reference) {
        return Ok(Some(name.to_string()));
    }

    let target = ctx.cache.target_key(reference, format);
    if let Some(name) = ctx.cache.target_name(T::TYPE, &target) {
        let name = name.to_string();
        ctx.cache.assign_name(reference, &name);
        return Ok(Some(name));
    }

    let Some(mut loaded) = ctx.cache.load_reference::<T>(reference, format)? else {
        tracing::warn!(
            reference,
            kind = T::TYPE.section(),
            "unresolvable reference left in place"
        );
        return Ok(None);
    };

    let file = document_part(reference);
    match &mut loaded {
        RefOr::Ref(chained) => rebase::rebase_reference(chained, file),
        RefOr::T(value) => value.rebase(file),
    }

    let candidate = compute_definition_name(reference);
    let (name, vacant) = allocate_slot(ctx, &candidate, &loaded);
    ctx.cache.assign_name(reference, &name);
    ctx.cache.assign_target(T::TYPE, target, &name);
    if !vacant {
        tracing::debug!(reference, %name, "sharing existing component");
        return Ok(Some(name));
    }

    tracing::debug!(reference, kind = T::TYPE.section(), %name, "importing external component");
    T::registry_mut(ctx.components).insert(name.clone(), loaded.clone());
    ctx.cache.mark_used(T::TYPE, &name);

    match &mut loaded {
        RefOr::Ref(chained) => resolve_reference::<T>(ctx, chained)?,
        RefOr::T(value) => T::walk(ctx, value)?,
    }

    T::registry_mut(ctx.components).insert(name.clone(), loaded);
    Ok(Some(name))
}

/// Rewrites an external reference to the local name of its imported target.
///
/// Internal references and unresolvable targets are left as they are.
pub fn resolve_reference<T: Importable>(
    ctx: &mut ResolveContext<'_, '_>,
    reference: &mut Reference,
) -> AppResult<()> {
    let format = classify(&reference.ref_location);
    if !format.is_external() {
        return Ok(());
    }
    let location = reference.ref_location.clone();
    if let Some(name) = import_external::<T>(ctx, &location, format)? {
        reference.ref_location = internal_ref(T::TYPE, &name);
    }
    Ok(())
}

fn allocate_slot<T: Component>(
    ctx: &ResolveContext<'_, '_>,
    candidate: &str,
    loaded: &RefOr<T>,
) -> (String, bool) {
    let registry = T::registry(ctx.components);
    let mut name = candidate.to_string();
    let mut suffix = 0;

    loop {
        match registry.get(&name) {
            None => return (name, true),
            Some(existing) if existing == loaded => return (name, false),
            Some(RefOr::Ref(_)) if !ctx.cache.is_used(T::TYPE, &name) => return (name, true),
            Some(_) => {
                suffix += 1;
                name = format!("{}_{}", candidate, suffix);
            }
        }
    }
}

impl Importable for Schema {
    fn rebase(&mut self, file: &str) {
        rebase::rebase_schema(self, file);
    }

    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()> {
        schemas::process_schema_inline(ctx, value)
    }
}

impl Importable for Response {
    fn rebase(&mut self, file: &str) {
        rebase::rebase_response(self, file);
    }

    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()> {
        responses::process_response_inline(ctx, value)
    }
}

impl Importable for Parameter {
    fn rebase(&mut self, file: &str) {
        rebase::rebase_parameter(self, file);
    }

    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()> {
        params::process_parameter_inline(ctx, value)
    }
}

impl Importable for RequestBody {
    fn rebase(&mut self, file: &str) {
        rebase::rebase_request_body(self, file);
    }

    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()> {
        body::process_request_body_inline(ctx, value)
    }
}

impl Importable for Header {
    fn rebase(&mut self, file: &str) {
        rebase::rebase_header(self, file);
    }

    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()> {
        responses::process_header_inline(ctx, value)
    }
}

impl Importable for Link {
    fn rebase(&mut self, file: &str) {
        rebase::rebase_link(self, file);
    }

    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()> {
        responses::process_link_inline(ctx, value)
    }
}

impl Importable for Callback {
    fn rebase(&mut self, file: &str) {
        rebase::rebase_callback(self, file);
    }

    fn walk(ctx: &mut ResolveContext<'_, '_>, value: &mut Self) -> AppResult<()> {
        operations::process_callback_inline(ctx, value)
    }
}

impl Importable for Example {
    fn rebase(&mut self, _file: &str) {}

    fn walk(_ctx: &mut ResolveContext<'_, '_>, _value: &mut Self) -> AppResult<()> {
        Ok(())
    }
}

impl Importable for SecurityScheme {
    fn rebase(&mut self, _file: &str) {}

    fn walk(_ctx: &mut ResolveContext<'_, '_>, _value: &mut Self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::models::Components;
    use crate::oas::ref_utils::RefFormat;
    use crate::resolver::{MemoryLoader, ResolverCache, ResolverSettings};
    use pretty_assertions::assert_eq;

    fn context<'c, 'l>(
        components: &'c mut Components,
        loader: &'l MemoryLoader,
    ) -> ResolveContext<'c, 'l> {
        ResolveContext::new(
            components,
            ResolverCache::new(loader, vec![], None),
            ResolverSettings::default(),
        )
    }

    #[test]
    fn test_import_is_idempotent() {
        let loader = MemoryLoader::new().with("pet.yaml", "Pet:\n  type: object\n");
        let mut components = Components::default();
        let mut ctx = context(&mut components, &loader);

        let first =
            import_external::<Schema>(&mut ctx, "./pet.yaml#/Pet", RefFormat::Relative).unwrap();
        let second =
            import_external::<Schema>(&mut ctx, "./pet.yaml#/Pet", RefFormat::Relative).unwrap();
        assert_eq!(first.as_deref(), Some("Pet"));
        assert_eq!(first, second);
        assert_eq!(components.schemas.len(), 1);
        assert_eq!(loader.load_count("pet.yaml"), 1);
    }

    #[test]
    fn test_same_target_different_spelling_shares_name() {
        let loader = MemoryLoader::new().with("pet.yaml", "Pet:\n  type: object\n");
        let mut components = Components::default();
        let mut ctx = context(&mut components, &loader);

        let a =
            import_external::<Schema>(&mut ctx, "./pet.yaml#/Pet", RefFormat::Relative).unwrap();
        let b = import_external::<Schema>(&mut ctx, "pet.yaml#/Pet", RefFormat::Relative).unwrap();
        assert_eq!(a, b);
        assert_eq!(components.schemas.len(), 1);
    }

    #[test]
    fn test_name_collision_gets_suffix() {
        let loader = MemoryLoader::new()
            .with("a.yaml", "Pet:\n  type: object\n")
            .with("b.yaml", "Pet:\n  type: string\n");
        let mut components = Components::default();
        components
            .schemas
            .insert("Pet".to_string(), RefOr::T(Schema::of_type("integer")));
        let mut ctx = context(&mut components, &loader);

        let a = import_external::<Schema>(&mut ctx, "./a.yaml#/Pet", RefFormat::Relative).unwrap();
        let b = import_external::<Schema>(&mut ctx, "./b.yaml#/Pet", RefFormat::Relative).unwrap();
        assert_eq!(a.as_deref(), Some("Pet_1"));
        assert_eq!(b.as_deref(), Some("Pet_2"));
        assert_eq!(components.schemas.len(), 3);
    }

    #[test]
    fn test_equal_occupant_is_shared() {
        let loader = MemoryLoader::new().with("a.yaml", "Pet:\n  type: string\n");
        let mut components = Components::default();
        components
            .schemas
            .insert("Pet".to_string(), RefOr::T(Schema::of_type("string")));
        let mut ctx = context(&mut components, &loader);

        let name =
            import_external::<Schema>(&mut ctx, "./a.yaml#/Pet", RefFormat::Relative).unwrap();
        assert_eq!(name.as_deref(), Some("Pet"));
        assert_eq!(components.schemas.len(), 1);
    }

    #[test]
    fn test_dangling_occupant_is_replaced() {
        let loader = MemoryLoader::new().with("a.yaml", "Pet:\n  type: string\n");
        let mut components = Components::default();
        components
            .schemas
            .insert("Pet".to_string(), RefOr::new_ref("./a.yaml#/Pet"));
        let mut ctx = context(&mut components, &loader);

        let name =
            import_external::<Schema>(&mut ctx, "./a.yaml#/Pet", RefFormat::Relative).unwrap();
        assert_eq!(name.as_deref(), Some("Pet"));
        assert_eq!(
            components.schemas["Pet"],
            RefOr::T(Schema::of_type("string"))
        );
    }

    #[test]
    fn test_unresolvable_reference_is_none() {
        let loader = MemoryLoader::new();
        let mut components = Components::default();
        let mut ctx = context(&mut components, &loader);

        let mut reference = Reference::new("./missing.yaml#/Pet");
        resolve_reference::<Schema>(&mut ctx, &mut reference).unwrap();
        assert_eq!(reference.ref_location, "./missing.yaml#/Pet");
        assert!(components.schemas.is_empty());
    }

    #[test]
    fn test_chained_reference_follows_to_target() {
        let loader = MemoryLoader::new()
            .with("a.yaml", "Alias:\n  $ref: './b.yaml#/Real'\n")
            .with("b.yaml", "Real:\n  type: string\n");
        let mut components = Components::default();
        let mut ctx = context(&mut components, &loader);

        let name =
            import_external::<Schema>(&mut ctx, "./a.yaml#/Alias", RefFormat::Relative).unwrap();
        assert_eq!(name.as_deref(), Some("Alias"));
        assert_eq!(
            components.schemas["Alias"].ref_location(),
            Some("#/components/schemas/Real")
        );
        assert_eq!(
            components.schemas["Real"],
            RefOr::T(Schema::of_type("string"))
        );
    }

    #[test]
    fn test_external_local_pointer_is_rebased() {
        let loader = MemoryLoader::new().with(
            "lib.yaml",
            concat!(
                "components:\n",
                "  schemas:\n",
                "    Pet:\n",
                "      properties:\n",
                "        tag:\n",
                "          $ref: '#/components/schemas/Tag'\n",
                "    Tag:\n",
                "      type: string\n",
            ),
        );
        let mut components = Components::default();
        let mut ctx = context(&mut components, &loader);

        import_external::<Schema>(
            &mut ctx,
            "./lib.yaml#/components/schemas/Pet",
            RefFormat::Relative,
        )
        .unwrap();
        let pet = components.schemas["Pet"].as_inline().unwrap();
        assert_eq!(
            pet.properties().unwrap()["tag"].ref_location(),
            Some("#/components/schemas/Tag")
        );
        assert!(components.schemas["Tag"].as_inline().is_some());
    }

    #[test]
    fn test_same_text_in_other_directory_gets_own_slot() {
        let pet = concat!(
            "Pet:\n",
            "  properties:\n",
            "    tag:\n",
            "      $ref: './tag.yaml#/Tag'\n",
            "    twin:\n",
            "      $ref: '../b/pet.yaml#/Pet'\n",
        );
        let loader = MemoryLoader::new()
            .with("a/pet.yaml", pet)
            .with("b/pet.yaml", pet)
            .with("a/tag.yaml", "Tag:\n  type: string\n")
            .with("b/tag.yaml", "Tag:\n  type: integer\n");
        let mut components = Components::default();
        let mut ctx = context(&mut components, &loader);

        let name =
            import_external::<Schema>(&mut ctx, "./a/pet.yaml#/Pet", RefFormat::Relative).unwrap();
        assert_eq!(name.as_deref(), Some("Pet"));

        let property = |name: &str, key: &str| {
            let schema = components.schemas[name].as_inline().unwrap();
            schema.properties().unwrap()[key].ref_location().map(str::to_string)
        };
        assert_eq!(property("Pet", "tag").as_deref(), Some("#/components/schemas/Tag"));
        assert_eq!(property("Pet", "twin").as_deref(), Some("#/components/schemas/Pet_1"));
        assert_eq!(property("Pet_1", "tag").as_deref(), Some("#/components/schemas/Tag_1"));
        assert_eq!(property("Pet_1", "twin").as_deref(), Some("#/components/schemas/Pet_1"));
        assert_eq!(components.schemas["Tag"], RefOr::T(Schema::of_type("string")));
        assert_eq!(components.schemas["Tag_1"], RefOr::T(Schema::of_type("integer")));
    }
}
