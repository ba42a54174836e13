#![deny(missing_docs)]

//! # Parameter Resolution
//!
//! - Walks parameters (schema, examples, content).
//! - Merges parameter lists: references are replaced by the parameter they
//!   point to, so that shared and operation parameters can be compared by
//!   their `(in, name)` identity.
//! - Copies path-level parameters into each operation.

use crate::error::AppResult;
use crate::oas::models::{ComponentType, Parameter, PathItem, RefOr};
use crate::oas::ref_utils::{classify, document_part, internal_name, RefFormat};
use crate::resolver::body::{process_content, process_examples};
use crate::resolver::external::resolve_reference;
use crate::resolver::rebase::{rebase_parameter, rebase_reference};
use crate::resolver::schemas::process_schema;
use crate::resolver::ResolveContext;
use std::collections::HashSet;

/// Resolves a parameter node.
pub fn process_parameter(
    ctx: &mut ResolveContext<'_, '_>,
    parameter: &mut RefOr<Parameter>,
) -> AppResult<()> {
    match parameter {
        RefOr::Ref(reference) => resolve_reference::<Parameter>(ctx, reference),
        RefOr::T(inline) => process_parameter_inline(ctx, inline),
    }
}

/// Walks the schema, examples and content of an inline parameter.
pub fn process_parameter_inline(
    ctx: &mut ResolveContext<'_, '_>,
    parameter: &mut Parameter,
) -> AppResult<()> {
    if let Some(schema) = parameter.schema.as_mut() {
        process_schema(ctx, schema)?;
    }
    process_examples(ctx, &mut parameter.examples)?;
    process_content(ctx, &mut parameter.content)
}

/// Replaces referenced parameters by their definitions.
///
/// Internal references are looked up in the document's own
/// `components/parameters` (following chains); external ones are loaded and
/// re-anchored onto their file. References that cannot be resolved are kept.
pub fn merge_parameters(
    ctx: &mut ResolveContext<'_, '_>,
    parameters: Vec<RefOr<Parameter>>,
) -> AppResult<Vec<RefOr<Parameter>>> {
    let mut merged = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        let resolved = match &parameter {
            RefOr::T(_) => None,
            RefOr::Ref(reference) => {
                let location = reference.ref_location.as_str();
                match classify(location) {
                    RefFormat::Internal => lookup_local(ctx, location),
                    format => load_external(ctx, location, format)?,
                }
            }
        };
        merged.push(resolved.unwrap_or(parameter));
    }
    Ok(merged)
}

fn lookup_local(ctx: &ResolveContext<'_, '_>, reference: &str) -> Option<RefOr<Parameter>> {
    let mut visited = HashSet::new();
    let mut current = reference.to_string();

    loop {
        let name = internal_name(&current, ComponentType::Parameters)?;
        if !visited.insert(name.clone()) {
            return None;
        }
        match ctx.components.parameters.get(&name)? {
            RefOr::T(parameter) => return Some(RefOr::T(parameter.clone())),
            RefOr::Ref(next) if classify(&next.ref_location) == RefFormat::Internal => {
                current = next.ref_location.clone();
            }
            RefOr::Ref(next) => return Some(RefOr::Ref(next.clone())),
        }
    }
}

fn load_external(
    ctx: &mut ResolveContext<'_, '_>,
    reference: &str,
    format: RefFormat,
) -> AppResult<Option<RefOr<Parameter>>> {
    let Some(mut loaded) = ctx.cache.load_reference::<Parameter>(reference, format)? else {
        return Ok(None);
    };
    let file = document_part(reference);
    match &mut loaded {
        RefOr::T(parameter) => rebase_parameter(parameter, file),
        RefOr::Ref(chained) => rebase_reference(chained, file),
    }
    Ok(Some(loaded))
}

/// Prepends the shared parameters of a path item to each of its operations,
/// skipping those an operation already declares, then clears the shared list.
///
/// Does nothing unless `add_parameters_to_each_operation` is enabled.
pub fn add_shared_parameters_to_operations(ctx: &ResolveContext<'_, '_>, item: &mut PathItem) {
    if !ctx.settings.add_parameters_to_each_operation || item.parameters.is_empty() {
        return;
    }

    let shared = std::mem::take(&mut item.parameters);
    for operation in item.operations_mut() {
        let missing: Vec<RefOr<Parameter>> = shared
            .iter()
            .filter(|candidate| !declares(&operation.parameters, candidate))
            .cloned()
            .collect();
        operation.parameters.splice(0..0, missing);
    }
}

fn declares(parameters: &[RefOr<Parameter>], candidate: &RefOr<Parameter>) -> bool {
    let RefOr::T(candidate) = candidate else {
        return false;
    };
    parameters
        .iter()
        .filter_map(RefOr::as_inline)
        .any(|existing| existing.same_identity(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::models::{Components, Operation, ParameterIn};
    use crate::resolver::{MemoryLoader, ResolverCache, ResolverSettings};
    use pretty_assertions::assert_eq;

    fn query(name: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            location: Some(ParameterIn::Query),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_follows_internal_chains() {
        let loader = MemoryLoader::new();
        let mut components = Components::default();
        components
            .parameters
            .insert("Alias".into(), RefOr::new_ref("#/components/parameters/Limit"));
        components
            .parameters
            .insert("Limit".into(), RefOr::T(query("limit")));
        components
            .parameters
            .insert("Loop".into(), RefOr::new_ref("#/components/parameters/Loop"));
        let mut ctx = ResolveContext::new(
            &mut components,
            ResolverCache::new(&loader, vec![], None),
            ResolverSettings::default(),
        );

        let merged = merge_parameters(
            &mut ctx,
            vec![
                RefOr::new_ref("#/components/parameters/Alias"),
                RefOr::new_ref("#/components/parameters/Loop"),
                RefOr::new_ref("#/components/parameters/Missing"),
            ],
        )
        .unwrap();

        assert_eq!(merged[0], RefOr::T(query("limit")));
        assert_eq!(merged[1].ref_location(), Some("#/components/parameters/Loop"));
        assert_eq!(
            merged[2].ref_location(),
            Some("#/components/parameters/Missing")
        );
    }

    #[test]
    fn test_merge_loads_external_and_rebases() {
        let loader = MemoryLoader::new().with(
            "common/params.yaml",
            "Limit:\n  name: limit\n  in: query\n  schema:\n    $ref: '#/Count'\n",
        );
        let mut components = Components::default();
        let mut ctx = ResolveContext::new(
            &mut components,
            ResolverCache::new(&loader, vec![], None),
            ResolverSettings::default(),
        );

        let merged = merge_parameters(
            &mut ctx,
            vec![RefOr::new_ref("./common/params.yaml#/Limit")],
        )
        .unwrap();
        let parameter = merged[0].as_inline().unwrap();
        assert_eq!(parameter.name, "limit");
        assert_eq!(
            parameter.schema.as_ref().unwrap().ref_location(),
            Some("./common/params.yaml#/Count")
        );
    }

    #[test]
    fn test_shared_parameters_prepended_once() {
        let loader = MemoryLoader::new();
        let mut components = Components::default();
        let ctx = ResolveContext::new(
            &mut components,
            ResolverCache::new(&loader, vec![], None),
            ResolverSettings::default(),
        );

        let mut item = PathItem {
            parameters: vec![RefOr::T(query("limit")), RefOr::T(query("offset"))],
            get: Some(Operation {
                parameters: vec![RefOr::T(query("limit")), RefOr::T(query("q"))],
                ..Default::default()
            }),
            post: Some(Operation::default()),
            ..Default::default()
        };
        add_shared_parameters_to_operations(&ctx, &mut item);

        assert!(item.parameters.is_empty());
        let get: Vec<&str> = item
            .get
            .as_ref()
            .unwrap()
            .parameters
            .iter()
            .map(|p| p.as_inline().unwrap().name.as_str())
            .collect();
        assert_eq!(get, vec!["offset", "limit", "q"]);
        assert_eq!(item.post.as_ref().unwrap().parameters.len(), 2);
    }

    #[test]
    fn test_shared_parameters_disabled() {
        let loader = MemoryLoader::new();
        let mut components = Components::default();
        let ctx = ResolveContext::new(
            &mut components,
            ResolverCache::new(&loader, vec![], None),
            ResolverSettings {
                add_parameters_to_each_operation: false,
            },
        );
        let mut item = PathItem {
            parameters: vec![RefOr::T(query("limit"))],
            get: Some(Operation::default()),
            ..Default::default()
        };
        add_shared_parameters_to_operations(&ctx, &mut item);
        assert_eq!(item.parameters.len(), 1);
        assert!(item.get.as_ref().unwrap().parameters.is_empty());
    }
}
