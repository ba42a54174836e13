#![deny(missing_docs)]

//! # Resolver Module
//!
//! Imports every external `$ref` reachable from a document into the document's
//! own `components` and rewrites the pointers to their local form.
//!
//! A run walks two passes over a shared [`ResolverCache`]:
//!
//! - **paths**: path-item refs, shared parameters, operations and callbacks.
//! - **components**: every entry of the nine registries.
//!
//! Walkers never dereference internal (`#/...`) pointers, so cyclic documents
//! terminate. Unresolvable references are logged and left in place.

pub mod body;
pub mod cache;
pub mod components;
pub mod external;
pub mod loader;
pub mod operations;
pub mod params;
pub mod paths;
pub mod rebase;
pub mod responses;
pub mod schemas;

pub use cache::ResolverCache;
pub use loader::{
    parse_document, AuthLocation, AuthorizationValue, DocumentLoader, FsLoader, MemoryLoader,
};

use crate::error::AppResult;
use crate::oas::models::{Components, OpenApi};

/// Switches for a resolve run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Copy path-level parameters into each operation and clear the shared list.
    pub add_parameters_to_each_operation: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            add_parameters_to_each_operation: true,
        }
    }
}

/// State threaded through every walker of one run.
pub struct ResolveContext<'c, 'l> {
    pub(crate) components: &'c mut Components,
    pub(crate) cache: ResolverCache<'l>,
    pub(crate) settings: ResolverSettings,
}

impl<'c, 'l> ResolveContext<'c, 'l> {
    /// Creates a context importing into `components`.
    pub fn new(
        components: &'c mut Components,
        cache: ResolverCache<'l>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            components,
            cache,
            settings,
        }
    }
}

/// Resolves the external references of one document in place.
pub struct OpenApiResolver<'a> {
    openapi: &'a mut OpenApi,
    loader: &'a dyn DocumentLoader,
    auths: Vec<AuthorizationValue>,
    parent_location: Option<String>,
    settings: ResolverSettings,
}

impl<'a> OpenApiResolver<'a> {
    /// Creates a resolver over `openapi`, loading external documents through `loader`.
    pub fn new(openapi: &'a mut OpenApi, loader: &'a dyn DocumentLoader) -> Self {
        Self {
            openapi,
            loader,
            auths: Vec::new(),
            parent_location: None,
            settings: ResolverSettings::default(),
        }
    }

    /// Credentials forwarded to remote fetches.
    pub fn with_auths(mut self, auths: Vec<AuthorizationValue>) -> Self {
        self.auths = auths;
        self
    }

    /// Location of the root document; relative references are joined against it.
    pub fn with_parent_location(mut self, location: impl Into<String>) -> Self {
        self.parent_location = Some(location.into());
        self
    }

    /// Overrides the default settings.
    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the paths pass then the components pass.
    ///
    /// Running it again on its own output changes nothing.
    pub fn resolve(&mut self) -> AppResult<()> {
        let OpenApi {
            paths, components, ..
        } = &mut *self.openapi;
        let cache = ResolverCache::new(
            self.loader,
            self.auths.clone(),
            self.parent_location.clone(),
        );
        let mut ctx = ResolveContext::new(components, cache, self.settings.clone());

        tracing::debug!(
            parent = self.parent_location.as_deref().unwrap_or("<none>"),
            paths = paths.items.len(),
            "resolving external references"
        );
        paths::process_paths(&mut ctx, paths)?;
        components::process_components(&mut ctx)?;
        Ok(())
    }
}

/// Convenience entry point: resolves `openapi` if present.
///
/// Returns `false` when there is no document to resolve.
pub fn resolve_document(
    openapi: Option<&mut OpenApi>,
    loader: &dyn DocumentLoader,
    parent_location: Option<&str>,
) -> AppResult<bool> {
    let Some(openapi) = openapi else {
        return Ok(false);
    };
    let mut resolver = OpenApiResolver::new(openapi, loader);
    if let Some(parent) = parent_location {
        resolver = resolver.with_parent_location(parent);
    }
    resolver.resolve()?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_document_without_input() {
        let loader = MemoryLoader::new();
        assert!(!resolve_document(None, &loader, None).unwrap());
    }

    #[test]
    fn test_default_settings_share_parameters() {
        assert!(ResolverSettings::default().add_parameters_to_each_operation);
    }
}
