#![deny(missing_docs)]

//! # Resolver Cache
//!
//! Per-run memory of the resolver:
//!
//! - parsed external documents keyed by resolved location (each location is
//!   requested from the loader at most once, misses included),
//! - extracted fragments keyed by the full reference string,
//! - the local name assigned to every imported reference,
//! - the local name assigned to every `(kind, target)` pair, so differently
//!   spelled references to the same target share one component,
//! - the names this run has allocated in each registry.

use crate::error::AppResult;
use crate::oas::models::{ComponentType, Loadable, RefOr};
use crate::oas::ref_utils::{join, split_reference, RefFormat};
use crate::resolver::loader::{parse_document, AuthorizationValue, DocumentLoader};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Cache shared by every walker of one resolve run.
pub struct ResolverCache<'l> {
    loader: &'l dyn DocumentLoader,
    auths: Vec<AuthorizationValue>,
    parent_location: Option<String>,
    documents: HashMap<String, Value>,
    missing: HashSet<String>,
    fragments: HashMap<String, Value>,
    renamed: HashMap<String, String>,
    targets: HashMap<(ComponentType, String), String>,
    used: HashMap<ComponentType, HashSet<String>>,
}

impl<'l> ResolverCache<'l> {
    /// Creates an empty cache resolving relative locations against `parent_location`.
    pub fn new(
        loader: &'l dyn DocumentLoader,
        auths: Vec<AuthorizationValue>,
        parent_location: Option<String>,
    ) -> Self {
        Self {
            loader,
            auths,
            parent_location,
            documents: HashMap::new(),
            missing: HashSet::new(),
            fragments: HashMap::new(),
            renamed: HashMap::new(),
            targets: HashMap::new(),
            used: HashMap::new(),
        }
    }

    /// Resolves the document part of a reference to a loader location.
    pub fn resolve_location(&self, document: &str, format: RefFormat) -> String {
        match (format, self.parent_location.as_deref()) {
            (RefFormat::Url, _) | (_, None) => document.to_string(),
            (_, Some(parent)) if document.is_empty() => parent.to_string(),
            (_, Some(parent)) => join(parent, document),
        }
    }

    /// Canonical identity of a reference target: resolved location plus fragment.
    pub fn target_key(&self, reference: &str, format: RefFormat) -> String {
        let (document, fragment) = split_reference(reference);
        format!(
            "{}#{}",
            self.resolve_location(document, format),
            fragment.unwrap_or("")
        )
    }

    /// Loads the value a reference points to.
    ///
    /// Returns `Ok(None)` when the document is missing, the fragment does not
    /// exist or the value does not have the requested shape. Loader failures
    /// other than "not found" and unparsable documents are errors.
    pub fn load_reference<T: Loadable>(
        &mut self,
        reference: &str,
        format: RefFormat,
    ) -> AppResult<Option<RefOr<T>>> {
        let mut value = match self.fragments.get(reference) {
            Some(value) => value.clone(),
            None => {
                let Some(value) = self.load_fragment(reference, format)? else {
                    return Ok(None);
                };
                self.fragments.insert(reference.to_string(), value.clone());
                value
            }
        };

        T::prepare(&mut value);
        match serde_json::from_value::<RefOr<T>>(value) {
            Ok(loaded) => Ok(Some(loaded)),
            Err(e) => {
                tracing::warn!(reference, error = %e, "referenced value has an unexpected shape");
                Ok(None)
            }
        }
    }

    fn load_fragment(&mut self, reference: &str, format: RefFormat) -> AppResult<Option<Value>> {
        let (document, fragment) = split_reference(reference);
        let location = self.resolve_location(document, format);
        let Some(contents) = self.document(&location)? else {
            return Ok(None);
        };

        let pointer = fragment
            .map(|f| percent_decode_str(f).decode_utf8_lossy().into_owned())
            .unwrap_or_default();
        if pointer.is_empty() || pointer == "/" {
            return Ok(Some(contents.clone()));
        }

        match contents.pointer(&pointer) {
            Some(found) => Ok(Some(found.clone())),
            None => {
                tracing::warn!(reference, %location, "fragment not found in referenced document");
                Ok(None)
            }
        }
    }

    fn document(&mut self, location: &str) -> AppResult<Option<&Value>> {
        if self.missing.contains(location) {
            return Ok(None);
        }
        if !self.documents.contains_key(location) {
            let text = match self.loader.load(location, &self.auths) {
                Ok(text) => text,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(%location, "referenced document not found");
                    self.missing.insert(location.to_string());
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            let parsed = parse_document(&text, location)?;
            tracing::debug!(%location, "loaded external document");
            self.documents.insert(location.to_string(), parsed);
        }
        Ok(self.documents.get(location))
    }

    /// Local name previously assigned to `reference`.
    pub fn assigned_name(&self, reference: &str) -> Option<&str> {
        self.renamed.get(reference).map(String::as_str)
    }

    /// Remembers the local name of `reference`. The first assignment wins.
    pub fn assign_name(&mut self, reference: &str, name: &str) {
        self.renamed
            .entry(reference.to_string())
            .or_insert_with(|| name.to_string());
    }

    /// Local name previously assigned to a `(kind, target)` pair.
    pub fn target_name(&self, kind: ComponentType, target: &str) -> Option<&str> {
        self.targets
            .get(&(kind, target.to_string()))
            .map(String::as_str)
    }

    /// Remembers the local name of a `(kind, target)` pair. The first assignment wins.
    pub fn assign_target(&mut self, kind: ComponentType, target: String, name: &str) {
        self.targets
            .entry((kind, target))
            .or_insert_with(|| name.to_string());
    }

    /// Records that this run placed a component under `name`.
    pub fn mark_used(&mut self, kind: ComponentType, name: &str) {
        self.used.entry(kind).or_default().insert(name.to_string());
    }

    /// True when this run already placed a component under `name`.
    pub fn is_used(&self, kind: ComponentType, name: &str) -> bool {
        self.used.get(&kind).is_some_and(|names| names.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::oas::schema::Schema;
    use crate::resolver::loader::MemoryLoader;

    #[test]
    fn test_resolve_location() {
        let loader = MemoryLoader::new();
        let cache = ResolverCache::new(&loader, vec![], Some("./specs/root.yaml".into()));
        assert_eq!(
            cache.resolve_location("./pet.yaml", RefFormat::Relative),
            "./specs/pet.yaml"
        );
        assert_eq!(
            cache.resolve_location("http://h/pet.yaml", RefFormat::Url),
            "http://h/pet.yaml"
        );

        let rootless = ResolverCache::new(&loader, vec![], None);
        assert_eq!(
            rootless.resolve_location("./pet.yaml", RefFormat::Relative),
            "./pet.yaml"
        );
    }

    #[test]
    fn test_load_reference_caches_documents() {
        let loader = MemoryLoader::new().with(
            "pet.yaml",
            "Pet:\n  type: object\nTag:\n  type: string\n",
        );
        let mut cache = ResolverCache::new(&loader, vec![], None);

        let pet = cache
            .load_reference::<Schema>("./pet.yaml#/Pet", RefFormat::Relative)
            .unwrap()
            .unwrap();
        assert!(pet.as_inline().unwrap().is_type_or_untyped("object"));
        let tag = cache
            .load_reference::<Schema>("./pet.yaml#/Tag", RefFormat::Relative)
            .unwrap();
        assert!(tag.is_some());
        assert_eq!(loader.load_count("pet.yaml"), 1);
    }

    #[test]
    fn test_missing_targets_are_soft() {
        let loader = MemoryLoader::new().with("pet.yaml", "Pet: {}\n");
        let mut cache = ResolverCache::new(&loader, vec![], None);

        let missing_doc = cache
            .load_reference::<Schema>("./nope.yaml#/X", RefFormat::Relative)
            .unwrap();
        assert!(missing_doc.is_none());
        let again = cache
            .load_reference::<Schema>("./nope.yaml#/Y", RefFormat::Relative)
            .unwrap();
        assert!(again.is_none());
        assert_eq!(loader.load_count("nope.yaml"), 1);

        let missing_fragment = cache
            .load_reference::<Schema>("./pet.yaml#/Cat", RefFormat::Relative)
            .unwrap();
        assert!(missing_fragment.is_none());
    }

    #[test]
    fn test_unparsable_document_is_fatal() {
        let loader = MemoryLoader::new().with("bad.yaml", "a: [unclosed");
        let mut cache = ResolverCache::new(&loader, vec![], None);
        let result = cache.load_reference::<Schema>("./bad.yaml#/a", RefFormat::Relative);
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_name_assignment_first_wins() {
        let loader = MemoryLoader::new();
        let mut cache = ResolverCache::new(&loader, vec![], None);
        cache.assign_name("./a.yaml#/A", "A");
        cache.assign_name("./a.yaml#/A", "A_1");
        assert_eq!(cache.assigned_name("./a.yaml#/A"), Some("A"));

        cache.mark_used(ComponentType::Schemas, "A");
        assert!(cache.is_used(ComponentType::Schemas, "A"));
        assert!(!cache.is_used(ComponentType::Responses, "A"));
    }
}
