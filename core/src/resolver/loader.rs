#![deny(missing_docs)]

//! # Document Loaders
//!
//! Collaborators that turn a location (relative path, `file:` URI or remote URL)
//! into raw document text. A missing document is reported as
//! [`AppError::NotFound`]; every other failure is fatal to a resolve run.

use crate::error::{AppError, AppResult};
use crate::oas::normalization::normalize_boolean_schemas;
use crate::oas::ref_utils::{classify, RefFormat};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

/// Where an authorization value is attached to a remote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLocation {
    /// Sent as an HTTP header.
    Header,
    /// Appended to the query string.
    Query,
}

/// Credentials forwarded verbatim when fetching remote documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationValue {
    /// Header or query parameter name.
    pub key_name: String,
    /// Value sent as-is.
    pub value: String,
    /// Where the value is attached.
    pub location: AuthLocation,
    /// Restricts the value to a single host when set.
    pub host: Option<String>,
}

impl AuthorizationValue {
    /// A header credential for every host.
    pub fn header(key_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            value: value.into(),
            location: AuthLocation::Header,
            host: None,
        }
    }

    /// A query credential for every host.
    pub fn query(key_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            value: value.into(),
            location: AuthLocation::Query,
            host: None,
        }
    }

    /// Restricts the credential to `host`.
    pub fn for_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// True when the credential applies to requests against `host`.
    pub fn applies_to(&self, host: Option<&str>) -> bool {
        match (&self.host, host) {
            (None, _) => true,
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
            (Some(_), None) => false,
        }
    }

    /// Parses `header:NAME=VALUE[@HOST]` or `query:NAME=VALUE[@HOST]`.
    pub fn parse(spec: &str) -> AppResult<Self> {
        let invalid = || {
            AppError::General(format!(
                "Invalid auth '{}': expected header:NAME=VALUE[@HOST] or query:NAME=VALUE[@HOST]",
                spec
            ))
        };

        let (location, rest) = spec.split_once(':').ok_or_else(invalid)?;
        let location = match location.to_ascii_lowercase().as_str() {
            "header" => AuthLocation::Header,
            "query" => AuthLocation::Query,
            _ => return Err(invalid()),
        };
        let (key_name, rest) = rest.split_once('=').ok_or_else(invalid)?;
        if key_name.is_empty() {
            return Err(invalid());
        }
        let (value, host) = match rest.rsplit_once('@') {
            Some((value, host)) if !host.is_empty() => (value, Some(host.to_string())),
            _ => (rest, None),
        };

        Ok(Self {
            key_name: key_name.to_string(),
            value: value.to_string(),
            location,
            host,
        })
    }
}

/// Parses YAML or JSON document text, normalizing boolean schemas.
pub fn parse_document(text: &str, location: &str) -> AppResult<Value> {
    let mut value: Value = serde_yaml::from_str(text)
        .map_err(|e| AppError::Parse(format!("Failed to parse '{}': {}", location, e)))?;
    normalize_boolean_schemas(&mut value);
    Ok(value)
}

/// Loads raw document text for a location.
pub trait DocumentLoader {
    /// Returns the text at `location`, forwarding `auths` to remote fetches.
    fn load(&self, location: &str, auths: &[AuthorizationValue]) -> AppResult<String>;
}

/// Reads local files and (with the `remote` feature) fetches HTTP(S) URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl DocumentLoader for FsLoader {
    fn load(&self, location: &str, auths: &[AuthorizationValue]) -> AppResult<String> {
        let path = match classify(location) {
            RefFormat::Url if location.starts_with("file:") => Url::parse(location)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| AppError::Fetch(format!("Invalid file URI '{}'", location)))?,
            RefFormat::Url => return fetch_remote(location, auths),
            _ => PathBuf::from(location.replace('\\', "/")),
        };

        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(path.display().to_string())
            } else {
                AppError::Io(e)
            }
        })
    }
}

#[cfg(feature = "remote")]
fn fetch_remote(location: &str, auths: &[AuthorizationValue]) -> AppResult<String> {
    let mut url = Url::parse(location)
        .map_err(|e| AppError::Fetch(format!("Invalid URL '{}': {}", location, e)))?;
    let host = url.host_str().map(str::to_string);
    let applicable: Vec<&AuthorizationValue> = auths
        .iter()
        .filter(|auth| auth.applies_to(host.as_deref()))
        .collect();

    for auth in applicable
        .iter()
        .filter(|auth| auth.location == AuthLocation::Query)
    {
        url.query_pairs_mut()
            .append_pair(&auth.key_name, &auth.value);
    }

    let mut request = ureq::get(url.as_str());
    for auth in applicable
        .iter()
        .filter(|auth| auth.location == AuthLocation::Header)
    {
        request = request.header(auth.key_name.as_str(), auth.value.as_str());
    }

    tracing::debug!(url = %location, "fetching remote document");
    match request.call() {
        Ok(mut response) => response
            .body_mut()
            .read_to_string()
            .map_err(|e| AppError::Fetch(format!("Failed to read '{}': {}", location, e))),
        Err(ureq::Error::StatusCode(404)) => Err(AppError::NotFound(location.to_string())),
        Err(e) => Err(AppError::Fetch(format!(
            "Failed to fetch '{}': {}",
            location, e
        ))),
    }
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(location: &str, _auths: &[AuthorizationValue]) -> AppResult<String> {
    Err(AppError::Fetch(format!(
        "Cannot fetch '{}': built without the `remote` feature",
        location
    )))
}

/// In-memory documents keyed by location. Counts every load request.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
    loads: RefCell<HashMap<String, usize>>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, builder style.
    pub fn with(mut self, location: &str, text: &str) -> Self {
        self.insert(location, text);
        self
    }

    /// Adds a document.
    pub fn insert(&mut self, location: &str, text: &str) {
        self.documents
            .insert(Self::key(location).to_string(), text.to_string());
    }

    /// Number of times `location` was requested.
    pub fn load_count(&self, location: &str) -> usize {
        self.loads
            .borrow()
            .get(Self::key(location))
            .copied()
            .unwrap_or(0)
    }

    fn key(location: &str) -> &str {
        location.trim_start_matches("./")
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, location: &str, _auths: &[AuthorizationValue]) -> AppResult<String> {
        let key = Self::key(location);
        *self.loads.borrow_mut().entry(key.to_string()).or_insert(0) += 1;
        self.documents
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(location.to_string()))
    }
}
