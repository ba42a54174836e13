#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Helpers for classifying `$ref` strings, naming their targets and joining
//! relative references against the location of the document that holds them.
//!
//! None of these helpers perform I/O.

use crate::oas::models::ComponentType;
use percent_encoding::percent_decode_str;
use url::Url;

/// How a `$ref` string is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefFormat {
    /// Fragment only (`#/components/schemas/Pet`), points into the same document.
    Internal,
    /// Relative file path (`./pet.yaml#/Pet`, `../common.json`).
    Relative,
    /// Absolute URL with a scheme (`https://host/pet.yaml#/Pet`).
    Url,
}

impl RefFormat {
    /// True for formats that point outside the current document.
    pub fn is_external(self) -> bool {
        !matches!(self, RefFormat::Internal)
    }
}

/// Classifies a `$ref` string.
///
/// Single letter schemes are treated as Windows drive letters (`C:/specs/a.yaml`)
/// and therefore as relative paths.
pub fn classify(reference: &str) -> RefFormat {
    if reference.starts_with('#') {
        return RefFormat::Internal;
    }
    match Url::parse(reference) {
        Ok(url) if url.scheme().len() > 1 => RefFormat::Url,
        _ => RefFormat::Relative,
    }
}

/// Splits a reference at the first `#` into its document part and fragment.
pub fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((document, fragment)) => (document, Some(fragment)),
        None => (reference, None),
    }
}

/// Returns the document part of a reference (everything before `#`).
pub fn document_part(reference: &str) -> &str {
    split_reference(reference).0
}

/// Derives a local component name for an external reference.
///
/// The last JSON Pointer segment of the fragment wins. Without a fragment, the
/// file name up to its first `.` is used.
pub fn compute_definition_name(reference: &str) -> String {
    let (document, fragment) = split_reference(reference);
    let pointer = fragment
        .map(|f| f.trim_end_matches('/'))
        .filter(|f| !f.is_empty());

    let name = match pointer {
        Some(pointer) => decode_pointer_segment(pointer.rsplit('/').next().unwrap_or(pointer)),
        None => {
            let file = document
                .trim_end_matches('/')
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(document);
            file.split('.').next().unwrap_or(file).to_string()
        }
    };

    if name.is_empty() {
        "model".to_string()
    } else {
        name
    }
}

/// Extracts the trailing name of a local reference (`#/components/schemas/Pet` -> `Pet`).
pub fn extract_ref_name(reference: &str) -> String {
    let segment = reference.rsplit('/').next().unwrap_or(reference);
    decode_pointer_segment(segment)
}

/// Builds the internal form `#/components/<section>/<name>`.
pub fn internal_ref(kind: ComponentType, name: &str) -> String {
    format!(
        "#/components/{}/{}",
        kind.section(),
        encode_pointer_segment(name)
    )
}

/// Returns the component name of an internal reference into the `kind` registry.
pub fn internal_name(reference: &str, kind: ComponentType) -> Option<String> {
    let rest = reference
        .strip_prefix("#/components/")?
        .strip_prefix(kind.section())?
        .strip_prefix('/')?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(decode_pointer_segment(rest))
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent encoding).
pub fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Escapes a name for use as a JSON Pointer segment.
pub fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Joins a reference against the location of the document that contains it.
///
/// URL bases use standard URL resolution. Path bases merge directories and
/// collapse `.`/`..` segments, keeping leading `..` that climb above the base.
/// When the base was explicitly relative (`./`, `../`, `/`) and the result
/// begins with a name, a `./` prefix is restored so the result stays
/// recognizably relative. A base that cannot be joined is returned unchanged.
pub fn join(base: &str, reference: &str) -> String {
    if classify(base) == RefFormat::Url {
        return match Url::parse(base).and_then(|url| url.join(reference)) {
            Ok(joined) => joined.to_string(),
            Err(_) => base.to_string(),
        };
    }
    if classify(reference) == RefFormat::Url {
        return reference.to_string();
    }

    let base = base.replace('\\', "/");
    let reference = reference.replace('\\', "/");
    let base_document = document_part(&base);
    let (ref_document, ref_fragment) = split_reference(&reference);

    let merged = if ref_document.is_empty() {
        base_document.to_string()
    } else if ref_document.starts_with('/') {
        ref_document.to_string()
    } else {
        match base_document.rfind('/') {
            Some(idx) => format!("{}{}", &base_document[..=idx], ref_document),
            None => ref_document.to_string(),
        }
    };

    let mut joined = remove_dot_segments(&merged);
    let explicitly_relative = base_document.starts_with('.') || base_document.starts_with('/');
    if explicitly_relative && joined.starts_with(|c: char| c.is_alphanumeric()) {
        joined.insert_str(0, "./");
    }

    match ref_fragment {
        Some(fragment) => format!("{}#{}", joined, fragment),
        None => joined,
    }
}

/// Re-bases a reference found inside the external document `file` so it can
/// be resolved from the root document.
///
/// Local pointers gain the file as their document part, relative paths are
/// joined against it and URLs are already absolute.
pub fn rebase(file: &str, reference: &str) -> String {
    if file.is_empty() {
        return reference.to_string();
    }
    match classify(reference) {
        RefFormat::Internal => format!("{}{}", file, reference),
        RefFormat::Relative => join(file, reference),
        RefFormat::Url => reference.to_string(),
    }
}

fn remove_dot_segments(path: &str) -> String {
    let absolute = path.starts_with('/');
    let directory = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let mut out = segments.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if directory && !segments.is_empty() {
        out.push('/');
    }
    out
}
