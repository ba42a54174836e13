#![deny(missing_docs)]

//! # OASRef Core
//!
//! Reference resolution and schema normalization for OpenAPI documents.
//!
//! - **oas**: Typed document model, reference classification and path joining.
//! - **resolver**: Imports every external `$ref` (relative file or URL) into the
//!   document's own `components`, rewriting pointers to their local form.
//! - **transform**: Optional document-wide passes: inline model extraction and
//!   full reference substitution.

/// Shared error types.
pub mod error;

/// OpenAPI (OAS) document model and reference utilities.
pub mod oas;

/// External reference resolution engine.
pub mod resolver;

/// Document-wide schema transforms.
pub mod transform;

pub use error::{AppError, AppResult};
pub use oas::{
    classify, join, ComponentType, Components, OpenApi, PathItem, RefFormat, RefOr, Reference,
    Schema, SchemaKind,
};
pub use resolver::{
    resolve_document, AuthLocation, AuthorizationValue, DocumentLoader, FsLoader, MemoryLoader,
    OpenApiResolver, ResolverSettings,
};
pub use transform::{InlineModelResolver, ResolverFully};
