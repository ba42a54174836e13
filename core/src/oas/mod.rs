#![deny(missing_docs)]

//! # OpenAPI Document Module
//!
//! - **models**: Typed nodes for the document, operations, parameters, components.
//! - **schema**: The schema tagged union (array / composed / object / leaf).
//! - **ref_utils**: `$ref` classification, naming and relative path joining.
//! - **normalization**: Raw JSON rewrites applied before deserializing.

pub mod models;
pub mod normalization;
pub mod ref_utils;
pub mod schema;

pub use models::{
    Callback, Component, ComponentType, Components, Example, ExtensibleMap, Header, Link,
    Loadable, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem, Paths, RefOr,
    Reference, RequestBody, Response, Responses, SecurityScheme,
};
pub use ref_utils::{classify, join, RefFormat};
pub use schema::{AdditionalProperties, Composition, Schema, SchemaKind, SchemaType};
