#![deny(missing_docs)]

//! # Transform Module
//!
//! Optional document-wide passes, independent of reference import:
//!
//! - **inline**: hoists anonymous object schemas into named, deduplicated components.
//! - **fully**: substitutes every schema reference reachable from the paths by
//!   its definition, optionally merging `allOf` branches into one object.

pub mod fully;
pub mod inline;

pub use fully::ResolverFully;
pub use inline::InlineModelResolver;
