//! Response, header and link walkers.

use crate::error::AppResult;
use crate::oas::models::{Header, Link, RefOr, Response};
use crate::resolver::body::{process_content, process_examples};
use crate::resolver::external::resolve_reference;
use crate::resolver::schemas::process_schema;
use crate::resolver::ResolveContext;

/// Resolves a response node.
pub fn process_response(
    ctx: &mut ResolveContext<'_, '_>,
    response: &mut RefOr<Response>,
) -> AppResult<()> {
    match response {
        RefOr::Ref(reference) => resolve_reference::<Response>(ctx, reference),
        RefOr::T(inline) => process_response_inline(ctx, inline),
    }
}

/// Walks the content, headers and links of an inline response.
pub fn process_response_inline(
    ctx: &mut ResolveContext<'_, '_>,
    response: &mut Response,
) -> AppResult<()> {
    process_content(ctx, &mut response.content)?;
    for header in response.headers.values_mut() {
        process_header(ctx, header)?;
    }
    for link in response.links.values_mut() {
        process_link(ctx, link)?;
    }
    Ok(())
}

/// Resolves a header node.
pub fn process_header(
    ctx: &mut ResolveContext<'_, '_>,
    header: &mut RefOr<Header>,
) -> AppResult<()> {
    match header {
        RefOr::Ref(reference) => resolve_reference::<Header>(ctx, reference),
        RefOr::T(inline) => process_header_inline(ctx, inline),
    }
}

/// Walks the schema, examples and content of an inline header.
pub fn process_header_inline(
    ctx: &mut ResolveContext<'_, '_>,
    header: &mut Header,
) -> AppResult<()> {
    if let Some(schema) = header.schema.as_mut() {
        process_schema(ctx, schema)?;
    }
    process_examples(ctx, &mut header.examples)?;
    process_content(ctx, &mut header.content)
}

/// Resolves a link node.
pub fn process_link(ctx: &mut ResolveContext<'_, '_>, link: &mut RefOr<Link>) -> AppResult<()> {
    match link {
        RefOr::Ref(reference) => resolve_reference::<Link>(ctx, reference),
        RefOr::T(inline) => process_link_inline(ctx, inline),
    }
}

/// Walks the headers of an inline link.
pub fn process_link_inline(ctx: &mut ResolveContext<'_, '_>, link: &mut Link) -> AppResult<()> {
    for header in link.headers.values_mut() {
        process_header(ctx, header)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::models::Components;
    use crate::resolver::{MemoryLoader, ResolverCache, ResolverSettings};
    use serde_json::json;

    #[test]
    fn test_response_headers_and_links() {
        let loader = MemoryLoader::new()
            .with("headers.yaml", "RateLimit:\n  schema:\n    type: integer\n")
            .with(
                "links.yaml",
                concat!(
                    "GetOwner:\n",
                    "  operationId: getOwner\n",
                    "  headers:\n",
                    "    Trace:\n",
                    "      $ref: './headers.yaml#/RateLimit'\n",
                ),
            );
        let mut components = Components::default();
        let mut ctx = ResolveContext::new(
            &mut components,
            ResolverCache::new(&loader, vec![], None),
            ResolverSettings::default(),
        );

        let mut response: RefOr<Response> = serde_json::from_value(json!({
            "description": "ok",
            "headers": { "X-Rate-Limit": { "$ref": "./headers.yaml#/RateLimit" } },
            "links": { "owner": { "$ref": "./links.yaml#/GetOwner" } }
        }))
        .unwrap();
        process_response(&mut ctx, &mut response).unwrap();

        let inline = response.as_inline().unwrap();
        assert_eq!(
            inline.headers["X-Rate-Limit"].ref_location(),
            Some("#/components/headers/RateLimit")
        );
        assert_eq!(
            inline.links["owner"].ref_location(),
            Some("#/components/links/GetOwner")
        );

        let link = components.links["GetOwner"].as_inline().unwrap();
        assert_eq!(
            link.headers["Trace"].ref_location(),
            Some("#/components/headers/RateLimit")
        );
        assert_eq!(components.headers.len(), 1);
    }
}
