//! Outbound request construction.
//!
//! # Responsibilities
//! - Recover the request-target exactly as the caller sent it
//! - Concatenate it onto the base URL without normalization
//! - Copy headers additively, keeping every value and its order
//!
//! # Design Decisions
//! - The inbound body is handed to the outbound request as-is (never buffered)
//! - `host` and `transfer-encoding` belong to each hop's transport and are not
//!   copied; the client derives `Host` from the target URL

use axum::body::Body;
use axum::http::{header, request, HeaderMap, HeaderName, Request, Version};

/// The request-target of the inbound request line.
///
/// HTTP/1 requests carry it in the URI as received (origin-form or
/// absolute-form). HTTP/2 requests only have the `:path` part.
pub fn resource_identifier(parts: &request::Parts) -> String {
    match parts.version {
        Version::HTTP_2 | Version::HTTP_3 => parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_owned(),
        _ => parts.uri.to_string(),
    }
}

/// `base_url` followed by `resource`, byte for byte.
pub fn outbound_target(base_url: &str, resource: &str) -> String {
    let mut target = String::with_capacity(base_url.len() + resource.len());
    target.push_str(base_url);
    target.push_str(resource);
    target
}

fn is_transport_managed(name: &HeaderName) -> bool {
    *name == header::HOST || *name == header::TRANSFER_ENCODING
}

/// Append every header value from `src` onto `dst`.
///
/// Existing entries in `dst` are kept. Duplicate keys and multi-valued
/// headers come through in their original order.
pub fn copy_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for (name, value) in src {
        if is_transport_managed(name) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
}

/// Build the request sent to the upstream.
///
/// Fails when the concatenated target is not a URI the transport accepts.
pub fn build_outbound_request(
    base_url: &str,
    inbound: &request::Parts,
    body: Body,
) -> Result<Request<Body>, axum::http::Error> {
    let target = outbound_target(base_url, &resource_identifier(inbound));

    let mut outbound = Request::builder()
        .method(inbound.method.clone())
        .uri(target)
        .body(body)?;
    copy_headers(&inbound.headers, outbound.headers_mut());

    Ok(outbound)
}
