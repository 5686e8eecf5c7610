//! HTTP forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (axum fallback handler, audit guard created)
//!     → request.rs (target = base URL + request-target, header copy)
//!     → client.rs (shared client, upstream TLS not verified)
//!     → response.rs (status + header copy, body streamed, audit on finish)
//!     → caller
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{build_upstream_client, UpstreamClient};
pub use request::{build_outbound_request, copy_headers, outbound_target, resource_identifier};
pub use response::{relay_response, AuditedBody};
pub use server::{AppState, HttpServer};
