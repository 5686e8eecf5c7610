//! Per-request audit records.
//!
//! # Responsibilities
//! - Render the inbound request and upstream response into one text block
//! - Emit exactly one block per inbound request, on every exit path
//!
//! # Layout
//! ```text
//! Request Details:
//! --------------------------> Request Method: GET  URI: /path?query
//! --------------------------> Headers:
//! { ...inbound headers as JSON... }
//! --------------------------> Response Status Code: 200
//! --------------------------> Headers:
//! { ...upstream headers as JSON... }
//! <<<<=======================
//! ```
//!
//! A request that never got an upstream response reports status `0` and `{}`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::http::{request, response, HeaderMap, Method, StatusCode};

use crate::http::request::resource_identifier;

/// Tracing target for audit blocks.
pub const AUDIT_TARGET: &str = "audit";

/// Status reported when no upstream response was obtained.
pub const ABSENT_STATUS: u16 = 0;

/// One inbound/upstream exchange, ready to render.
#[derive(Debug, Clone, Copy)]
pub struct AuditRecord<'a> {
    pub method: &'a Method,
    pub uri: &'a str,
    pub request_headers: &'a HeaderMap,
    pub response: Option<(StatusCode, &'a HeaderMap)>,
}

impl AuditRecord<'_> {
    /// Upstream status code, or [`ABSENT_STATUS`].
    pub fn status_code(&self) -> u16 {
        self.response
            .map(|(status, _)| status.as_u16())
            .unwrap_or(ABSENT_STATUS)
    }
}

impl fmt::Display for AuditRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request_headers = headers_to_json(self.request_headers);
        let response_headers = match self.response {
            Some((_, headers)) => headers_to_json(headers),
            None => headers_to_json(&HeaderMap::new()),
        };

        writeln!(f, "Request Details:")?;
        writeln!(
            f,
            "--------------------------> Request Method: {}  URI: {}",
            self.method, self.uri
        )?;
        writeln!(f, "--------------------------> Headers:")?;
        writeln!(f, "{}", request_headers)?;
        writeln!(
            f,
            "--------------------------> Response Status Code: {}",
            self.status_code()
        )?;
        writeln!(f, "--------------------------> Headers:")?;
        writeln!(f, "{}", response_headers)?;
        write!(f, "<<<<=======================")
    }
}

/// Pretty-print a header multimap as `{"name": ["v1", "v2"]}`.
///
/// Keys are sorted; values keep their order. On serialization failure the
/// error description is returned in place of the JSON.
pub fn headers_to_json(headers: &HeaderMap) -> String {
    let mut grouped: BTreeMap<&str, Vec<Cow<'_, str>>> = BTreeMap::new();
    for (name, value) in headers {
        grouped
            .entry(name.as_str())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()));
    }

    serde_json::to_string_pretty(&grouped).unwrap_or_else(|e| e.to_string())
}

/// Destination for audit records.
///
/// Implementations must not panic or block for long; they run on the
/// request's task when its response finishes.
pub trait AuditSink: Send + Sync + 'static {
    fn record(&self, record: &AuditRecord<'_>);
}

/// Writes audit records to the process log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, record: &AuditRecord<'_>) {
        tracing::info!(
            target: AUDIT_TARGET,
            method = %record.method,
            uri = %record.uri,
            status = record.status_code(),
            "{}",
            record
        );
    }
}

/// Emits the audit record for one request when dropped.
///
/// Owns the inbound request parts for the whole exchange and, once dispatch
/// succeeds, the upstream response parts. Dropping it is the only way a
/// record is produced, so each request yields exactly one.
pub struct AuditGuard {
    sink: Arc<dyn AuditSink>,
    request: request::Parts,
    response: Option<response::Parts>,
}

impl AuditGuard {
    pub fn new(sink: Arc<dyn AuditSink>, request: request::Parts) -> Self {
        Self {
            sink,
            request,
            response: None,
        }
    }

    /// Inbound request parts.
    pub fn request(&self) -> &request::Parts {
        &self.request
    }

    /// Attach the upstream response that will be reported.
    pub fn set_response(&mut self, response: response::Parts) {
        self.response = Some(response);
    }
}

impl fmt::Debug for AuditGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditGuard")
            .field("method", &self.request.method)
            .field("uri", &self.request.uri)
            .field("status", &self.response.as_ref().map(|r| r.status))
            .finish()
    }
}

impl Drop for AuditGuard {
    fn drop(&mut self) {
        let uri = resource_identifier(&self.request);
        let record = AuditRecord {
            method: &self.request.method,
            uri: &uri,
            request_headers: &self.request.headers,
            response: self
                .response
                .as_ref()
                .map(|parts| (parts.status, &parts.headers)),
        };
        self.sink.record(&record);
    }
}
