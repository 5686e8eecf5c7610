//! Response relay back to the caller.
//!
//! # Responsibilities
//! - Mirror upstream status and headers onto the caller's response
//! - Stream the upstream body frame by frame, never buffering it whole
//! - Keep the audit guard alive until the body is finished or abandoned
//!
//! # Design Decisions
//! - Content-Length and size hints pass through untouched
//! - A mid-stream failure is logged; bytes already sent are not recalled

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Response, StatusCode};
use hyper::body::{Body as HttpBody, Bytes, Frame, Incoming, SizeHint};

use crate::http::request::copy_headers;
use crate::observability::AuditGuard;

/// Response with the given status and an empty body.
pub fn empty_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Turn the upstream response into the caller's response.
///
/// The returned body owns `audit`; the record is emitted once the body has
/// been written out, fails, or is dropped by the server.
pub fn relay_response(upstream: Response<Incoming>, mut audit: AuditGuard) -> Response<Body> {
    let (parts, body) = upstream.into_parts();

    let mut response = empty_response(parts.status);
    copy_headers(&parts.headers, response.headers_mut());
    audit.set_response(parts);

    *response.body_mut() = Body::new(AuditedBody::new(body, audit));
    response
}

/// Upstream body that reports its exchange to the audit log when released.
///
/// Field order matters: the upstream body is dropped before the guard, so the
/// connection is released before the record is written.
#[derive(Debug)]
pub struct AuditedBody {
    inner: Incoming,
    audit: AuditGuard,
    finished: bool,
    failed: bool,
}

impl AuditedBody {
    pub fn new(inner: Incoming, audit: AuditGuard) -> Self {
        Self {
            inner,
            audit,
            finished: false,
            failed: false,
        }
    }
}

impl HttpBody for AuditedBody {
    type Data = Bytes;
    type Error = hyper::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Err(e))) => {
                this.failed = true;
                tracing::error!(
                    uri = %this.audit.request().uri,
                    error = %e,
                    "handle response body failed"
                );
            }
            Poll::Ready(None) => this.finished = true,
            _ => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for AuditedBody {
    fn drop(&mut self) {
        // Server dropped us early: caller went away or the write failed.
        if !self.finished && !self.failed && !self.inner.is_end_stream() {
            tracing::error!(
                uri = %self.audit.request().uri,
                "handle response body failed: body dropped before completion"
            );
        }
    }
}
