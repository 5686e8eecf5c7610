//! HTTP server setup and the forwarding handler.
//!
//! # Responsibilities
//! - Create the Axum Router; every request, any method or path, is forwarded
//! - Wire up middleware (tracing spans)
//! - Build and dispatch the outbound request, relay the response
//! - Guarantee one audit record per request on every exit path

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ForwarderConfig;
use crate::error::ForwardError;
use crate::http::client::{build_upstream_client, UpstreamClient};
use crate::http::request::build_outbound_request;
use crate::http::response::{empty_response, relay_response};
use crate::observability::{AuditGuard, AuditSink, LogAuditSink};

/// Application state injected into handlers.
///
/// Read-only after startup; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub base_url: Arc<str>,
    pub client: UpstreamClient,
    pub audit_sink: Arc<dyn AuditSink>,
}

/// HTTP server for the forwarder.
pub struct HttpServer {
    router: Router,
    config: ForwarderConfig,
}

impl HttpServer {
    /// Create a server that audits to the process log.
    pub fn new(config: ForwarderConfig) -> Result<Self, native_tls::Error> {
        Self::with_audit_sink(config, Arc::new(LogAuditSink))
    }

    /// Create a server with a custom audit destination.
    pub fn with_audit_sink(
        config: ForwarderConfig,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Result<Self, native_tls::Error> {
        let state = AppState {
            base_url: Arc::from(config.upstream.base_url.as_str()),
            client: build_upstream_client()?,
            audit_sink,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(forward_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving the server without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Forward one request to the upstream and relay its response.
///
/// The audit guard is created first and dropped last: on failure when this
/// function returns, on success when the relayed body is released.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let audit = AuditGuard::new(state.audit_sink.clone(), parts);

    let outbound = match build_outbound_request(&state.base_url, audit.request(), body) {
        Ok(outbound) => outbound,
        Err(e) => return fail(ForwardError::from(e), &audit),
    };

    tracing::debug!(
        method = %outbound.method(),
        target_url = %outbound.uri(),
        "Forwarding request"
    );

    match state.client.request(outbound).await {
        Ok(upstream) => relay_response(upstream, audit),
        Err(e) => fail(ForwardError::from(e), &audit),
    }
}

fn fail(err: ForwardError, audit: &AuditGuard) -> Response {
    tracing::error!(
        method = %audit.request().method,
        uri = %audit.request().uri,
        error = %err.report(),
        "{}",
        err.kind()
    );
    empty_response(err.status())
}
