//! Upstream HTTP client.
//!
//! One client is built at startup and cloned into every handler; clones share
//! the connection pool. Upstream certificates are accepted without
//! verification so self-signed or expired backends can be fronted.

use axum::body::Body;
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client used for every outbound request.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the shared upstream client.
///
/// Plain `http://` and `https://` targets are both supported. For TLS, neither
/// the certificate chain nor the hostname is checked.
pub fn build_upstream_client() -> Result<UpstreamClient, native_tls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()?;
    let https = HttpsConnector::from((http, tokio_native_tls::TlsConnector::from(tls)));

    Ok(Client::builder(TokioExecutor::new()).build(https))
}
