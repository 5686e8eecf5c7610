//! TCP listener binding.
//!
//! # Responsibilities
//! - Accept `host:port`, `ip:port` and the bare `:port` form
//! - Bind before any request is served; failure is fatal at startup

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Expand `:8080` to `0.0.0.0:8080`; other forms pass through.
pub fn normalize_listen_address(listen: &str) -> String {
    if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    }
}

/// Bind a TCP listener on the configured address.
pub async fn bind(listen: &str) -> Result<TcpListener, ListenerError> {
    let address = normalize_listen_address(listen);
    let listener = TcpListener::bind(address.as_str())
        .await
        .map_err(|source| ListenerError::Bind {
            address: address.clone(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}
