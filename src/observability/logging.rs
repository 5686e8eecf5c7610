//! Structured logging.
//!
//! Uses `tracing` with an `EnvFilter`; `RUST_LOG` overrides the defaults.
//! Events go to stderr.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used by the binary when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "http_forwarder=info,audit=info,tower_http=info";

/// `RUST_LOG` if set and valid, otherwise `default_directives`.
pub fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(default_directives: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_directives))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
