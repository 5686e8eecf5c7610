//! Transparent HTTP forwarder with per-request audit logging.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ForwarderConfig;
pub use error::ForwardError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{AuditRecord, AuditSink};
