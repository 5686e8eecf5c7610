//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder produces:
//!     → logging.rs (one-line error events, per-request spans)
//!     → audit.rs (one multi-line audit block per inbound request)
//!
//! Consumers:
//!     → tracing-subscriber fmt layer (stderr)
//! ```
//!
//! # Design Decisions
//! - Audit blocks go through the same tracing pipeline under the `audit` target
//! - Audit emission never fails the request path

pub mod audit;
pub mod logging;

pub use audit::{AuditGuard, AuditRecord, AuditSink, LogAuditSink, AUDIT_TARGET};
