//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Read config file → Apply flags → Validate → (bind, serve in main)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is served
//! - Listener binds only after configuration is valid

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
