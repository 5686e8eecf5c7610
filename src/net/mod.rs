//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listen address from config
//!     → listener.rs (normalize ":PORT", bind)
//!     → Hand off to HTTP layer
//! ```

pub mod listener;

pub use listener::{bind, normalize_listen_address, ListenerError};
