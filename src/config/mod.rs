//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (--baseurl, -l)
//!     → validation.rs (semantic checks)
//!     → ForwarderConfig (validated, immutable)
//!     → shared with the forwarder through AppState
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing reloads it
//! - All fields have defaults so a partial file parses; validation catches gaps
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{read_config, ConfigError};
pub use schema::{ForwarderConfig, ListenerConfig, UpstreamConfig};
pub use validation::{validate_config, ValidationError};
