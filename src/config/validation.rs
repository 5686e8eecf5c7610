//! Configuration validation.
//!
//! # Responsibilities
//! - Reject empty base URL and empty listen address before anything is served
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ForwarderConfig → Result<(), Vec<ValidationError>>
//! - The base URL is not parsed here; it is concatenated verbatim per request

use crate::config::schema::ForwarderConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("base url is empty")]
    EmptyBaseUrl,
    #[error("listen address is empty")]
    EmptyListenAddress,
}

/// Check the configuration, collecting every error.
pub fn validate_config(config: &ForwarderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.base_url.is_empty() {
        errors.push(ValidationError::EmptyBaseUrl);
    }
    if config.listener.listen.is_empty() {
        errors.push(ValidationError::EmptyListenAddress);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
