//! Startup configuration resolution.
//!
//! Fail fast: an empty base URL or listen address stops the process before
//! the listener is bound.

use std::path::Path;

use crate::config::loader::{read_config, ConfigError};
use crate::config::{validate_config, ForwarderConfig};

/// Combine the optional config file with command-line values and validate.
pub fn resolve_config(
    file: Option<&Path>,
    base_url: Option<String>,
    listen: Option<String>,
) -> Result<ForwarderConfig, ConfigError> {
    let config = match file {
        Some(path) => read_config(path)?,
        None => ForwarderConfig::default(),
    }
    .merge_overrides(base_url, listen);

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        base_url = %config.upstream.base_url,
        listen = %config.listener.listen,
        "Configuration loaded"
    );
    Ok(config)
}
