//! Per-request forwarding errors.
//!
//! None of these leave the request handler: each one is logged, mapped to
//! `502 Bad Gateway`, and the request is still audited.

use std::error::Error as _;

use axum::http::StatusCode;

/// Failure while forwarding a single request to the upstream.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The outbound request could not be built (bad target URI, invalid parts).
    #[error("prepare request failed: {0}")]
    BuildRequest(#[from] axum::http::Error),

    /// The outbound request could not be delivered or no response came back.
    #[error("send request failed: {0}")]
    Dispatch(#[from] hyper_util::client::legacy::Error),
}

impl ForwardError {
    /// Status returned to the caller. Every upstream-side failure looks the same.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    /// Short label for the failure point, used as the log message.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::BuildRequest(_) => "prepare request failed",
            ForwardError::Dispatch(_) => "send request failed",
        }
    }

    /// The underlying error and its sources, joined with `: `.
    ///
    /// The legacy client's own message ("client error (Connect)") is only
    /// useful together with its causes.
    pub fn report(&self) -> String {
        let mut report = match self {
            ForwardError::BuildRequest(e) => e.to_string(),
            ForwardError::Dispatch(e) => e.to_string(),
        };

        let mut source = match self {
            ForwardError::BuildRequest(e) => e.source(),
            ForwardError::Dispatch(e) => e.source(),
        };
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }

        report
    }
}
