// ── Core error types ──
//
// User-facing errors from mmbridge-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<mmbridge_api::Error>`
// impl translates transport-layer errors into domain variants.
//
// Every variant carries owned strings only, so errors can be cloned into
// the observable refresh state and handed to each subscriber.

use std::time::Duration;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to mirror at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authorization failed: {message}")]
    AuthorizationFailed { message: String },

    /// `after` is the deadline that elapsed, when the caller knows it.
    #[error("Mirror did not answer {}", within(*.after))]
    Timeout { after: Option<Duration> },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected response from mirror: {message}")]
    Decode { message: String },

    #[error("Module not found: {name}")]
    ModuleNotFound { name: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Mirror rejected the command: {message}")]
    Rejected { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` when only a new API key can fix this.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthorizationFailed { .. })
    }
}

fn within(after: Option<Duration>) -> String {
    match after {
        Some(d) => format!("within {d:?}"),
        None => "in time".into(),
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mmbridge_api::Error> for CoreError {
    fn from(err: mmbridge_api::Error) -> Self {
        match err {
            mmbridge_api::Error::Forbidden { url } => CoreError::AuthorizationFailed {
                message: format!("{url} answered 403 -- check the API key"),
            },
            mmbridge_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { after: None }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            mmbridge_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            mmbridge_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}
