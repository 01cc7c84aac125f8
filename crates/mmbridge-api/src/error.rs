use thiserror::Error;

/// Top-level error type for the `mmbridge-api` crate.
///
/// Only failures the caller must act on surface here. Non-200 statuses
/// (other than 403) are logged inside the client and reported as an
/// absent body instead.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authorization ───────────────────────────────────────────────
    /// The appliance answered HTTP 403, usually a missing or wrong API key.
    #[error("Forbidden by {url} -- check the API key")]
    Forbidden { url: String },

    // ── Transport ───────────────────────────────────────────────────
    /// The request never got an answer: refused, reset or timed out.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction failed (bad host or path).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the credential was rejected and only
    /// reconfiguration can fix it.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next polling cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    pub(crate) fn deserialization(err: &serde_json::Error, body: String) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}
