// ── Setup probe ──
//
// The single reachability check a host runs before accepting a new
// mirror: one `api/test` round trip, classified into a form error key.

use serde::Serialize;
use strum::{AsRefStr, Display};
use tracing::{debug, warn};

use mmbridge_api::MirrorClient;

/// Why a probe failed, as a host form error key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProbeFailure {
    CannotConnect,
    InvalidAuth,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub reason: Option<ProbeFailure>,
}

impl ProbeOutcome {
    fn ok() -> Self {
        Self {
            reachable: true,
            reason: None,
        }
    }

    fn failed(reason: ProbeFailure) -> Self {
        Self {
            reachable: false,
            reason: Some(reason),
        }
    }
}

/// Probe the mirror's API. Never fails; every problem becomes a reason.
pub async fn probe(client: &MirrorClient) -> ProbeOutcome {
    match client.api_test().await {
        Ok(resp) if resp.success => {
            debug!(host = client.connection().host(), "mirror reachable");
            ProbeOutcome::ok()
        }
        Ok(_) => ProbeOutcome::failed(ProbeFailure::CannotConnect),
        Err(e) if e.is_transient() => {
            warn!(error = %e, "mirror unreachable");
            ProbeOutcome::failed(ProbeFailure::CannotConnect)
        }
        Err(e) if e.is_auth_failure() => {
            warn!(error = %e, "probe rejected");
            ProbeOutcome::failed(ProbeFailure::InvalidAuth)
        }
        Err(e) => {
            warn!(error = %e, "probe failed");
            ProbeOutcome::failed(ProbeFailure::Unknown)
        }
    }
}
