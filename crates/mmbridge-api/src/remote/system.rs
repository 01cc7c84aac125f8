// Remote-control system endpoints
//
// Connectivity probe, appliance configuration and fire-and-forget
// system commands.

use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::debug;

use crate::error::Error;
use crate::models::GenericResponse;
use crate::remote::client::MirrorClient;

const API_TEST: &str = "api/test";
const CONFIG: &str = "api/config";

/// Side-effecting command with no meaningful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SystemAction {
    Shutdown,
    Reboot,
    Restart,
    Refresh,
    Minimize,
    ToggleFullscreen,
    Devtools,
}

impl SystemAction {
    /// API path for this command, e.g. `api/refresh`.
    pub fn path(self) -> String {
        format!("api/{}", self.as_ref())
    }
}

impl MirrorClient {
    /// Connectivity and authorization probe.
    ///
    /// `GET /api/test`
    pub async fn api_test(&self) -> Result<GenericResponse, Error> {
        debug!("probing remote-control API");
        self.get_typed(API_TEST).await
    }

    /// The mirror's running configuration, loosely typed.
    ///
    /// `GET /api/config`
    pub async fn config(&self) -> Result<Option<Value>, Error> {
        debug!("fetching mirror config");
        self.fetch(CONFIG).await
    }

    /// Send a system command. Never fails; problems are logged.
    ///
    /// `GET /api/{action}`
    pub async fn system(&self, action: SystemAction) {
        debug!(%action, "sending system command");
        self.fire(&action.path()).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn action_paths_are_lowercase() {
        assert_eq!(SystemAction::ToggleFullscreen.path(), "api/togglefullscreen");
        assert_eq!(SystemAction::Devtools.path(), "api/devtools");
    }

    #[test]
    fn actions_parse_from_their_names() {
        for action in SystemAction::iter() {
            assert_eq!(SystemAction::from_str(action.as_ref()).unwrap(), action);
        }
    }
}
