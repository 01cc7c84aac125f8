// Remote-control update endpoints
//
// Update availability for the mirror itself and its third-party modules,
// plus module installation.

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::models::{FlagResponse, GenericResponse, ModuleUpdateResponses};
use crate::remote::client::MirrorClient;

const UPDATE_AVAILABLE: &str = "api/updateAvailable";
const MM_UPDATE_AVAILABLE: &str = "api/mmUpdateAvailable";
const INSTALL: &str = "api/install";

impl MirrorClient {
    /// Per-module update availability.
    ///
    /// `GET /api/updateAvailable`
    pub async fn update_available(&self) -> Result<ModuleUpdateResponses, Error> {
        debug!("fetching module update availability");
        self.get_typed(UPDATE_AVAILABLE).await
    }

    /// Whether the mirror software itself has an update.
    ///
    /// `GET /api/mmUpdateAvailable`
    pub async fn mm_update_available(&self) -> Result<FlagResponse, Error> {
        debug!("fetching mirror update availability");
        self.get_typed(MM_UPDATE_AVAILABLE).await
    }

    /// Pull the latest version of one module.
    ///
    /// `GET /api/update/{name}`
    pub async fn update_module(&self, name: &str) -> Result<GenericResponse, Error> {
        debug!(name, "updating module");
        let url = self.segments_url(&["api", "update", name])?;
        self.get_typed_url(url).await
    }

    /// Install a module from a git repository URL.
    ///
    /// `POST /api/install` with `{"url": ...}`
    pub async fn install_module(&self, repository: &str) -> Result<GenericResponse, Error> {
        debug!(repository, "installing module");
        let body = self.submit(INSTALL, &json!({ "url": repository })).await?;
        crate::remote::client::decode(body)
    }
}
