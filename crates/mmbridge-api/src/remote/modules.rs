// Remote-control module endpoints
//
// Module listing, per-module visibility and actions, the module
// catalogue and on-screen alerts.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::models::{GenericResponse, ModuleResponse};
use crate::remote::client::MirrorClient;

const MODULES: &str = "api/module";
const MODULES_DETAILED: &str = "api/modules";
const MODULES_INSTALLED: &str = "api/module/installed";
const MODULES_AVAILABLE: &str = "api/module/available";
const ALERT: &str = "api/module/alert/showalert";

/// On-screen alert shown by the mirror's alert module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    /// How long the alert stays up. Sent in whole seconds.
    pub timer: Duration,
    /// Show as a small notification rather than a full-screen alert.
    pub notification: bool,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            timer: Duration::from_secs(5),
            notification: false,
        }
    }

    pub fn with_timer(mut self, timer: Duration) -> Self {
        self.timer = timer;
        self
    }

    pub fn as_notification(mut self, notification: bool) -> Self {
        self.notification = notification;
        self
    }
}

impl MirrorClient {
    /// All configured module instances with their visibility.
    ///
    /// `GET /api/module`
    pub async fn modules(&self) -> Result<ModuleResponse, Error> {
        debug!("fetching modules");
        self.get_typed(MODULES).await
    }

    /// Raw details of one module.
    ///
    /// `GET /api/module/{name}`
    pub async fn module(&self, name: &str) -> Result<Option<Value>, Error> {
        debug!(name, "fetching module");
        let url = self.segments_url(&["api", "module", name])?;
        self.fetch_url(url).await
    }

    /// Run an arbitrary module action (`show`, `hide`, `toggle`, ...).
    ///
    /// `GET /api/module/{name}/{action}`
    pub async fn module_action(&self, name: &str, action: &str) -> Result<Option<Value>, Error> {
        debug!(name, action, "running module action");
        let url = self.segments_url(&["api", "module", name, action])?;
        self.fetch_url(url).await
    }

    /// `GET /api/module/{name}/show`
    pub async fn show_module(&self, name: &str) -> Result<GenericResponse, Error> {
        debug!(name, "showing module");
        let url = self.segments_url(&["api", "module", name, "show"])?;
        self.get_typed_url(url).await
    }

    /// `GET /api/module/{name}/hide`
    pub async fn hide_module(&self, name: &str) -> Result<GenericResponse, Error> {
        debug!(name, "hiding module");
        let url = self.segments_url(&["api", "module", name, "hide"])?;
        self.get_typed_url(url).await
    }

    /// Loosely-typed module listing including configs.
    ///
    /// `GET /api/modules`
    pub async fn modules_detailed(&self) -> Result<Option<Value>, Error> {
        self.fetch(MODULES_DETAILED).await
    }

    /// `GET /api/module/installed`
    pub async fn installed_modules(&self) -> Result<Option<Value>, Error> {
        self.fetch(MODULES_INSTALLED).await
    }

    /// `GET /api/module/available`
    pub async fn available_modules(&self) -> Result<Option<Value>, Error> {
        self.fetch(MODULES_AVAILABLE).await
    }

    /// Show an alert on the mirror.
    ///
    /// `GET /api/module/alert/showalert?title=..&message=..&timer=..[&type=notification]`
    pub async fn alert(&self, alert: &Alert) -> Result<GenericResponse, Error> {
        debug!(title = %alert.title, "showing alert");
        let mut url = self.api_url(ALERT)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("title", &alert.title)
                .append_pair("message", &alert.message)
                .append_pair("timer", &alert.timer.as_secs().to_string());
            if alert.notification {
                query.append_pair("type", "notification");
            }
        }
        self.get_typed_url(url).await
    }
}
