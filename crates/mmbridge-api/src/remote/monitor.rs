// Remote-control monitor endpoints
//
// Display power and backlight brightness.

use tracing::debug;

use crate::error::Error;
use crate::models::{BrightnessResponse, GenericResponse, MonitorResponse};
use crate::remote::client::MirrorClient;

const MONITOR_STATUS: &str = "api/monitor/status";
const MONITOR_ON: &str = "api/monitor/on";
const MONITOR_OFF: &str = "api/monitor/off";
const MONITOR_TOGGLE: &str = "api/monitor/toggle";
const BRIGHTNESS: &str = "api/brightness";

impl MirrorClient {
    /// Current display power state.
    ///
    /// `GET /api/monitor/status`
    pub async fn monitor_status(&self) -> Result<MonitorResponse, Error> {
        debug!("fetching monitor status");
        self.get_typed(MONITOR_STATUS).await
    }

    /// Switch the display on.
    ///
    /// `GET /api/monitor/on`
    pub async fn monitor_on(&self) -> Result<MonitorResponse, Error> {
        debug!("turning monitor on");
        self.get_typed(MONITOR_ON).await
    }

    /// Switch the display off.
    ///
    /// `GET /api/monitor/off`
    pub async fn monitor_off(&self) -> Result<MonitorResponse, Error> {
        debug!("turning monitor off");
        self.get_typed(MONITOR_OFF).await
    }

    /// `GET /api/monitor/toggle`
    pub async fn monitor_toggle(&self) -> Result<MonitorResponse, Error> {
        debug!("toggling monitor");
        self.get_typed(MONITOR_TOGGLE).await
    }

    /// Current backlight brightness.
    ///
    /// `GET /api/brightness`
    pub async fn brightness(&self) -> Result<BrightnessResponse, Error> {
        debug!("fetching brightness");
        self.get_typed(BRIGHTNESS).await
    }

    /// Set backlight brightness. The level is sent as-is; range checks
    /// belong to the caller.
    ///
    /// `GET /api/brightness/{level}`
    pub async fn set_brightness(&self, level: u8) -> Result<GenericResponse, Error> {
        debug!(level, "setting brightness");
        self.get_typed(&format!("{BRIGHTNESS}/{level}")).await
    }
}
