// ── API-to-domain type conversions ──
//
// Bridges raw `mmbridge_api` response types into `mmbridge_core::model`
// domain types. A response with `success = false` degrades its field to
// a neutral value with a warning; it never fails the cycle.

use chrono::Utc;
use tracing::warn;

use mmbridge_api::models::{
    BrightnessResponse, FlagResponse, ModuleEntry, ModuleResponse, ModuleUpdateEntry,
    ModuleUpdateResponses, MonitorResponse,
};

use crate::model::{Module, ModuleUpdate, MonitorStatus, StatusSnapshot};

/// Highest backlight level the mirror accepts.
pub const MAX_BRIGHTNESS: u8 = 100;

// ── Entity conversions ─────────────────────────────────────────────

impl From<ModuleEntry> for Module {
    fn from(entry: ModuleEntry) -> Self {
        Self {
            name: entry.name,
            identifier: entry.identifier,
            hidden: entry.hidden,
            position: entry.position,
            header: entry.header,
        }
    }
}

impl From<ModuleUpdateEntry> for ModuleUpdate {
    fn from(entry: ModuleUpdateEntry) -> Self {
        Self {
            module: entry.module,
            update_available: entry.result,
            remote: entry.remote.filter(|r| !r.is_empty()),
        }
    }
}

impl From<&MonitorResponse> for MonitorStatus {
    fn from(resp: &MonitorResponse) -> Self {
        if resp.success {
            MonitorStatus::from_wire(resp.monitor.as_deref())
        } else {
            MonitorStatus::Unknown
        }
    }
}

/// Clamp a reported level into 0–100.
fn brightness_level(raw: u16) -> u8 {
    if raw > u16::from(MAX_BRIGHTNESS) {
        warn!(raw, "brightness above {MAX_BRIGHTNESS} reported, clamping");
        MAX_BRIGHTNESS
    } else {
        u8::try_from(raw).unwrap_or(MAX_BRIGHTNESS)
    }
}

// ── Snapshot assembly ──────────────────────────────────────────────

/// Raw responses of one refresh cycle.
#[derive(Debug, Default)]
pub struct CycleResponses {
    pub monitor: MonitorResponse,
    pub brightness: BrightnessResponse,
    pub modules: ModuleResponse,
    pub module_updates: ModuleUpdateResponses,
    pub mirror_update: FlagResponse,
}

impl From<CycleResponses> for StatusSnapshot {
    fn from(raw: CycleResponses) -> Self {
        if !raw.monitor.success {
            warn!("failed to fetch monitor status");
        }
        if !raw.brightness.success {
            warn!("failed to fetch brightness");
        }
        if !raw.modules.success {
            warn!("failed to fetch modules");
        }
        if !raw.module_updates.success {
            warn!("failed to fetch module updates");
        }
        if !raw.mirror_update.success {
            warn!("failed to fetch mirror update status");
        }

        Self {
            monitor: MonitorStatus::from(&raw.monitor),
            brightness: raw
                .brightness
                .success
                .then(|| brightness_level(raw.brightness.result)),
            update_available: raw.mirror_update.success && raw.mirror_update.result,
            modules: if raw.modules.success {
                raw.modules.data.into_iter().map(Module::from).collect()
            } else {
                Vec::new()
            },
            module_updates: if raw.module_updates.success {
                raw.module_updates
                    .result
                    .into_iter()
                    .map(ModuleUpdate::from)
                    .collect()
            } else {
                Vec::new()
            },
            fetched_at: Utc::now(),
        }
    }
}
