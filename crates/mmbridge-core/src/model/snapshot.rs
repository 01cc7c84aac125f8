use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Module, ModuleUpdate, MonitorStatus};

/// Everything one successful refresh cycle learned about the mirror.
///
/// Built once per cycle and shared as `Arc<StatusSnapshot>`. A newer
/// cycle replaces it wholesale; it is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub monitor: MonitorStatus,
    /// Backlight level 0–100, `None` when the mirror did not report one.
    pub brightness: Option<u8>,
    /// Whether the mirror software itself has an update.
    pub update_available: bool,
    pub modules: Vec<Module>,
    pub module_updates: Vec<ModuleUpdate>,
    pub fetched_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn module_update(&self, name: &str) -> Option<&ModuleUpdate> {
        self.module_updates.iter().find(|u| u.module == name)
    }

    /// Pair each configured module with its update entry, by name.
    ///
    /// Modules without an update entry and updates for modules that are
    /// not configured are both skipped. A module configured several
    /// times pairs once, at its first instance.
    pub fn correlated_updates(&self) -> Vec<(&Module, &ModuleUpdate)> {
        let mut seen = std::collections::HashSet::new();
        self.modules
            .iter()
            .filter(|m| seen.insert(m.name.as_str()))
            .filter_map(|m| self.module_update(&m.name).map(|u| (m, u)))
            .collect()
    }

    /// Number of modules with a pending update.
    pub fn pending_updates(&self) -> usize {
        self.module_updates
            .iter()
            .filter(|u| u.update_available)
            .count()
    }
}
