use serde::{Deserialize, Serialize};

/// One configured module instance on the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub identifier: String,
    pub hidden: bool,
    pub position: Option<String>,
    pub header: Option<String>,
}

impl Module {
    pub fn is_visible(&self) -> bool {
        !self.hidden
    }
}

/// Update status for one installed module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleUpdate {
    /// Module name, matching [`Module::name`].
    pub module: String,
    pub update_available: bool,
    /// Upstream repository, used as the release URL.
    pub remote: Option<String>,
}

impl ModuleUpdate {
    /// `"outdated"` while an update is pending, `"latest"` otherwise.
    pub fn installed_version(&self) -> &'static str {
        if self.update_available {
            "outdated"
        } else {
            "latest"
        }
    }
}
