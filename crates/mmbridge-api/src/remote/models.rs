// Remote-control API response types
//
// Every endpoint answers with a `{ "success": bool, ... }` object; the
// payload key varies (`monitor`, `result`, `data`). All types derive
// `Default` with `success = false`, which is what an absent body decodes
// to. Fields use `#[serde(default)]` liberally because module authors and
// appliance versions are inconsistent about field presence.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Generic ──────────────────────────────────────────────────────────

/// Acknowledgement for commands whose payload is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericResponse {
    #[serde(default)]
    pub success: bool,
    /// Everything besides `success` (`status`, `info`, `reason`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Monitor ──────────────────────────────────────────────────────────

/// `api/monitor/*`: `{ "success": true, "monitor": "on" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub monitor: Option<String>,
}

impl MonitorResponse {
    /// `true` only for a successful response reporting `"on"`.
    pub fn is_on(&self) -> bool {
        self.success && self.monitor.as_deref() == Some("on")
    }
}

/// `api/brightness`: `{ "success": true, "result": 75 }`.
///
/// Some appliance versions send the level as a string; both forms decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "number_or_string")]
    pub result: u16,
}

/// Boolean query such as `api/mmUpdateAvailable`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: bool,
}

// ── Modules ──────────────────────────────────────────────────────────

/// `api/module`: `{ "success": true, "data": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<ModuleEntry>,
}

/// One configured module instance on the mirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    /// Catch-all for module-specific fields (`config`, `path`, `classes`...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Updates ──────────────────────────────────────────────────────────

/// `api/updateAvailable`: one entry per installed third-party module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleUpdateResponses {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Vec<ModuleUpdateEntry>,
}

/// Update status of one module as reported by the appliance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleUpdateEntry {
    /// Module name, matching [`ModuleEntry::name`].
    pub module: String,
    /// `true` when the remote repository is ahead of the installed copy.
    #[serde(default)]
    pub result: bool,
    /// Remote repository URL, when known.
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Helpers ──────────────────────────────────────────────────────────

fn number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
