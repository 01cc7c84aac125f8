use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Display power state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MonitorStatus {
    On,
    Off,
    #[default]
    Unknown,
}

impl MonitorStatus {
    /// Map the wire string; anything but `"on"`/`"off"` is `Unknown`.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("on") => Self::On,
            Some(s) if s.eq_ignore_ascii_case("off") => Self::Off,
            _ => Self::Unknown,
        }
    }

    /// `Some(true)` for on, `Some(false)` for off.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Unknown => None,
        }
    }
}

impl From<bool> for MonitorStatus {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings() {
        assert_eq!(MonitorStatus::from_wire(Some("on")), MonitorStatus::On);
        assert_eq!(MonitorStatus::from_wire(Some("OFF")), MonitorStatus::Off);
        assert_eq!(MonitorStatus::from_wire(Some("standby")), MonitorStatus::Unknown);
        assert_eq!(MonitorStatus::from_wire(None), MonitorStatus::Unknown);
    }
}
