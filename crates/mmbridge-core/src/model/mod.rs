// ── Domain model ──
//
// Typed view of the mirror's state, independent of the wire format.

mod module;
mod monitor;
mod snapshot;

pub use module::{Module, ModuleUpdate};
pub use monitor::MonitorStatus;
pub use snapshot::StatusSnapshot;
