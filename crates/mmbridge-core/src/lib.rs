// mmbridge-core: Status coordination between mmbridge-api and hosts (CLI, home automation).

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod model;
pub mod setup;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorUpdate, RefreshState, SubscriptionId};
pub use entity::{Entity, EntityKey, EntityKind, EntityState, UpdateState, discover};
pub use error::CoreError;
pub use model::{Module, ModuleUpdate, MonitorStatus, StatusSnapshot};
pub use setup::{ProbeFailure, ProbeOutcome, probe};

// Callers build connections and commands from these without a direct
// dependency on the API crate.
pub use mmbridge_api::{Alert, Connection, MirrorClient, SystemAction, TransportConfig};
