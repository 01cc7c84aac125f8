// Remote-control API client modules
//
// Hand-written client for the appliance's `api/*` endpoints. Transport
// mechanics live in `client`; each sibling file adds one endpoint family
// as inherent methods on `MirrorClient`.

pub mod client;
pub mod models;
pub mod modules;
pub mod monitor;
pub mod system;
pub mod updates;

pub use client::{Connection, MirrorClient};
pub use modules::Alert;
pub use system::SystemAction;
