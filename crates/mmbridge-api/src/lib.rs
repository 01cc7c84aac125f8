// mmbridge-api: Async Rust client for the MagicMirror remote-control API

pub mod error;
pub mod remote;
pub mod transport;

pub use error::Error;
pub use remote::models;
pub use remote::{Alert, Connection, MirrorClient, SystemAction};
pub use transport::TransportConfig;
