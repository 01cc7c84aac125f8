//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod config_cmd;
pub mod modules;
pub mod monitor;
pub mod status;
pub mod system;
pub mod updates;
pub mod util;

use mmbridge_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a mirror-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Probe => status::probe(coordinator, global).await,
        Command::Status => status::status(coordinator, global).await,
        Command::Watch(args) => status::watch(coordinator, args, global).await,
        Command::Monitor(args) => monitor::handle(coordinator, args, global).await,
        Command::Brightness(args) => monitor::brightness(coordinator, args, global).await,
        Command::Modules(args) => modules::handle(coordinator, args, global).await,
        Command::Updates(args) => updates::handle(coordinator, args, global).await,
        Command::Install(args) => updates::install(coordinator, args, global).await,
        Command::Alert(args) => system::alert(coordinator, args, global).await,
        Command::System(args) => system::handle(coordinator, args, global).await,
        Command::MirrorConfig => system::mirror_config(coordinator, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
