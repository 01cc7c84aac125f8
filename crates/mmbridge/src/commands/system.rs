//! Alert, system action and mirror configuration handlers.

use std::time::Duration;

use mmbridge_core::{Alert, Coordinator, CoreError, SystemAction};

use crate::cli::{AlertArgs, GlobalOpts, SystemArgs};
use crate::error::CliError;

use super::{modules, util};

pub async fn alert(
    coordinator: &Coordinator,
    args: AlertArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let alert = Alert::new(args.title, args.message)
        .with_timer(Duration::from_secs(args.timer))
        .as_notification(args.notification);
    coordinator.alert(&alert).await?;
    util::ack(global, "Alert sent");
    Ok(())
}

pub async fn handle(
    coordinator: &Coordinator,
    args: SystemArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let action = args.action;
    let prompt = match action {
        SystemAction::Shutdown => Some("Shut down the mirror? It cannot be started remotely."),
        SystemAction::Reboot => Some("Reboot the mirror?"),
        _ => None,
    };
    if let Some(message) = prompt {
        if !util::confirm(message, action.as_ref(), global.yes)? {
            return Ok(());
        }
    }

    coordinator.system(action).await;
    util::ack(global, &format!("Sent '{action}' to the mirror"));
    Ok(())
}

pub async fn mirror_config(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let answer = coordinator
        .client()
        .config()
        .await
        .map_err(CoreError::from);
    modules::print_raw(answer, "configuration", global)
}
