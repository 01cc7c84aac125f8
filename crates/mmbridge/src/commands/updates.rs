//! Update listing and installation handlers.

use serde::Serialize;
use tabled::Tabled;

use mmbridge_core::{Coordinator, EntityKey, EntityState, UpdateState};

use crate::cli::{GlobalOpts, InstallArgs, UpdatesArgs, UpdatesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

const MIRROR: &str = "MagicMirror";

#[derive(Serialize)]
struct UpdateView {
    name: String,
    #[serde(flatten)]
    state: UpdateState,
}

#[derive(Tabled)]
struct UpdateRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Release")]
    release: String,
}

impl UpdateRow {
    fn new(v: &UpdateView, color: bool) -> Self {
        Self {
            name: v.name.clone(),
            installed: output::paint_state(
                &v.state.installed_version,
                !v.state.update_available(),
                color,
            ),
            latest: v.state.latest_version.clone(),
            release: v.state.release_url.clone().unwrap_or_default(),
        }
    }
}

fn update_state(coordinator: &Coordinator, key: &EntityKey) -> Option<UpdateState> {
    match coordinator.entity_state(key) {
        Some(EntityState::Update(state)) => Some(state),
        _ => None,
    }
}

/// The mirror itself first, then each module that has an update entry.
fn update_views(coordinator: &Coordinator) -> Vec<UpdateView> {
    let Some(snapshot) = coordinator.snapshot() else {
        return Vec::new();
    };

    let mirror = update_state(coordinator, &EntityKey::MirrorUpdate).map(|state| UpdateView {
        name: MIRROR.into(),
        state,
    });
    let modules = snapshot.correlated_updates().into_iter().filter_map(|(m, _)| {
        update_state(coordinator, &EntityKey::ModuleUpdate(m.name.clone())).map(|state| {
            UpdateView {
                name: m.name.clone(),
                state,
            }
        })
    });

    mirror.into_iter().chain(modules).collect()
}

pub async fn handle(
    coordinator: &Coordinator,
    args: UpdatesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UpdatesCommand::List => {
            coordinator.request_refresh().await?;
            let color = output::should_color(&global.color);
            let views = update_views(coordinator);
            let out = output::render_list(
                &global.output,
                &views,
                |v| UpdateRow::new(v, color),
                |v| v.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UpdatesCommand::Install { name } => {
            // Release URL for the override comes from the snapshot
            if let Err(e) = coordinator.request_refresh().await {
                tracing::debug!(error = %e, "refresh before update failed");
            }
            coordinator.install_module_update(&name).await?;
            util::ack(global, &format!("Module '{name}' updated"));
            Ok(())
        }
    }
}

pub async fn install(
    coordinator: &Coordinator,
    args: InstallArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator.install_module(&args.url).await?;
    util::ack(global, &format!("Installed module from {}", args.url));
    Ok(())
}
