//! Module listing and visibility handlers.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use mmbridge_core::{Coordinator, CoreError, EntityKey, EntityState, Module};

use crate::cli::{GlobalOpts, ModulesArgs, ModulesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

/// A configured module with its effective visibility.
#[derive(Serialize)]
struct ModuleView {
    #[serde(flatten)]
    module: Module,
    visible: bool,
}

#[derive(Tabled)]
struct ModuleRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Header")]
    header: String,
    #[tabled(rename = "Visible")]
    visible: String,
}

impl ModuleRow {
    fn new(v: &ModuleView, color: bool) -> Self {
        Self {
            name: v.module.name.clone(),
            identifier: v.module.identifier.clone(),
            position: v.module.position.clone().unwrap_or_default(),
            header: v.module.header.clone().unwrap_or_default(),
            visible: output::paint_state(if v.visible { "yes" } else { "no" }, v.visible, color),
        }
    }
}

fn module_views(coordinator: &Coordinator) -> Vec<ModuleView> {
    let Some(snapshot) = coordinator.snapshot() else {
        return Vec::new();
    };
    snapshot
        .modules
        .iter()
        .map(|m| {
            let visible = match coordinator.entity_state(&EntityKey::Module(m.name.clone())) {
                Some(EntityState::Switch(on)) => on,
                _ => m.is_visible(),
            };
            ModuleView {
                module: m.clone(),
                visible,
            }
        })
        .collect()
}

// ── Raw endpoints ───────────────────────────────────────────────────

/// Print an untyped API answer; `None` means the mirror gave none.
pub fn print_raw(
    answer: Result<Option<Value>, CoreError>,
    what: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let value = answer?.ok_or_else(|| CliError::ApiError {
        code: "no_answer".into(),
        message: format!("the mirror returned no usable {what}"),
    })?;
    let out = output::render_single(
        &global.output,
        &value,
        |v| serde_json::to_string_pretty(v).unwrap_or_default(),
        |v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: ModulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = coordinator.client();

    match args.command {
        ModulesCommand::List => {
            coordinator.request_refresh().await?;
            let color = output::should_color(&global.color);
            let views = module_views(coordinator);
            let out = output::render_list(
                &global.output,
                &views,
                |v| ModuleRow::new(v, color),
                |v| v.module.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModulesCommand::Get { name } => {
            print_raw(client.module(&name).await.map_err(CoreError::from), "module", global)
        }

        ModulesCommand::Show { name } => {
            ensure_configured(coordinator, &name).await?;
            coordinator.show_module(&name).await?;
            util::ack(global, &format!("Module '{name}' shown"));
            Ok(())
        }

        ModulesCommand::Hide { name } => {
            ensure_configured(coordinator, &name).await?;
            coordinator.hide_module(&name).await?;
            util::ack(global, &format!("Module '{name}' hidden"));
            Ok(())
        }

        ModulesCommand::Action { name, action } => print_raw(
            client
                .module_action(&name, &action)
                .await
                .map_err(CoreError::from),
            "answer",
            global,
        ),

        ModulesCommand::Installed => print_raw(
            client.installed_modules().await.map_err(CoreError::from),
            "module list",
            global,
        ),

        ModulesCommand::Available => print_raw(
            client.available_modules().await.map_err(CoreError::from),
            "module list",
            global,
        ),

        ModulesCommand::Detailed => print_raw(
            client.modules_detailed().await.map_err(CoreError::from),
            "module list",
            global,
        ),
    }
}

/// Refuse visibility changes for modules the mirror doesn't run.
async fn ensure_configured(coordinator: &Coordinator, name: &str) -> Result<(), CliError> {
    coordinator.request_refresh().await?;
    coordinator.module(name)?;
    Ok(())
}
