//! Monitor power and brightness handlers.

use serde::Serialize;

use mmbridge_core::{Coordinator, EntityKey, EntityState};

use crate::cli::{BrightnessArgs, GlobalOpts, MonitorArgs, MonitorCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct MonitorView {
    monitor: Option<bool>,
}

#[derive(Serialize)]
struct BrightnessView {
    brightness: Option<u8>,
}

fn print_monitor(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let view = MonitorView {
        monitor: match coordinator.entity_state(&EntityKey::MonitorPower) {
            Some(EntityState::Switch(on)) => Some(on),
            _ => None,
        },
    };
    let color = output::should_color(&global.color);
    let render = |v: &MonitorView| match v.monitor {
        Some(on) => output::paint_state(util::on_off(on), on, color),
        None => "unknown".into(),
    };
    let out = output::render_single(&global.output, &view, render, render)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    coordinator: &Coordinator,
    args: MonitorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MonitorCommand::Status => {
            coordinator.request_refresh().await?;
        }
        MonitorCommand::On => coordinator.turn_monitor_on().await?,
        MonitorCommand::Off => coordinator.turn_monitor_off().await?,
        MonitorCommand::Toggle => {
            // Toggling needs a known state to fall back on
            if let Err(e) = coordinator.request_refresh().await {
                tracing::debug!(error = %e, "refresh before toggle failed");
            }
            coordinator.toggle_monitor().await?;
        }
    }
    print_monitor(coordinator, global)
}

pub async fn brightness(
    coordinator: &Coordinator,
    args: BrightnessArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.value {
        Some(level) => {
            coordinator.set_brightness(level).await?;
            util::ack(global, &format!("Brightness set to {level}"));
            Ok(())
        }
        None => {
            coordinator.request_refresh().await?;
            let view = BrightnessView {
                brightness: match coordinator.entity_state(&EntityKey::Brightness) {
                    Some(EntityState::Level(level)) => Some(level),
                    _ => None,
                },
            };
            let render =
                |v: &BrightnessView| v.brightness.map_or_else(|| "-".into(), |b| b.to_string());
            let out = output::render_single(&global.output, &view, render, render)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
