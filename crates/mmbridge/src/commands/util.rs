//! Shared helpers for command handlers.

use std::io::IsTerminal;

use serde::Serialize;
use tabled::Tabled;

use mmbridge_core::{Coordinator, EntityKind, EntityState};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(std::io::Error::other)?;
    Ok(confirmed)
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn ack(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

pub fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

// ── Entity listing ──────────────────────────────────────────────────

/// One entity with its effective value, pending overrides included.
#[derive(Debug, Serialize)]
pub struct EntityView {
    pub unique_id: String,
    pub name: String,
    pub kind: EntityKind,
    pub state: Option<EntityState>,
}

#[derive(Tabled)]
pub struct EntityRow {
    #[tabled(rename = "Entity")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Unique ID")]
    unique_id: String,
}

impl From<&EntityView> for EntityRow {
    fn from(e: &EntityView) -> Self {
        Self {
            name: e.name.clone(),
            kind: e.kind.to_string(),
            state: e
                .state
                .as_ref()
                .map_or_else(|| "unavailable".into(), ToString::to_string),
            unique_id: e.unique_id.clone(),
        }
    }
}

pub fn entity_views(coordinator: &Coordinator) -> Vec<EntityView> {
    coordinator
        .entities()
        .iter()
        .map(|e| EntityView {
            unique_id: e.unique_id().to_owned(),
            name: e.name().to_owned(),
            kind: e.kind(),
            state: coordinator.entity_state(e.key()),
        })
        .collect()
}
