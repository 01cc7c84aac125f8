//! Probe, status and watch handlers.

use std::sync::Arc;

use chrono::Local;
use futures_util::StreamExt;
use serde::Serialize;

use mmbridge_core::{Coordinator, ProbeFailure, RefreshState, StatusSnapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util::{self, EntityRow, EntityView};

// ── Probe ───────────────────────────────────────────────────────────

pub async fn probe(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let outcome = mmbridge_core::probe(coordinator.client()).await;
    let color = output::should_color(&global.color);

    let out = output::render_single(
        &global.output,
        &outcome,
        |o| match o.reason {
            None => output::paint_state("reachable", true, color),
            Some(reason) => output::paint_error(reason.as_ref(), color),
        },
        |o| o.reason.map_or_else(|| "ok".into(), |r| r.to_string()),
    )?;
    output::print_output(&out, global.quiet);

    let url = coordinator.client().base_url().to_string();
    match outcome.reason {
        None => Ok(()),
        Some(ProbeFailure::InvalidAuth) => Err(CliError::AuthFailed {
            profile: String::new(),
        }),
        Some(ProbeFailure::CannotConnect) => Err(CliError::ConnectionFailed {
            url,
            reason: "mirror unreachable or reported failure".into(),
        }),
        Some(ProbeFailure::Unknown) => Err(CliError::ConnectionFailed {
            url,
            reason: "no usable answer from the remote-control API".into(),
        }),
    }
}

// ── Status ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusReport<'a> {
    #[serde(flatten)]
    snapshot: &'a StatusSnapshot,
    pending_updates: usize,
    entities: Vec<EntityView>,
}

fn detail(report: &StatusReport<'_>, color: bool) -> String {
    let s = report.snapshot;
    let monitor = match s.monitor.as_bool() {
        Some(on) => output::paint_state(util::on_off(on), on, color),
        None => output::paint_state("unknown", false, color),
    };
    let mirror_update = if s.update_available {
        output::paint_state("available", false, color)
    } else {
        output::paint_state("up to date", true, color)
    };

    let rows: Vec<EntityRow> = report.entities.iter().map(EntityRow::from).collect();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();

    [
        format!("Monitor:        {monitor}"),
        format!(
            "Brightness:     {}",
            s.brightness.map_or_else(|| "-".into(), |b| format!("{b}%"))
        ),
        format!("Mirror update:  {mirror_update}"),
        format!("Modules:        {}", s.modules.len()),
        format!("Module updates: {}", report.pending_updates),
        format!(
            "Fetched:        {}",
            s.fetched_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ),
        String::new(),
        table,
    ]
    .join("\n")
}

pub async fn status(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = coordinator.first_refresh().await?;
    let color = output::should_color(&global.color);

    let report = StatusReport {
        snapshot: &snapshot,
        pending_updates: snapshot.pending_updates(),
        entities: util::entity_views(coordinator),
    };
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| r.snapshot.monitor.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Watch ───────────────────────────────────────────────────────────

/// One line per finished cycle.
fn watch_line(coordinator: &Coordinator, state: &RefreshState, color: bool) -> String {
    let stamp = Local::now().format("%H:%M:%S");
    if let Some(ref err) = state.last_error {
        let mut line = format!(
            "{stamp}  {} ({} in a row)",
            output::paint_error(&err.to_string(), color),
            state.consecutive_failures
        );
        if state.reauth_required {
            line.push_str("  -- run: mmbridge config set-key");
        }
        return line;
    }

    match coordinator.snapshot() {
        Some(s) => format!(
            "{stamp}  monitor={} brightness={} modules={} updates={}",
            s.monitor,
            s.brightness.map_or_else(|| "-".into(), |b| b.to_string()),
            s.modules.len(),
            s.pending_updates(),
        ),
        None => format!("{stamp}  no status yet"),
    }
}

/// JSON line emitted per cycle by `watch -o json`.
#[derive(Serialize)]
struct CycleLine {
    cycle: u64,
    error: Option<String>,
    reauth_required: bool,
    snapshot: Option<Arc<StatusSnapshot>>,
}

fn render_cycle(
    coordinator: &Coordinator,
    state: &RefreshState,
    format: &OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        return Ok(watch_line(coordinator, state, color));
    }

    let line = CycleLine {
        cycle: state.completed_cycles,
        error: state.last_error.as_ref().map(ToString::to_string),
        reauth_required: state.reauth_required,
        snapshot: coordinator.snapshot(),
    };
    // One object per line regardless of the pretty formats
    Ok(serde_json::to_string(&line)?)
}

pub async fn watch(
    coordinator: &Coordinator,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let mut states = coordinator.state_stream();

    // A failed first fetch is reported like any other cycle.
    if let Err(e) = coordinator.first_refresh().await {
        tracing::debug!(error = %e, "initial refresh failed");
    }
    coordinator.start().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_cycle = 0;
    let mut printed = 0;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            next = states.next() => {
                let Some(state) = next else { break };
                if state.refreshing || state.completed_cycles == last_cycle {
                    continue;
                }
                last_cycle = state.completed_cycles;

                if !global.quiet {
                    println!("{}", render_cycle(coordinator, &state, &global.output, color)?);
                }

                printed += 1;
                if args.count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}
