mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mmbridge_core::Coordinator;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local-only commands
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "mmbridge", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let interval = match cmd {
                Command::Watch(ref args) => args.interval(),
                _ => None,
            };
            let coordinator_config =
                config::with_interval(config::build_coordinator_config(&cli.global)?, interval);
            let coordinator = Coordinator::new(coordinator_config)?;

            tracing::debug!(command = ?cmd, host = %coordinator.client().base_url(), "running command");
            commands::dispatch(cmd, &coordinator, &cli.global)
                .await
                .map_err(|err| with_profile(err, &cli.global))
        }
    }
}

/// Name the active profile in auth failures.
fn with_profile(err: CliError, global: &cli::GlobalOpts) -> CliError {
    match err {
        CliError::AuthFailed { .. } => {
            let cfg = config::load_config_or_default();
            CliError::AuthFailed {
                profile: config::active_profile_name(global, &cfg),
            }
        }
        other => other,
    }
}
