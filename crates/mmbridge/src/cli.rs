//! Clap derive structures for the `mmbridge` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mmbridge_core::SystemAction;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mmbridge -- monitor and control a MagicMirror from the command line
#[derive(Debug, Parser)]
#[command(
    name = "mmbridge",
    version,
    about = "Monitor and control a MagicMirror from the command line",
    long_about = "Polls a MagicMirror's remote-control API for monitor, brightness,\n\
        module and update status, and forwards commands back to it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Mirror profile to use
    #[arg(long, short = 'p', env = "MMBRIDGE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Mirror hostname or IP (overrides profile)
    #[arg(long, env = "MMBRIDGE_HOST", global = true)]
    pub host: Option<String>,

    /// Remote-control port (overrides profile)
    #[arg(long, env = "MMBRIDGE_PORT", global = true)]
    pub port: Option<u16>,

    /// Remote-control API key
    #[arg(long, env = "MMBRIDGE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MMBRIDGE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MMBRIDGE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the mirror is reachable and accepts the API key
    Probe,

    /// Show monitor, brightness, module and update status
    #[command(alias = "st")]
    Status,

    /// Poll the mirror and print each refresh until interrupted
    Watch(WatchArgs),

    /// Control the display power
    #[command(alias = "mon")]
    Monitor(MonitorArgs),

    /// Show or set the backlight brightness
    Brightness(BrightnessArgs),

    /// List modules and change their visibility
    #[command(alias = "mod")]
    Modules(ModulesArgs),

    /// List and install module updates
    Updates(UpdatesArgs),

    /// Install a new module from a git repository
    Install(InstallArgs),

    /// Show an alert on the mirror
    Alert(AlertArgs),

    /// Send a system command (restart, reboot, ...)
    #[command(alias = "sys")]
    System(SystemArgs),

    /// Dump the mirror's running configuration
    MirrorConfig,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many refreshes
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

impl WatchArgs {
    pub fn interval(&self) -> Option<Duration> {
        self.interval.map(Duration::from_secs)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MONITOR & BRIGHTNESS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MonitorArgs {
    #[command(subcommand)]
    pub command: MonitorCommand,
}

#[derive(Debug, Subcommand)]
pub enum MonitorCommand {
    /// Show the current display power state
    Status,
    /// Turn the display on
    On,
    /// Turn the display off
    Off,
    /// Toggle the display
    Toggle,
}

#[derive(Debug, Args)]
pub struct BrightnessArgs {
    /// New level (0-100); omit to show the current level
    pub value: Option<u8>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MODULES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ModulesArgs {
    #[command(subcommand)]
    pub command: ModulesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModulesCommand {
    /// List configured modules
    #[command(alias = "ls")]
    List,

    /// Show raw details of one module
    Get {
        /// Module name (e.g. "clock")
        name: String,
    },

    /// Make a module visible
    Show {
        /// Module name
        name: String,
    },

    /// Hide a module
    Hide {
        /// Module name
        name: String,
    },

    /// Run an arbitrary module action
    Action {
        /// Module name
        name: String,
        /// Action understood by the module (e.g. "toggle")
        action: String,
    },

    /// List installed third-party modules
    Installed,

    /// List modules available for installation
    Available,

    /// Dump every module with its full configuration
    Detailed,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UPDATES & INSTALL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UpdatesArgs {
    #[command(subcommand)]
    pub command: UpdatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum UpdatesCommand {
    /// List update status for the mirror and each module
    #[command(alias = "ls")]
    List,

    /// Pull the latest version of one module
    Install {
        /// Module name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Git repository URL of the module
    pub url: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALERT & SYSTEM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AlertArgs {
    /// Alert title
    #[arg(long, short = 't')]
    pub title: String,

    /// Alert body
    #[arg(long, short = 'm')]
    pub message: String,

    /// Seconds the alert stays on screen
    #[arg(long, default_value = "5")]
    pub timer: u64,

    /// Show as a small notification instead of a full alert
    #[arg(long)]
    pub notification: bool,
}

#[derive(Debug, Args)]
pub struct SystemArgs {
    /// shutdown, reboot, restart, refresh, minimize, togglefullscreen or devtools
    pub action: SystemAction,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG & COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Set a key on the active profile
    Set {
        /// host, port, api_key, api_key_env, timeout, update_interval or refresh_timeout
        key: String,
        /// New value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API key in the system keyring
    SetKey {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
