//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;
use serde::Serialize;

use mmbridge_config::{DEFAULT_PORT, Defaults};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_secs(field: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be a number (seconds)".into(),
    })
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Config as shown to the user: plaintext keys are masked.
#[derive(Serialize)]
struct RedactedConfig<'a> {
    path: String,
    default_profile: Option<&'a str>,
    defaults: &'a Defaults,
    profiles: Vec<RedactedProfile<'a>>,
}

#[derive(Serialize)]
struct RedactedProfile<'a> {
    name: &'a str,
    host: &'a str,
    port: u16,
    api_key: Option<&'static str>,
    api_key_env: Option<&'a str>,
    timeout: Option<u64>,
    update_interval: Option<u64>,
    refresh_timeout: Option<u64>,
}

impl<'a> RedactedConfig<'a> {
    fn new(cfg: &'a Config) -> Self {
        let mut profiles: Vec<_> = cfg
            .profiles
            .iter()
            .map(|(name, p)| RedactedProfile {
                name,
                host: &p.host,
                port: p.port,
                api_key: p.api_key.as_ref().map(|_| "********"),
                api_key_env: p.api_key_env.as_deref(),
                timeout: p.timeout,
                update_interval: p.update_interval,
                refresh_timeout: p.refresh_timeout,
            })
            .collect();
        profiles.sort_by(|a, b| a.name.cmp(b.name));

        Self {
            path: config::config_path().display().to_string(),
            default_profile: cfg.default_profile.as_deref(),
            defaults: &cfg.defaults,
            profiles,
        }
    }
}

fn detail(c: &RedactedConfig<'_>) -> String {
    let mut lines = vec![
        format!("Path:            {}", c.path),
        format!("Default profile: {}", c.default_profile.unwrap_or("-")),
        format!("Output:          {}", c.defaults.output),
        format!("Timeout:         {}s", c.defaults.timeout),
        format!("Update interval: {}s", c.defaults.update_interval),
        format!("Refresh timeout: {}s", c.defaults.refresh_timeout),
    ];
    for p in &c.profiles {
        lines.push(String::new());
        lines.push(format!("[{}]", p.name));
        lines.push(format!("  Endpoint: {}:{}", p.host, p.port));
        lines.push(format!(
            "  API key:  {}",
            match (p.api_key, p.api_key_env) {
                (_, Some(var)) => format!("${var}"),
                (Some(masked), None) => masked.into(),
                (None, None) => "keyring".into(),
            }
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("mmbridge configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Mirror endpoint
            let host: String = Input::new()
                .with_prompt("Mirror host or IP")
                .interact_text()
                .map_err(prompt_err)?;

            let port: u16 = Input::new()
                .with_prompt("Remote-control port")
                .default(DEFAULT_PORT)
                .interact_text()
                .map_err(prompt_err)?;

            // 3. API key
            let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "API key cannot be empty".into(),
                });
            }

            let store_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where to store the API key?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let api_key = if store_selection == 0 {
                config::store_api_key(&profile_name, &SecretString::from(key))?;
                eprintln!("   API key stored in system keyring");
                None
            } else {
                Some(key)
            };

            // 4. Build profile and config
            let mut profile = Profile::new(host);
            profile.port = port;
            profile.api_key = api_key;
            mmbridge_config::validate_profile(&profile)?;

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            // 5. Write config
            config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: mmbridge probe");

            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let view = RedactedConfig::new(&cfg);
            let out = output::render_single(&global.output, &view, detail, |c| c.path.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));

            match key.as_str() {
                "host" => profile.host = value,
                "port" => {
                    profile.port = value.parse().map_err(|_| CliError::Validation {
                        field: "port".into(),
                        reason: "must be between 1 and 65535".into(),
                    })?;
                }
                "api_key" | "api-key" => profile.api_key = Some(value),
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "timeout" => profile.timeout = Some(parse_secs("timeout", &value)?),
                "update_interval" | "update-interval" => {
                    profile.update_interval = Some(parse_secs("update_interval", &value)?);
                }
                "refresh_timeout" | "refresh-timeout" => {
                    profile.refresh_timeout = Some(parse_secs("refresh_timeout", &value)?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: host, port, api_key, \
                             api_key_env, timeout, update_interval, refresh_timeout"
                        ),
                    });
                }
            }

            config::save_config(&cfg)?;
            eprintln!("Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.active_profile_name();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: mmbridge config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey { profile } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&cfg, profile_name));
            }

            let secret = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            config::store_api_key(&profile_name, &SecretString::from(secret))?;
            eprintln!("API key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}
