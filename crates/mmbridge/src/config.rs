//! Flag-aware configuration on top of `mmbridge-config`.
//!
//! Profiles come from the TOML file; `--host`, `--port`, `--api-key` and
//! `--timeout` override them. With no profile at all the flags alone
//! describe the mirror.

use std::time::Duration;

use secrecy::SecretString;

pub use mmbridge_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
    store_api_key,
};
use mmbridge_core::CoordinatorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Apply flag overrides to a stored profile.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    config: &Config,
    global: &GlobalOpts,
) -> Result<CoordinatorConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    // CLI flag first, then the profile's credential chain
    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => mmbridge_config::resolve_api_key(&profile, profile_name)?,
    };

    Ok(mmbridge_config::coordinator_config(
        &profile,
        &config.defaults,
        api_key,
    )?)
}

/// Build a `CoordinatorConfig` from the config file, profile, and CLI overrides.
pub fn build_coordinator_config(global: &GlobalOpts) -> Result<CoordinatorConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg, global);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() && global.host.is_none() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available.join(", "),
        });
    }

    // No profile found -- build from CLI flags / env vars alone
    let host = global.host.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    if global.api_key.is_none() {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    }

    let profile = Profile::new(host);
    resolve_profile(&profile, &profile_name, &cfg, global)
}

/// Polling cadence override for long-running commands.
pub fn with_interval(config: CoordinatorConfig, interval: Option<Duration>) -> CoordinatorConfig {
    match interval {
        Some(period) => config.with_update_interval(period),
        None => config,
    }
}
