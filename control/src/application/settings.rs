//! Application service: connection settings use-cases.

use anyhow::{Context, Result};

use crate::application::ports::SettingsStore;
use crate::domain::{SaltSettings, SettingsLayer};

/// Resolve settings from the environment layer over the saved file.
///
/// # Errors
///
/// Returns an error if the saved file is unreadable, or if the merged layers
/// lack a URL or password or carry a malformed URL.
pub fn load_settings(env: SettingsLayer, store: &impl SettingsStore) -> Result<SaltSettings> {
    let saved = store.load()?.unwrap_or_default();
    let settings = env.over(saved).resolve()?;
    tracing::debug!(api_url = %settings.api_url, user = %settings.username, "resolved salt settings");
    Ok(settings)
}

/// Persist a successful login so later runs need no environment.
///
/// `bastion_ip` and `stack_name` are recorded when the URL was derived from
/// a stack's bastion host.
///
/// # Errors
///
/// Returns an error if the settings file cannot be written.
pub fn remember_login(
    store: &impl SettingsStore,
    settings: &SaltSettings,
    bastion_ip: Option<&str>,
    stack_name: Option<&str>,
) -> Result<()> {
    let layer = SettingsLayer {
        api_url: Some(settings.api_url.clone()),
        username: Some(settings.username.clone()),
        password: Some(settings.password.clone()),
        timeout_secs: Some(settings.timeout.as_secs()),
        accept_invalid_certs: Some(settings.accept_invalid_certs),
        bastion_ip: bastion_ip.map(str::to_string),
        stack_name: stack_name.map(str::to_string),
    };
    store.save(&layer).context("saving salt login")
}
