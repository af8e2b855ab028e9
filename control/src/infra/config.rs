//! Infrastructure implementation of the `SettingsStore` port, plus the
//! environment settings layer.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use crate::application::ports::SettingsStore;
use crate::application::settings::load_settings;
use crate::domain::{SaltSettings, SettingsLayer};

/// Prefix of every environment variable read by [`env_layer`].
pub const ENV_PREFIX: &str = "SALT_";
/// Overrides the saved settings path.
pub const CONFIG_PATH_ENV: &str = "SALT_CONTROL_CONFIG";

/// Read `SALT_API_URL`, `SALT_USERNAME`, `SALT_PASSWORD`, `SALT_TIMEOUT_SECS`
/// and `SALT_ACCEPT_INVALID_CERTS`. Unset variables stay `None`.
///
/// # Errors
///
/// Returns an error if a variable is set but cannot be parsed (e.g. a
/// non-numeric timeout).
pub fn env_layer() -> Result<SettingsLayer> {
    envy::prefixed(ENV_PREFIX)
        .from_env::<SettingsLayer>()
        .context("invalid SALT_* environment variable")
}

/// Environment over `~/.salt-control/config.yaml`, validated.
///
/// # Errors
///
/// Returns an error if either source is unreadable or the merged settings
/// are incomplete.
pub fn settings_from_env() -> Result<SaltSettings> {
    load_settings(env_layer()?, &YamlSettingsStore::new())
}

/// Saved settings as YAML on disk.
///
/// Defaults to `~/.salt-control/config.yaml`; `SALT_CONTROL_CONFIG` or
/// [`YamlSettingsStore::at`] select another file.
#[derive(Debug, Clone, Default)]
pub struct YamlSettingsStore {
    path: Option<PathBuf>,
}

impl YamlSettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pinned to `path`, ignoring the environment.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl SettingsStore for YamlSettingsStore {
    fn load(&self) -> Result<Option<SettingsLayer>> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let layer = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        Ok(Some(layer))
    }

    fn save(&self, settings: &SettingsLayer) -> Result<()> {
        let path = self.path()?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
        let content = serde_yaml::to_string(settings).context("cannot serialize settings")?;

        // Staged 0600 and renamed over the target; an older file's mode does not survive.
        let mut staged = tempfile::NamedTempFile::new_in(&parent)
            .with_context(|| format!("cannot stage settings in {}", parent.display()))?;
        staged
            .write_all(content.as_bytes())
            .with_context(|| format!("cannot write {}", staged.path().display()))?;
        staged
            .persist(&path)
            .map_err(|err| err.error)
            .with_context(|| format!("cannot write {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved salt settings");
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".salt-control").join("config.yaml"))
    }
}
