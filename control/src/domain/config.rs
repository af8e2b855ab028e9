//! Salt API connection settings and their validation.
//!
//! Pure functions only. No I/O or filesystem access.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_USERNAME: &str = "saltapi";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Port salt-api listens on on the bastion host.
pub const SALT_API_PORT: u16 = 8000;

const BASTION_ADDRESS_KEYS: &[&str] = &["public_ip", "ip", "ipv4", "address", "public_address"];

// ── Settings schema ──────────────────────────────────────────────────────────

/// One source of settings (environment, saved file). Every field is optional;
/// layers are merged with [`SettingsLayer::over`].
///
/// Also the on-disk schema of `~/.salt-control/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_invalid_certs: Option<bool>,
    /// Bastion host the URL was derived from, recorded by a saved login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bastion_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
}

impl SettingsLayer {
    /// Field-by-field merge where `self` wins and `lower` fills the gaps.
    #[must_use]
    pub fn over(self, lower: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            api_url: non_empty(self.api_url).or(lower.api_url),
            username: non_empty(self.username).or(lower.username),
            password: non_empty(self.password).or(lower.password),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs.or(lower.accept_invalid_certs),
            bastion_ip: non_empty(self.bastion_ip).or(lower.bastion_ip),
            stack_name: non_empty(self.stack_name).or(lower.stack_name),
        }
    }

    /// Apply defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the URL or password is missing, the URL
    /// is not a valid http(s) URL, or the timeout is zero.
    pub fn resolve(self) -> Result<SaltSettings, ConfigError> {
        let api_url = non_empty(self.api_url).ok_or(ConfigError::MissingUrl)?;
        let password = non_empty(self.password).ok_or(ConfigError::MissingPassword)?;
        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(SaltSettings {
            api_url: normalize_api_url(&api_url)?,
            username: non_empty(self.username).unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password,
            timeout: Duration::from_secs(timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs.unwrap_or(true),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fully resolved settings for one Salt API session.
#[derive(Clone, PartialEq, Eq)]
pub struct SaltSettings {
    /// Validated base URL without a trailing slash.
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Skip TLS verification (fleet endpoints use self-signed certificates).
    pub accept_invalid_certs: bool,
}

impl SaltSettings {
    /// Settings with defaults for everything but the URL and credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `api_url` is not an http(s) URL.
    pub fn new(api_url: &str, username: &str, password: &str) -> Result<Self, ConfigError> {
        SettingsLayer {
            api_url: Some(api_url.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..SettingsLayer::default()
        }
        .resolve()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for SaltSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltSettings")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validate a base URL and strip trailing slashes.
///
/// # Errors
///
/// Returns `ConfigError::InvalidUrl` if the URL does not parse, is not
/// http(s), has no host, or carries a query or fragment.
pub fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let parsed = url::Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

/// Derive the salt-api URL from a bastion description as found in stack
/// outputs.
///
/// Accepts a plain address string, an object carrying one of
/// `public_ip`/`ip`/`ipv4`/`address`/`public_address`, or a list of node
/// objects where the bastion is named `bastion` or has the `bastion` role.
///
/// # Errors
///
/// Returns `ConfigError::NoBastion` when no address can be found.
pub fn api_url_from_bastion(value: &Value) -> Result<String, ConfigError> {
    let ip = bastion_address(value).ok_or(ConfigError::NoBastion {
        found: json_kind(value),
    })?;
    Ok(format!("http://{ip}:{SALT_API_PORT}"))
}

fn bastion_address(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Object(map) => BASTION_ADDRESS_KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find(|ip| !ip.is_empty()),
        Value::Array(nodes) => nodes.iter().find_map(|node| {
            let is_bastion = node.get("name").and_then(Value::as_str) == Some("bastion")
                || node
                    .get("roles")
                    .and_then(Value::as_array)
                    .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some("bastion")));
            if !is_bastion {
                return None;
            }
            node.get("public_ip")
                .and_then(Value::as_str)
                .filter(|ip| !ip.is_empty())
        }),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "an empty string",
        Value::Array(_) => "a node list",
        Value::Object(_) => "an object",
    }
}
