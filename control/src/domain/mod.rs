//! Domain layer: pure types, validation, and command-string builders.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `reqwest`, `std::fs`, or `std::process`. All functions are
//! synchronous and take data in, returning data out.

pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod retry;

pub use config::{SaltSettings, SettingsLayer, api_url_from_bastion, normalize_api_url};
pub use error::{AuthError, ConfigError, ExecError, SaltError};
pub use exec::{ExecOutput, SshCredential};
pub use retry::wrap_with_retry;
