//! Infrastructure layer: concrete implementations of application port traits.
//!
//! All I/O lives here: the salt-api HTTP session, process execution, ssh and
//! the saved settings file. Imports from `crate::domain` and
//! `crate::application` are allowed.

pub mod command_runner;
pub mod config;
pub mod salt;
pub mod ssh;

pub use command_runner::TokioCommandRunner;
pub use config::{YamlSettingsStore, env_layer, settings_from_env};
pub use salt::SaltClient;
pub use ssh::SshExecutor;
