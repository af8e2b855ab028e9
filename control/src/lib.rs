//! salt-control: authenticated salt-api session client, typed fleet
//! operations, and the ssh executor used before minions exist.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod domain;
pub mod infra;

pub use application::{Dispatcher, Fleet, RemoteExecutor};
pub use domain::{AuthError, ConfigError, ExecError, SaltError, SaltSettings};
pub use infra::{SaltClient, SshExecutor};
