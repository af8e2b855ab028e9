//! Application layer: port traits and use-case orchestration.
//!
//! This module depends only on `crate::domain` and `salt_common`, never on
//! `crate::infra`.

pub mod facade;
pub mod ports;
pub mod settings;

pub use facade::{Fleet, IntoArgs, OPERATIONS, Operation};
pub use ports::{CommandRunner, Dispatcher, RemoteExecutor, SettingsStore};
