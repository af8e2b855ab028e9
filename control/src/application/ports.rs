//! Port trait definitions for the Application layer.
//!
//! Ports are the contracts infrastructure must fulfill. This file imports
//! only from `crate::domain` and `salt_common`, never from `crate::infra`.

use std::path::PathBuf;
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use salt_common::{CommandEnvelope, CommandResult};

use crate::domain::{
    ExecError, ExecOutput, SaltError, SettingsLayer, SshCredential, wrap_with_retry,
};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so the ssh transport can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output with the runner's default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration)
    -> Result<Output>;
}

// ── Salt Dispatch Port ────────────────────────────────────────────────────────

/// Sends one command envelope to the fleet and decodes the per-target result.
///
/// The fleet facade is generic over this seam; the production implementation
/// is the authenticated salt-api session client.
#[allow(async_fn_in_trait)]
pub trait Dispatcher {
    /// # Errors
    ///
    /// Returns `SaltError` on authentication, HTTP status, transport or
    /// decoding failures. Targets missing from the result are not errors.
    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<CommandResult, SaltError>;
}

impl<D: Dispatcher> Dispatcher for Arc<D> {
    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<CommandResult, SaltError> {
        (**self).dispatch(envelope).await
    }
}

impl<D: Dispatcher> Dispatcher for &D {
    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<CommandResult, SaltError> {
        (**self).dispatch(envelope).await
    }
}

// ── Remote Shell Port ─────────────────────────────────────────────────────────

/// Runs shell commands on hosts that have no minion yet.
#[allow(async_fn_in_trait)]
pub trait RemoteExecutor {
    /// Run `command` on `host` as the privileged remote user.
    ///
    /// # Errors
    ///
    /// `ExecError::Transport` when the host could not be reached or the
    /// credential was rejected; `ExecError::CommandFailed` when the command
    /// ran and exited non-zero.
    async fn execute(
        &self,
        host: &str,
        command: &str,
        credential: &SshCredential,
    ) -> Result<ExecOutput, ExecError>;

    /// Wrap `command` in a bounded shell retry loop, then [`execute`](Self::execute) it.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute). A `CommandFailed` here means every
    /// attempt inside the loop failed.
    async fn execute_with_retry(
        &self,
        host: &str,
        command: &str,
        attempts: u32,
        credential: &SshCredential,
    ) -> Result<ExecOutput, ExecError> {
        let wrapped = wrap_with_retry(command, attempts);
        self.execute(host, &wrapped, credential).await
    }
}

// ── Settings Store Port ───────────────────────────────────────────────────────

/// Persists saved connection settings between runs.
pub trait SettingsStore {
    /// Load the saved settings. Returns `Ok(None)` when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<SettingsLayer>>;

    /// Save settings, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, settings: &SettingsLayer) -> Result<()>;

    /// Where the settings live.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
