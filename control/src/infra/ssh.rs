//! Remote shell execution over the system `ssh` client.
//!
//! Used during bootstrap, before a host runs a minion. Each call is a single
//! non-interactive `ssh` invocation routed through the `CommandRunner` port.

use std::io::Write;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::application::ports::{CommandRunner, RemoteExecutor};
use crate::domain::{ExecError, ExecOutput, SshCredential, wrap_with_retry};
use crate::infra::command_runner::TokioCommandRunner;

pub const DEFAULT_SSH_USER: &str = "root";
pub const DEFAULT_SSH_PORT: u16 = 22;
/// Upper bound for one remote command, retry loop included.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(600);
pub const CONNECT_TIMEOUT_SECS: u32 = 15;

/// Exit status `ssh` itself uses for connection and authentication errors.
const SSH_TRANSPORT_EXIT: i32 = 255;

/// Runs commands on remote hosts as a privileged user.
pub struct SshExecutor<R> {
    runner: R,
    user: String,
    port: u16,
    timeout: Duration,
}

impl SshExecutor<TokioCommandRunner> {
    /// Executor backed by a real process runner.
    #[must_use]
    pub fn default_runner() -> Self {
        Self::new(TokioCommandRunner::new(DEFAULT_EXEC_TIMEOUT))
    }
}

impl<R: CommandRunner> SshExecutor<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            user: DEFAULT_SSH_USER.to_string(),
            port: DEFAULT_SSH_PORT,
            timeout: DEFAULT_EXEC_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn ssh_args(&self, host: &str, key: &Path, command: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            key.to_string_lossy().into_owned(),
            "-p".to_string(),
            self.port.to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
            format!("{}@{host}", self.user),
            command.to_string(),
        ]
    }
}

impl<R: CommandRunner> RemoteExecutor for SshExecutor<R> {
    async fn execute(
        &self,
        host: &str,
        command: &str,
        credential: &SshCredential,
    ) -> Result<ExecOutput, ExecError> {
        let key = KeyHandle::prepare(credential).map_err(|e| ExecError::Transport {
            host: host.to_string(),
            reason: format!("{e:#}"),
        })?;
        let args = self.ssh_args(host, key.path(), command);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();

        tracing::debug!(host, user = %self.user, port = self.port, "running remote command");
        let output = match self.runner.run_with_timeout("ssh", &argv, self.timeout).await {
            Ok(output) => output,
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!(host, %reason, "ssh transport failure");
                return Err(ExecError::Transport {
                    host: host.to_string(),
                    reason,
                });
            }
        };
        classify_output(host, &output)
    }

    async fn execute_with_retry(
        &self,
        host: &str,
        command: &str,
        attempts: u32,
        credential: &SshCredential,
    ) -> Result<ExecOutput, ExecError> {
        tracing::debug!(host, attempts, "running remote command with retry");
        let wrapped = wrap_with_retry(command, attempts);
        self.execute(host, &wrapped, credential).await
    }
}

/// Map a finished `ssh` process to the executor's outcome.
///
/// Exit 255 is reported by `ssh` for connection and authentication failures,
/// so it is treated as transport even though a remote command could in
/// principle exit with 255 too. Death by signal is also transport.
///
/// # Errors
///
/// `ExecError::Transport` or `ExecError::CommandFailed` as described above.
pub fn classify_output(host: &str, output: &Output) -> Result<ExecOutput, ExecError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    match output.status.code() {
        Some(0) => Ok(ExecOutput { stdout, stderr }),
        Some(SSH_TRANSPORT_EXIT) => {
            let reason = match stderr.trim() {
                "" => format!("ssh exited with status {SSH_TRANSPORT_EXIT}"),
                detail => detail.to_string(),
            };
            tracing::warn!(host, %reason, "ssh transport failure");
            Err(ExecError::Transport {
                host: host.to_string(),
                reason,
            })
        }
        Some(code) => Err(ExecError::CommandFailed {
            host: host.to_string(),
            code,
            stdout,
            stderr,
        }),
        None => Err(ExecError::Transport {
            host: host.to_string(),
            reason: "ssh terminated by signal".to_string(),
        }),
    }
}

/// Key file handed to `ssh -i` for the duration of one call.
enum KeyHandle<'a> {
    File(&'a Path),
    Temp(NamedTempFile),
}

impl<'a> KeyHandle<'a> {
    fn prepare(credential: &'a SshCredential) -> Result<Self> {
        match credential {
            SshCredential::KeyFile(path) => Ok(Self::File(path)),
            SshCredential::KeyMaterial(material) => {
                // NamedTempFile is created 0600 on unix
                let mut file = tempfile::Builder::new()
                    .prefix("salt-control-key-")
                    .tempfile()
                    .context("creating temporary key file")?;
                file.write_all(material.as_bytes())
                    .context("writing temporary key file")?;
                if !material.ends_with('\n') {
                    file.write_all(b"\n").context("writing temporary key file")?;
                }
                file.flush().context("writing temporary key file")?;
                Ok(Self::Temp(file))
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Temp(file) => file.path(),
        }
    }
}
