//! Value types for remote shell execution.

use std::path::PathBuf;

/// Private key used to authenticate an ssh execution.
#[derive(Clone)]
pub enum SshCredential {
    /// Path to an existing private key file.
    KeyFile(PathBuf),
    /// PEM/OpenSSH key material held in memory (e.g. from a secret store).
    KeyMaterial(String),
}

impl std::fmt::Debug for SshCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
            Self::KeyMaterial(_) => f.write_str("KeyMaterial(<redacted>)"),
        }
    }
}

/// Captured output of a remote command that exited 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}
