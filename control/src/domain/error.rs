//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `reqwest`, `std::fs` or `std::process`. Transport-level causes are
//! carried as boxed `std::error::Error` sources so callers can still walk the
//! chain.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Missing or malformed connection settings. Never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Salt API URL is required. Set SALT_API_URL or save a login first.")]
    MissingUrl,

    #[error("Salt API password is required. Set SALT_PASSWORD or save a login first.")]
    MissingPassword,

    #[error("Salt API timeout must be at least one second.")]
    ZeroTimeout,

    #[error("Invalid Salt API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Cannot find a bastion address in {found}")]
    NoBastion { found: &'static str },
}

// ── Auth errors ───────────────────────────────────────────────────────────────

/// Authentication failures. Terminal: the only automatic recovery is the
/// single re-login performed after a 401 on a command call.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login failed with status {status}: {body}")]
    LoginRejected { status: u16, body: String },

    #[error("no token returned from login")]
    NoToken,

    #[error("token rejected again after re-login")]
    TokenRejected,
}

// ── Salt API errors ───────────────────────────────────────────────────────────

/// Every failure surfaced by the Salt session client.
#[derive(Debug, Error)]
pub enum SaltError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{fun} failed with status {status}: {body}")]
    Dispatch {
        fun: String,
        status: u16,
        body: String,
    },

    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("{context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("{fun} reported failure: {detail}")]
    Wheel { fun: String, detail: String },

    #[error("command envelope has an empty function name")]
    EmptyFunction,
}

impl SaltError {
    pub fn transport(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn decode(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Dispatch { status, .. } | Self::Auth(AuthError::LoginRejected { status, .. }) => {
                Some(*status)
            }
            Self::Auth(AuthError::TokenRejected) => Some(401),
            _ => None,
        }
    }
}

// ── Remote exec errors ────────────────────────────────────────────────────────

/// Failure of a single ssh execution.
///
/// `Transport` means the command never ran to completion on the host and is
/// worth retrying at a higher level. `CommandFailed` means it ran and exited
/// non-zero, after any retry wrapping already applied.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("ssh to {host} failed: {reason}")]
    Transport { host: String, reason: String },

    #[error("command on {host} exited with status {code}: {stderr}")]
    CommandFailed {
        host: String,
        code: i32,
        stdout: String,
        stderr: String,
    },
}

impl ExecError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
