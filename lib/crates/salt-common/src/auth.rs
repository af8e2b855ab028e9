use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// External-authentication backend used for every login.
pub const EAUTH_PAM: &str = "pam";

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub eauth: &'a str,
}

impl<'a> LoginRequest<'a> {
    #[must_use]
    pub fn pam(username: &'a str, password: &'a str) -> Self {
        Self {
            username,
            password,
            eauth: EAUTH_PAM,
        }
    }
}

/// Body returned by `POST /login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "return", default)]
    pub grants: Vec<TokenGrant>,
}

impl LoginResponse {
    /// The first grant, which is the only one salt-api ever returns.
    #[must_use]
    pub fn into_first(self) -> Option<TokenGrant> {
        self.grants.into_iter().next()
    }
}

/// One entry of the login `return` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenGrant {
    pub token: String,
    /// Expiry as fractional seconds since the epoch.
    pub expire: f64,
    pub start: f64,
    pub user: String,
    pub eauth: String,
    /// Permissions are strings or nested maps depending on the eauth ACL.
    pub perms: Vec<Value>,
}

/// A bearer token held by an authenticated session.
///
/// `expires_at` is informational: the remote side is the only authority on
/// validity and signals expiry with a 401.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub user: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Build a token from a login grant. Returns `None` when the grant carries
    /// an empty token string.
    #[must_use]
    pub fn from_grant(grant: TokenGrant) -> Option<Self> {
        if grant.token.is_empty() {
            return None;
        }
        Some(Self {
            issued_at: epoch_seconds(grant.start),
            expires_at: epoch_seconds(grant.expire),
            value: grant.token,
            user: grant.user,
        })
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("user", &self.user)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}
