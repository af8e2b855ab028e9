//! Authenticated salt-api session client.
//!
//! One `SaltClient` is one session: it logs in lazily, caches the bearer
//! token, and on a 401 logs in again exactly once before giving up.

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use salt_common::{
    CommandEnvelope, CommandResponse, CommandResult, LoginRequest, LoginResponse, Token,
};
use serde::Serialize;

use crate::application::ports::Dispatcher;
use crate::domain::{AuthError, SaltError, SaltSettings, normalize_api_url};
use crate::infra::salt::session::TokenCache;

pub const AUTH_HEADER: &str = "X-Auth-Token";

pub struct SaltClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
    tokens: TokenCache,
}

impl SaltClient {
    /// Build a session for `settings`. No request is made until the first
    /// login or dispatch.
    ///
    /// # Errors
    ///
    /// Returns `SaltError::Config` for a malformed URL and
    /// `SaltError::Transport` if the HTTP client cannot be built.
    pub fn new(settings: &SaltSettings) -> Result<Self, SaltError> {
        let base_url = normalize_api_url(&settings.api_url)?;
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|e| SaltError::transport("building HTTP client", e))?;
        Ok(Self {
            base_url,
            username: settings.username.clone(),
            password: settings.password.clone(),
            http,
            tokens: TokenCache::new(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token currently held by the session.
    pub async fn token(&self) -> Option<Token> {
        self.tokens.peek().await
    }

    /// Log in and replace any cached token.
    ///
    /// # Errors
    ///
    /// `AuthError::LoginRejected` for a non-200 reply, `AuthError::NoToken`
    /// when the reply carries no token, `Transport`/`Decode` otherwise.
    pub async fn login(&self) -> Result<Token, SaltError> {
        self.tokens.replace_with(|| self.request_token()).await
    }

    async fn request_token(&self) -> Result<Token, SaltError> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&LoginRequest::pam(&self.username, &self.password))
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&url, e))?;
        if status != StatusCode::OK {
            return Err(AuthError::LoginRejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| SaltError::decode("decoding login response", e))?;
        let token = parsed
            .into_first()
            .and_then(Token::from_grant)
            .ok_or(AuthError::NoToken)?;
        tracing::info!(user = %token.user, expires_at = ?token.expires_at, "logged in to salt-api");
        Ok(token)
    }

    /// POST `body` to the command endpoint with the session token.
    ///
    /// A 401 triggers one re-login (shared with concurrent callers) and one
    /// retry; a second 401 is `AuthError::TokenRejected`. Any other non-2xx
    /// status is `SaltError::Dispatch` carrying the raw body.
    pub(crate) async fn post_authenticated<B: Serialize + ?Sized>(
        &self,
        fun: &str,
        body: &B,
    ) -> Result<String, SaltError> {
        let url = format!("{}/", self.base_url);
        let mut token = self.tokens.current(|| self.request_token()).await?;
        let mut retried = false;
        loop {
            let response = self
                .http
                .post(&url)
                .header(ACCEPT, "application/json")
                .header(AUTH_HEADER, &token.value)
                .json(body)
                .send()
                .await
                .map_err(|e| transport_error(&url, e))?;
            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                if retried {
                    return Err(AuthError::TokenRejected.into());
                }
                tracing::warn!(fun, "salt-api rejected the session token, logging in again");
                token = self.tokens.refresh(&token, || self.request_token()).await?;
                retried = true;
                continue;
            }
            let text = response
                .text()
                .await
                .map_err(|e| transport_error(&url, e))?;
            if !status.is_success() {
                return Err(SaltError::Dispatch {
                    fun: fun.to_string(),
                    status: status.as_u16(),
                    body: text,
                });
            }
            return Ok(text);
        }
    }
}

impl std::fmt::Debug for SaltClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Dispatcher for SaltClient {
    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<CommandResult, SaltError> {
        if envelope.fun.trim().is_empty() {
            return Err(SaltError::EmptyFunction);
        }
        tracing::debug!(
            tgt = %envelope.tgt,
            fun = %envelope.fun,
            args = envelope.arg.len(),
            "dispatching salt command"
        );
        let body = self.post_authenticated(&envelope.fun, &envelope).await?;
        let response: CommandResponse = serde_json::from_str(&body)
            .map_err(|e| SaltError::decode(format!("decoding {} response", envelope.fun), e))?;
        Ok(response.into())
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> SaltError {
    tracing::warn!(url, timeout = err.is_timeout(), error = %err, "salt-api request failed");
    SaltError::transport(format!("POST {url}"), err)
}
