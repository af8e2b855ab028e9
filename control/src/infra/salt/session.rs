//! Bearer token cache shared by every call of one session.
//!
//! The lock is held across the login round-trip, so a burst of callers that
//! find no token (or the same rejected token) produces exactly one login; the
//! others wait and reuse its result.

use std::future::Future;

use salt_common::Token;
use tokio::sync::Mutex;

use crate::domain::SaltError;

#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<Token>>,
}

impl TokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached token, if any.
    pub async fn peek(&self) -> Option<Token> {
        self.slot.lock().await.clone()
    }

    #[cfg(test)]
    pub(crate) async fn store(&self, token: Token) {
        *self.slot.lock().await = Some(token);
    }

    /// The cached token, logging in first when there is none.
    ///
    /// # Errors
    ///
    /// Propagates the login error; the cache stays empty.
    pub async fn current<F, Fut>(&self, login: F) -> Result<Token, SaltError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token, SaltError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let token = login().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Replace `stale` after the server rejected it.
    ///
    /// If another caller already swapped in a different token, that one is
    /// returned without logging in again.
    ///
    /// # Errors
    ///
    /// Propagates the login error; the stale token is left in place.
    pub async fn refresh<F, Fut>(&self, stale: &Token, login: F) -> Result<Token, SaltError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token, SaltError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref().filter(|t| t.value != stale.value) {
            return Ok(token.clone());
        }
        let token = login().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Log in unconditionally and cache the result.
    ///
    /// # Errors
    ///
    /// Propagates the login error; any previous token is kept.
    pub async fn replace_with<F, Fut>(&self, login: F) -> Result<Token, SaltError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token, SaltError>>,
    {
        let mut slot = self.slot.lock().await;
        let token = login().await?;
        *slot = Some(token.clone());
        Ok(token)
    }
}
