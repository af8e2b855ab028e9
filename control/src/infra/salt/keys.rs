//! Minion key management through wheel-mode calls.
//!
//! Same endpoint, token and 401 policy as command dispatch.

use salt_common::{KEY_ACCEPT, KEY_LIST_ALL, KeySet, WheelRequest};
use serde_json::Value;

use crate::domain::SaltError;
use crate::infra::salt::client::SaltClient;

impl SaltClient {
    /// Accept the pending key of `minion_id`.
    ///
    /// # Errors
    ///
    /// `SaltError::Wheel` when the master reports `success: false`, plus the
    /// usual auth, status and transport errors.
    pub async fn accept_key(&self, minion_id: &str) -> Result<(), SaltError> {
        let request = WheelRequest::new(KEY_ACCEPT).with_match(minion_id);
        let body = self.post_authenticated(KEY_ACCEPT, &request).await?;
        // Older proxies reply with an empty or non-JSON body.
        let failure = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| wheel_failure(&value));
        if let Some(detail) = failure {
            return Err(SaltError::Wheel {
                fun: KEY_ACCEPT.to_string(),
                detail,
            });
        }
        tracing::info!(minion = minion_id, "accepted minion key");
        Ok(())
    }

    /// Every registration key grouped by state.
    ///
    /// # Errors
    ///
    /// `SaltError::Decode` if the body is not JSON, plus the usual auth,
    /// status and transport errors.
    pub async fn list_keys(&self) -> Result<KeySet, SaltError> {
        let request = WheelRequest::new(KEY_LIST_ALL);
        let body = self.post_authenticated(KEY_LIST_ALL, &request).await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| SaltError::decode("decoding key.list_all response", e))?;
        let keys = KeySet::from_wheel_response(&value);
        tracing::debug!(
            accepted = keys.accepted().len(),
            pending = keys.pending().len(),
            "listed minion keys"
        );
        Ok(keys)
    }
}

/// Detail of an explicit `success: false` in a wheel reply.
fn wheel_failure(body: &Value) -> Option<String> {
    let data = body.get("return")?.get(0)?.get("data")?;
    if data.get("success").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    Some(match data.get("return") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "success: false".to_string(),
    })
}
