use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ClientMode;

pub const KEY_ACCEPT: &str = "key.accept";
pub const KEY_LIST_ALL: &str = "key.list_all";

pub const ACCEPTED: &str = "minions";
pub const PENDING: &str = "minions_pre";
pub const REJECTED: &str = "minions_rejected";
pub const DENIED: &str = "minions_denied";

/// A wheel-mode request (master-side administrative function).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WheelRequest {
    pub client: ClientMode,
    pub fun: String,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_expr: Option<String>,
}

impl WheelRequest {
    #[must_use]
    pub fn new(fun: &str) -> Self {
        Self {
            client: ClientMode::Wheel,
            fun: fun.to_string(),
            match_expr: None,
        }
    }

    #[must_use]
    pub fn with_match(mut self, expr: &str) -> Self {
        self.match_expr = Some(expr.to_string());
        self
    }
}

/// Minion registration keys grouped by state category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet(BTreeMap<String, Vec<String>>);

impl KeySet {
    /// Normalize a wheel `key.list_all` response body.
    ///
    /// salt-api nests the categories under `return[0].data.return`; older
    /// proxies put them directly under `return[0].data`. Both are accepted.
    /// Entries that are not lists are skipped and list items are rendered as
    /// strings whatever their JSON type.
    #[must_use]
    pub fn from_wheel_response(body: &Value) -> Self {
        let Some(data) = body
            .get("return")
            .and_then(Value::as_array)
            .and_then(|r| r.first())
            .and_then(|first| first.get("data"))
        else {
            return Self::default();
        };
        let categories = match data.get("return") {
            Some(inner) if inner.is_object() => inner,
            _ => data,
        };
        let Some(map) = categories.as_object() else {
            return Self::default();
        };

        let keys = map
            .iter()
            .filter_map(|(category, ids)| {
                let ids = ids.as_array()?;
                Some((category.clone(), ids.iter().map(member_id).collect::<Vec<_>>()))
            })
            .collect();
        Self(keys)
    }

    /// Ids in `category`, empty when the category is absent.
    #[must_use]
    pub fn category(&self, category: &str) -> &[String] {
        self.0.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn accepted(&self) -> &[String] {
        self.category(ACCEPTED)
    }

    #[must_use]
    pub fn pending(&self) -> &[String] {
        self.category(PENDING)
    }

    #[must_use]
    pub fn rejected(&self) -> &[String] {
        self.category(REJECTED)
    }

    #[must_use]
    pub fn denied(&self) -> &[String] {
        self.category(DENIED)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn member_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
