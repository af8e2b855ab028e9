use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Target expression matching every minion.
pub const DEFAULT_TARGET: &str = "*";

/// salt-api client interface a request is routed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    /// Execution modules on minions (`LocalClient`).
    #[default]
    Local,
    /// Master-side administrative functions such as key management.
    Wheel,
}

/// How the `tgt` expression is matched against minion ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    #[default]
    Glob,
    Pcre,
    List,
    Grain,
    GrainPcre,
    Pillar,
    PillarPcre,
    Nodegroup,
    Range,
    Compound,
    Ipcidr,
}

/// A single execution request sent to `POST /`.
///
/// Arguments are opaque: no arity or type checks are made against `fun`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandEnvelope {
    pub client: ClientMode,
    pub tgt: String,
    pub fun: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arg: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kwarg: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tgt_type: Option<TargetType>,
    /// Seconds the master waits for minion returns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

impl CommandEnvelope {
    /// Create a local-mode envelope. An empty `target` selects every minion.
    #[must_use]
    pub fn new(target: &str, fun: &str) -> Self {
        let tgt = if target.is_empty() {
            DEFAULT_TARGET
        } else {
            target
        };
        Self {
            client: ClientMode::Local,
            tgt: tgt.to_string(),
            fun: fun.to_string(),
            arg: Vec::new(),
            kwarg: None,
            tgt_type: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.arg = args;
        self
    }

    /// Add one keyword argument, creating the map on first use.
    #[must_use]
    pub fn with_kwarg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.kwarg
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_target_type(mut self, tgt_type: TargetType) -> Self {
        self.tgt_type = Some(tgt_type);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

/// Raw body of a `POST /` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandResponse {
    #[serde(rename = "return", default)]
    pub returns: Vec<BTreeMap<String, Value>>,
}

/// Decoded per-target results of one dispatch.
///
/// A target that is absent did not respond or was not matched. That is an
/// unknown outcome, not a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandResult {
    returns: Vec<BTreeMap<String, Value>>,
}

impl CommandResult {
    /// The populated result map (the first `return` element).
    #[must_use]
    pub fn minions(&self) -> Option<&BTreeMap<String, Value>> {
        self.returns.first()
    }

    /// Every `return` element, in the order the API sent them.
    #[must_use]
    pub fn returns(&self) -> &[BTreeMap<String, Value>] {
        &self.returns
    }

    /// Ids of the targets that answered, sorted.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.minions()
            .into_iter()
            .flat_map(|m| m.keys().map(String::as_str))
    }

    #[must_use]
    pub fn get(&self, target: &str) -> Option<&Value> {
        self.minions().and_then(|m| m.get(target))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.minions().map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Which of `expected` did not answer.
    #[must_use]
    pub fn missing<'a>(&self, expected: &[&'a str]) -> Vec<&'a str> {
        expected
            .iter()
            .copied()
            .filter(|id| self.get(id).is_none())
            .collect()
    }

    #[must_use]
    pub fn into_minions(self) -> BTreeMap<String, Value> {
        self.returns.into_iter().next().unwrap_or_default()
    }
}

impl From<CommandResponse> for CommandResult {
    fn from(response: CommandResponse) -> Self {
        Self {
            returns: response.returns,
        }
    }
}
