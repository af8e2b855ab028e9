//! Shared test helpers: recording mocks and output constructors.

#![allow(dead_code)]

use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use salt_common::{CommandEnvelope, CommandResponse, CommandResult};
use salt_control::application::{CommandRunner, Dispatcher};
use salt_control::domain::SaltError;
use serde_json::Value;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code.
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

pub fn output(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

// ── MockCommandRunner ────────────────────────────────────────────────────────

/// A `CommandRunner` that records every `(program, args, timeout)` call and
/// returns a canned result.
#[derive(Clone)]
pub struct MockCommandRunner {
    calls: Arc<Mutex<Vec<(String, Vec<String>, Duration)>>>,
    result: Arc<dyn Fn() -> Result<Output> + Send + Sync>,
}

impl MockCommandRunner {
    pub fn returning(code: i32, stdout: &'static str, stderr: &'static str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: Arc::new(move || Ok(output(code, stdout, stderr))),
        }
    }

    pub fn failing(msg: &'static str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: Arc::new(move || anyhow::bail!("{msg}")),
        }
    }

    pub fn recorded_calls(&self) -> Vec<(String, Vec<String>, Duration)> {
        self.calls.lock().expect("mutex poisoned").clone()
    }

    /// Arguments of the only recorded call.
    pub fn single_call_args(&self) -> Vec<String> {
        let calls = self.recorded_calls();
        assert_eq!(calls.len(), 1, "expected exactly one call, got {calls:?}");
        calls[0].1.clone()
    }
}

impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::ZERO).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        self.calls.lock().expect("mutex poisoned").push((
            program.to_owned(),
            args.iter().map(|s| (*s).to_string()).collect(),
            timeout,
        ));
        (self.result)()
    }
}

// ── RecordingDispatcher ──────────────────────────────────────────────────────

/// A `Dispatcher` that records every envelope and answers with a canned
/// `return` map.
#[derive(Clone)]
pub struct RecordingDispatcher {
    envelopes: Arc<Mutex<Vec<CommandEnvelope>>>,
    reply: Arc<Mutex<Value>>,
}

impl RecordingDispatcher {
    pub fn replying(reply: Value) -> Self {
        Self {
            envelopes: Arc::default(),
            reply: Arc::new(Mutex::new(reply)),
        }
    }

    pub fn envelopes(&self) -> Vec<CommandEnvelope> {
        self.envelopes.lock().expect("mutex poisoned").clone()
    }

    pub fn last(&self) -> CommandEnvelope {
        self.envelopes().pop().expect("no envelope dispatched")
    }
}

impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<CommandResult, SaltError> {
        self.envelopes.lock().expect("mutex poisoned").push(envelope);
        let reply = self.reply.lock().expect("mutex poisoned").clone();
        let response: CommandResponse =
            serde_json::from_value(serde_json::json!({ "return": [reply] }))
                .map_err(|e| SaltError::decode("mock reply", e))?;
        Ok(response.into())
    }
}
