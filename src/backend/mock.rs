//! Scriptable backend for deterministic testing
//!
//! Implements [`Backend`] by replaying configured responses per command and
//! capturing every invocation for later verification.
//!
//! # Example
//! ```no_run
//! use branchdeck::backend::{Command, MockBackend};
//!
//! let backend = MockBackend::new()
//!     .with_response(Command::IsCommitReachable, r#"{"is_reachable": true}"#);
//! assert_eq!(backend.call_count(Command::IsCommitReachable), 0);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Backend, BackendFailure, Command};

/// A scripted reply
pub type MockResponse = Result<String, BackendFailure>;

#[derive(Default)]
struct Script {
    /// One-shot responses, consumed in order before the sticky one
    queued: VecDeque<MockResponse>,
    /// Response returned once the queue is empty
    sticky: Option<MockResponse>,
}

/// Mock backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    scripts: Arc<Mutex<HashMap<Command, Script>>>,
    /// Captured invocations, in call order
    captured_calls: Arc<Mutex<Vec<(Command, serde_json::Value)>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call of `command` with `payload`
    pub fn with_response(self, command: Command, payload: impl Into<String>) -> Self {
        self.scripts.lock().entry(command).or_default().sticky = Some(Ok(payload.into()));
        self
    }

    /// Answer every call of `command` with `payload` serialized as JSON
    pub fn with_json(self, command: Command, payload: &serde_json::Value) -> Self {
        self.with_response(command, payload.to_string())
    }

    /// Fail every call of `command`
    pub fn with_failure(self, command: Command, failure: BackendFailure) -> Self {
        self.scripts.lock().entry(command).or_default().sticky = Some(Err(failure));
        self
    }

    /// Answer the next call of `command` with `response`, ahead of any
    /// sticky response
    pub fn push(&self, command: Command, response: MockResponse) {
        self.scripts
            .lock()
            .entry(command)
            .or_default()
            .queued
            .push_back(response);
    }

    /// All captured calls
    pub fn calls(&self) -> Vec<(Command, serde_json::Value)> {
        self.captured_calls.lock().clone()
    }

    /// Arguments of every call of `command`
    pub fn calls_to(&self, command: Command) -> Vec<serde_json::Value> {
        self.captured_calls
            .lock()
            .iter()
            .filter(|(called, _)| *called == command)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn call_count(&self, command: Command) -> usize {
        self.captured_calls
            .lock()
            .iter()
            .filter(|(called, _)| *called == command)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.captured_calls.lock().len()
    }

    fn next_response(&self, command: Command) -> MockResponse {
        let mut scripts = self.scripts.lock();
        let Some(script) = scripts.get_mut(&command) else {
            return Err(BackendFailure::new(format!("No mock response for {command}")));
        };
        if let Some(response) = script.queued.pop_front() {
            return response;
        }
        script
            .sticky
            .clone()
            .unwrap_or_else(|| Err(BackendFailure::new(format!("No mock response for {command}"))))
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn invoke(
        &self,
        command: Command,
        args: serde_json::Value,
    ) -> Result<String, BackendFailure> {
        self.captured_calls.lock().push((command, args));
        self.next_response(command)
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("calls", &self.total_calls())
            .finish()
    }
}
