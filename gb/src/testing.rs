//! Scripted command runner for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::CommandError;
use crate::process::{CommandRunner, CommandSpec};

pub const PULL: &str = "git pull";
pub const REV_PARSE: &str = "git rev-parse --short HEAD";
pub const BUILD: &str = "/bin/bash make.bash";

/// A recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub spec: CommandSpec,
    pub captured: bool,
    pub at: Instant,
}

impl Call {
    pub fn line(&self) -> String {
        self.spec.to_string()
    }
}

#[derive(Debug, Clone)]
struct Reply {
    result: Result<String, i32>,
    delay: Duration,
}

/// Runner that answers by command line and records every call
///
/// Unscripted commands succeed with empty output.
#[derive(Debug, Default)]
pub struct FakeRunner {
    replies: Mutex<HashMap<String, Reply>>,
    /// One-shot delays, consumed in order before falling back to the reply's delay
    call_delays: Mutex<HashMap<String, VecDeque<Duration>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, line: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.insert(line.into(), Ok(stdout.into()), Duration::ZERO)
    }

    pub fn fail(self, line: impl Into<String>, code: i32) -> Self {
        self.insert(line.into(), Err(code), Duration::ZERO)
    }

    /// Make `line` take `delay` of (tokio) time before answering
    pub fn slow(self, line: impl Into<String>, delay: Duration) -> Self {
        let line = line.into();
        let result = self
            .replies
            .lock()
            .unwrap()
            .get(&line)
            .map(|r| r.result.clone())
            .unwrap_or_else(|| Ok(String::new()));
        self.insert(line, result, delay)
    }

    /// Give successive calls of `line` these delays, one per call
    pub fn slow_calls(self, line: impl Into<String>, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.call_delays
            .lock()
            .unwrap()
            .entry(line.into())
            .or_default()
            .extend(delays);
        self
    }

    fn insert(self, line: String, result: Result<String, i32>, delay: Duration) -> Self {
        self.replies.lock().unwrap().insert(line, Reply { result, delay });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(Call::line).collect()
    }

    pub fn count(&self, line: &str) -> usize {
        self.calls().iter().filter(|c| c.line() == line).count()
    }

    async fn answer(&self, spec: &CommandSpec, captured: bool) -> Result<String, CommandError> {
        self.calls.lock().unwrap().push(Call {
            spec: spec.clone(),
            captured,
            at: Instant::now(),
        });

        let line = spec.to_string();
        let queued = self
            .call_delays
            .lock()
            .unwrap()
            .get_mut(&line)
            .and_then(VecDeque::pop_front);
        let reply = self.replies.lock().unwrap().get(&line).cloned();

        let delay = queued.or(reply.as_ref().map(|r| r.delay)).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(reply) => reply.result.map_err(|code| CommandError::Failed { program: line, code }),
            None => Ok(String::new()),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn capture(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        self.answer(spec, true).await
    }

    async fn passthrough(&self, spec: &CommandSpec) -> Result<(), CommandError> {
        self.answer(spec, false).await.map(|_| ())
    }
}
