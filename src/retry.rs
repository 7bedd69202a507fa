//! Resilient request executor.
//!
//! Sends a GET or POST through a [`Transport`] and retries responses whose
//! status is not in the accepted set, sleeping `n * backoff_unit` after the
//! n-th unrecognized response. Transport errors are never retried.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::TransportFailure;
use crate::transport::Transport;

/// Statuses the backend uses as meaningful terminal answers. Anything else
/// is assumed to be transient (throttling, gateway timeouts, ...).
pub const ACCEPTED_STATUSES: [u16; 6] = [200, 400, 480, 481, 482, 500];

/// Returns whether `status` ends the retry loop.
pub fn is_accepted_status(status: u16) -> bool {
    ACCEPTED_STATUSES.contains(&status)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// An outgoing request. Built once by a caller, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: String,
    body: Option<serde_json::Value>,
    headers: BTreeMap<String, String>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// The terminal result of one [`Executor::execute`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub attempts_used: u32,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// False only for the residual case where the attempt budget ran out
    /// on an unrecognized status.
    pub fn is_accepted(&self) -> bool {
        is_accepted_status(self.status_code)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Attempt budget and linear backoff unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first unrecognized response; the n-th waits `n` units.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts`, never below one: a request is always sent once.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after `attempt` (1-based) returned an unrecognized
    /// status, or `None` once the budget is spent.
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.attempt_budget() {
            return None;
        }
        Some(self.backoff_unit.saturating_mul(attempt))
    }
}

/// Blocks the current thread between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Receives the executor's diagnostics.
pub trait DiagnosticSink {
    fn retrying(&self, url: &str, status: u16, attempt: u32, delay: Duration);
    fn gave_up(&self, url: &str, status: u16, attempts: u32);
    fn transport_failure(&self, failure: &TransportFailure);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn retrying(&self, url: &str, status: u16, attempt: u32, delay: Duration) {
        tracing::debug!(
            url,
            status,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "unrecognized status, retrying"
        );
    }

    fn gave_up(&self, url: &str, status: u16, attempts: u32) {
        tracing::warn!(url, status, attempts, "attempt budget exhausted");
    }

    fn transport_failure(&self, failure: &TransportFailure) {
        tracing::error!(
            url = %failure.url,
            attempt = failure.attempt,
            error = %failure.source,
            "request failed"
        );
    }
}

/// Bounded-retry request executor.
pub struct Executor<T> {
    transport: T,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    sink: Box<dyn DiagnosticSink>,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
            sink: Box::new(TracingSink),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.attempt_budget(),
            ..policy
        };
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Performs `request`, retrying unrecognized statuses.
    ///
    /// Returns the first response with an accepted status, or the last
    /// response once the attempt budget is spent. A transport error on any
    /// attempt is reported to the sink and returned immediately.
    pub fn execute(&self, request: &Request) -> Result<Outcome, TransportFailure> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let response = match self.transport.send(request) {
                Ok(response) => response,
                Err(source) => {
                    let failure = TransportFailure {
                        url: request.url().to_owned(),
                        attempt,
                        source,
                    };
                    self.sink.transport_failure(&failure);
                    return Err(failure);
                }
            };

            if !is_accepted_status(response.status) {
                match self.policy.backoff_after(attempt) {
                    Some(delay) => {
                        self.sink
                            .retrying(request.url(), response.status, attempt, delay);
                        self.sleeper.sleep(delay);
                        continue;
                    }
                    None => self.sink.gave_up(request.url(), response.status, attempt),
                }
            }

            return Ok(Outcome {
                status_code: response.status,
                body: response.body,
                attempts_used: attempt,
            });
        }
    }
}
