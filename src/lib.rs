// Library root
// -----------
// This crate exposes the library surface behind the `tunefinder` CLI.
//
// Module responsibilities:
// - `retry`: the bounded-retry request executor and its policy.
// - `transport`: the HTTP seam the executor sends requests through.
// - `api`: upload / identify / songs commands built on the executor.
// - `config`, `logging`: startup plumbing for the binary.
// - `ui`: terminal menu flows that delegate to `api`.
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod transport;
pub mod ui;

pub use error::{ApiError, TransportError, TransportFailure};
pub use retry::{Executor, Method, Outcome, Request, RetryPolicy};
