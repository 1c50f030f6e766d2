//! Submit handlers for tests.
//!
//! [`RecordingHandler`] answers immediately with a configurable result and
//! keeps every payload it received. [`GatedHandler`] holds each submission
//! open until the test releases it, which makes in-flight behaviour
//! observable.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reform_rs_forms::{Field, Form};
//! use reform_rs_test::handlers::RecordingHandler;
//!
//! async fn example() {
//!     let handler = RecordingHandler::new();
//!     let form = Form::builder("profile")
//!         .field("name", Field::new("Ada"))
//!         .on_submit(handler.clone())
//!         .build();
//!
//!     form.submit().await;
//!     assert_eq!(handler.call_count(), 1);
//!     assert_eq!(handler.last_values().unwrap()["name"], "Ada");
//! }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use reform_rs_forms::submit::{FormError, SubmitHandler, SubmitRejection, SubmitResult};

/// A handler that records payloads and answers with a fixed result.
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<Value>>>,
    response: Arc<Mutex<Result<SubmitResult, SubmitRejection>>>,
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHandler {
    /// A handler that reports success.
    pub fn new() -> Self {
        Self::responding(Ok(SubmitResult::success()))
    }

    /// A handler that reports failure with `errors`.
    pub fn failing(errors: Vec<FormError>) -> Self {
        Self::responding(Ok(SubmitResult::fail(errors)))
    }

    /// A handler that rejects with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self::responding(Err(SubmitRejection(reason.into())))
    }

    fn responding(response: Result<SubmitResult, SubmitRejection>) -> Self {
        Self {
            calls: Arc::default(),
            response: Arc::new(Mutex::new(response)),
        }
    }

    /// Changes what later submissions receive.
    pub fn respond_with(&self, response: Result<SubmitResult, SubmitRejection>) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = response;
    }

    /// Every payload received, oldest first.
    pub fn calls(&self) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of submissions received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// The most recent payload.
    pub fn last_values(&self) -> Option<Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl SubmitHandler for RecordingHandler {
    async fn submit(&self, values: Value) -> Result<SubmitResult, SubmitRejection> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(values);
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A handler whose submissions stay pending until released.
///
/// Each [`release`](Self::release) lets exactly one pending (or the next)
/// submission complete.
#[derive(Debug, Clone)]
pub struct GatedHandler {
    gate: Arc<Notify>,
    entered: Arc<Notify>,
    calls: Arc<AtomicUsize>,
    result: SubmitResult,
}

impl Default for GatedHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl GatedHandler {
    /// A gated handler that reports success once released.
    pub fn new() -> Self {
        Self::with_result(SubmitResult::success())
    }

    /// A gated handler that reports `result` once released.
    pub fn with_result(result: SubmitResult) -> Self {
        Self {
            gate: Arc::new(Notify::new()),
            entered: Arc::new(Notify::new()),
            calls: Arc::new(AtomicUsize::new(0)),
            result,
        }
    }

    /// Lets one submission complete.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Waits until a submission has reached the handler.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Number of submissions that reached the handler.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmitHandler for GatedHandler {
    async fn submit(&self, _values: Value) -> Result<SubmitResult, SubmitRejection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(self.result.clone())
    }
}
