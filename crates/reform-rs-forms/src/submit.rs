//! Submission pipeline.
//!
//! A submit attempt moves through `idle → submitting → idle` (optionally
//! carrying errors). Client-side validation runs first and is a hard gate:
//! when any field is invalid the handler is never invoked. Otherwise the
//! caller's asynchronous [`SubmitHandler`] receives the plain values of the
//! whole form. A handler that rejects (or panics) is converted into a
//! generic failure, as is a validator that panics. Dropping the submit
//! future before the handler finishes (a timeout, a `select!`) also leaves
//! `submitting`, so the pipeline can never get stuck there.
//!
//! Only one submission may be in flight per form. A second request made
//! while one is pending is ignored.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An error tied either to the whole form or to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormError {
    /// Path to the related field, e.g. `["cards", "0", "cvv"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Vec<String>>,
    /// Human-readable message.
    pub message: String,
}

impl FormError {
    /// An error for the whole form.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// An error for the field at `path`.
    pub fn for_field<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: Some(path.into_iter().map(Into::into).collect()),
            message: message.into(),
        }
    }

    /// The field path joined with dots, if any.
    pub fn field_path(&self) -> Option<String> {
        self.field.as_ref().map(|path| path.join("."))
    }

    pub(crate) fn prefixed(mut self, prefix: &str) -> Self {
        if let Some(path) = &mut self.field {
            path.insert(0, prefix.to_string());
        }
        self
    }
}

/// The result a submit handler reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitResult {
    /// The submission was accepted.
    Success,
    /// The submission was refused with the given errors.
    Fail {
        /// Errors to show the user.
        errors: Vec<FormError>,
    },
}

impl SubmitResult {
    /// Shorthand for [`SubmitResult::Success`].
    pub const fn success() -> Self {
        Self::Success
    }

    /// Shorthand for [`SubmitResult::Fail`].
    pub const fn fail(errors: Vec<FormError>) -> Self {
        Self::Fail { errors }
    }
}

/// A submit handler gave up without producing a [`SubmitResult`].
#[derive(Debug, Clone, Error)]
#[error("submit handler rejected: {0}")]
pub struct SubmitRejection(pub String);

impl SubmitRejection {
    /// Creates a rejection from any displayable cause.
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}

impl From<anyhow::Error> for SubmitRejection {
    fn from(err: anyhow::Error) -> Self {
        Self(format!("{err:#}"))
    }
}

/// The asynchronous collaborator that receives validated form values.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Handles one submission.
    async fn submit(&self, values: Value) -> Result<SubmitResult, SubmitRejection>;
}

#[async_trait]
impl<H: SubmitHandler + ?Sized> SubmitHandler for Arc<H> {
    async fn submit(&self, values: Value) -> Result<SubmitResult, SubmitRejection> {
        (**self).submit(values).await
    }
}

/// Adapts an async closure into a [`SubmitHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> SubmitHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SubmitResult, SubmitRejection>> + Send + 'static,
{
    async fn submit(&self, values: Value) -> Result<SubmitResult, SubmitRejection> {
        (self.0)(values).await
    }
}

/// Wraps an async closure as a submit handler.
///
/// # Examples
///
/// ```
/// use reform_rs_forms::submit::{submit_fn, SubmitResult};
///
/// let handler = submit_fn(|_values| async { Ok(SubmitResult::success()) });
/// ```
pub fn submit_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SubmitResult, SubmitRejection>> + Send + 'static,
{
    FnHandler(f)
}

/// A handler that accepts every submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl SubmitHandler for NoopHandler {
    async fn submit(&self, _values: Value) -> Result<SubmitResult, SubmitRejection> {
        Ok(SubmitResult::Success)
    }
}

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    /// Nothing in flight and no errors recorded.
    #[default]
    Idle,
    /// A submission is in flight.
    Submitting,
    /// Nothing in flight; the last attempt left errors.
    IdleWithErrors,
}

/// What a call to `submit` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was already in flight; nothing happened.
    Skipped,
    /// Client-side validation failed; the handler was not invoked.
    Invalid(Vec<FormError>),
    /// The handler reported failure, or rejected.
    Failed(Vec<FormError>),
    /// The handler reported success.
    Succeeded,
}

impl SubmitOutcome {
    /// Whether the handler accepted the submission.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// The submitting flag and the error list of one form.
#[derive(Debug, Clone, Default)]
pub struct SubmitState {
    submitting: bool,
    errors: Vec<FormError>,
}

impl SubmitState {
    /// Whether a submission is in flight.
    pub const fn submitting(&self) -> bool {
        self.submitting
    }

    /// Errors left by the last attempt.
    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }

    /// The current phase.
    pub fn phase(&self) -> SubmitPhase {
        if self.submitting {
            SubmitPhase::Submitting
        } else if self.errors.is_empty() {
            SubmitPhase::Idle
        } else {
            SubmitPhase::IdleWithErrors
        }
    }

    /// Replaces the recorded errors.
    pub fn set_errors(&mut self, errors: Vec<FormError>) {
        self.errors = errors;
    }

    /// Drops every recorded error.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Enters `submitting`. Returns `false` if already there.
    fn begin(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        self.submitting = true;
        true
    }

    fn finish(&mut self, errors: Vec<FormError>) {
        self.submitting = false;
        self.errors = errors;
    }

    /// Leaves `submitting` and keeps the previous errors.
    fn abandon(&mut self) {
        self.submitting = false;
    }
}

/// The state a [`SubmitPipeline`] drives.
pub trait SubmitTarget {
    /// The submitting flag and error list.
    fn submit_state(&mut self) -> &mut SubmitState;

    /// Validates the whole tree, storing field errors, and returns every failure.
    fn validate_all(&mut self) -> Vec<FormError>;

    /// The plain values handed to the submit handler.
    fn submit_values(&self) -> Value;

    /// Shows handler errors on the fields they name.
    fn propagate_errors(&mut self, errors: &[FormError]);

    /// Rebases every baseline to the current values.
    fn make_clean(&mut self);
}

/// Orchestrates validation, the handler call, and the resulting state change.
#[derive(Clone)]
pub struct SubmitPipeline {
    handler: Arc<dyn SubmitHandler>,
    make_clean_after_submit: bool,
    generic_error: String,
}

impl std::fmt::Debug for SubmitPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitPipeline")
            .field("make_clean_after_submit", &self.make_clean_after_submit)
            .field("generic_error", &self.generic_error)
            .finish_non_exhaustive()
    }
}

impl SubmitPipeline {
    /// Creates a pipeline around `handler`.
    pub fn new(
        handler: Arc<dyn SubmitHandler>,
        make_clean_after_submit: bool,
        generic_error: impl Into<String>,
    ) -> Self {
        Self {
            handler,
            make_clean_after_submit,
            generic_error: generic_error.into(),
        }
    }

    /// Whether success rebases every baseline.
    pub const fn make_clean_after_submit(&self) -> bool {
        self.make_clean_after_submit
    }

    /// Runs one submit attempt against `target`.
    ///
    /// `on_phase` is told about every phase transition, after the lock on
    /// `target` has been released.
    pub async fn run<T>(
        &self,
        target: &Mutex<T>,
        on_phase: &(dyn Fn(SubmitPhase) + Send + Sync),
    ) -> SubmitOutcome
    where
        T: SubmitTarget + Send,
    {
        if !lock(target).submit_state().begin() {
            tracing::debug!("submit ignored: already submitting");
            return SubmitOutcome::Skipped;
        }
        let in_flight = InFlight {
            target,
            armed: true,
        };

        let validated = {
            let mut state = lock(target);
            match catch_unwind(AssertUnwindSafe(|| state.validate_all())) {
                Ok(errors) if errors.is_empty() => Ok(state.submit_values()),
                Ok(errors) => {
                    tracing::debug!(count = errors.len(), "submit blocked by validation errors");
                    state.submit_state().finish(errors.clone());
                    Err(SubmitOutcome::Invalid(errors))
                }
                Err(_) => {
                    tracing::error!("validator panicked during submit");
                    let errors = vec![FormError::new(self.generic_error.clone())];
                    state.submit_state().finish(errors.clone());
                    Err(SubmitOutcome::Failed(errors))
                }
            }
        };
        let values = match validated {
            Ok(values) => values,
            Err(outcome) => {
                in_flight.disarm();
                on_phase(SubmitPhase::IdleWithErrors);
                return outcome;
            }
        };
        on_phase(SubmitPhase::Submitting);

        tracing::debug!("invoking submit handler");
        let result = AssertUnwindSafe(self.handler.submit(values))
            .catch_unwind()
            .await;

        let outcome = {
            let mut state = lock(target);
            match result {
                Ok(Ok(SubmitResult::Success)) => {
                    state.submit_state().finish(Vec::new());
                    if self.make_clean_after_submit {
                        state.make_clean();
                    }
                    tracing::info!("form submitted");
                    SubmitOutcome::Succeeded
                }
                Ok(Ok(SubmitResult::Fail { errors })) => {
                    tracing::info!(count = errors.len(), "submit handler reported failure");
                    state.propagate_errors(&errors);
                    state.submit_state().finish(errors.clone());
                    SubmitOutcome::Failed(errors)
                }
                Ok(Err(rejection)) => {
                    tracing::warn!(%rejection, "submit handler rejected");
                    let errors = vec![FormError::new(self.generic_error.clone())];
                    state.submit_state().finish(errors.clone());
                    SubmitOutcome::Failed(errors)
                }
                Err(_) => {
                    tracing::error!("submit handler panicked");
                    let errors = vec![FormError::new(self.generic_error.clone())];
                    state.submit_state().finish(errors.clone());
                    SubmitOutcome::Failed(errors)
                }
            }
        };
        in_flight.disarm();

        on_phase(if outcome.is_success() {
            SubmitPhase::Idle
        } else {
            SubmitPhase::IdleWithErrors
        });
        outcome
    }
}

/// Leaves `submitting` when an attempt ends without reaching `finish`, as
/// happens when the submit future is dropped while the handler is pending.
struct InFlight<'a, T: SubmitTarget> {
    target: &'a Mutex<T>,
    armed: bool,
}

impl<T: SubmitTarget> InFlight<'_, T> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T: SubmitTarget> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("submit abandoned before the handler finished");
            lock(self.target).submit_state().abandon();
        }
    }
}

/// Locks form state, recovering from poisoning.
///
/// State is only mutated through complete transitions, so a panic in a
/// caller's closure leaves nothing half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
