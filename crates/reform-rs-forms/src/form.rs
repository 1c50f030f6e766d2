//! The form facade.
//!
//! [`FormState`] composes a [`FieldBag`] of flat fields with named
//! [`DynamicList`]s and the submit state into one synchronous value. Dirty,
//! reset, validate, and make-clean all cover both halves.
//!
//! [`Form`] is the shareable handle a host keeps. It guards the state with a
//! mutex that is never held across an `.await`, drives the
//! [`SubmitPipeline`], and announces every state change through a
//! [`Signal`] so a host can recompute whatever it renders.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::Instrument;

use reform_rs_core::logging::form_span;
use reform_rs_core::{ReformError, ReformResult, SETTINGS};
use reform_rs_signals::Signal;

use crate::bag::{FieldBag, FieldNode};
use crate::dirty::Dirty;
use crate::dynamic_list::DynamicList;
use crate::field::{Field, Item};
use crate::submit::{
    lock, FormError, NoopHandler, SubmitHandler, SubmitOutcome, SubmitPhase, SubmitPipeline,
    SubmitState, SubmitTarget,
};

/// Everything a form tracks.
#[derive(Debug, Default)]
pub struct FormState {
    fields: FieldBag,
    lists: BTreeMap<String, DynamicList>,
    submit: SubmitState,
}

impl FormState {
    /// Creates state over a bag of flat fields.
    pub fn new(fields: FieldBag) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Registers a dynamic list under `name`.
    #[must_use]
    pub fn with_list(mut self, name: impl Into<String>, list: DynamicList) -> Self {
        self.lists.insert(name.into(), list);
        self
    }

    /// The flat fields.
    pub const fn fields(&self) -> &FieldBag {
        &self.fields
    }

    /// The flat fields, mutably.
    pub fn fields_mut(&mut self) -> &mut FieldBag {
        &mut self.fields
    }

    /// A dynamic list by name.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::UnknownList`] if no list has that name.
    pub fn list(&self, name: &str) -> ReformResult<&DynamicList> {
        self.lists
            .get(name)
            .ok_or_else(|| ReformError::UnknownList(name.to_string()))
    }

    /// A dynamic list by name, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::UnknownList`] if no list has that name.
    pub fn list_mut(&mut self, name: &str) -> ReformResult<&mut DynamicList> {
        self.lists
            .get_mut(name)
            .ok_or_else(|| ReformError::UnknownList(name.to_string()))
    }

    /// Every dynamic list, by name.
    pub fn lists(&self) -> impl Iterator<Item = (&String, &DynamicList)> {
        self.lists.iter()
    }

    /// Whether any field or list differs from its baseline.
    pub fn dirty(&self) -> bool {
        self.fields.is_dirty() || self.lists.is_dirty()
    }

    /// Whether a submission is in flight.
    pub const fn submitting(&self) -> bool {
        self.submit.submitting()
    }

    /// Errors left by the last submit attempt.
    pub fn submit_errors(&self) -> &[FormError] {
        self.submit.errors()
    }

    /// Where the submit pipeline currently is.
    pub fn phase(&self) -> SubmitPhase {
        self.submit.phase()
    }

    /// The plain values of every field and list.
    ///
    /// A list shadows a flat field of the same name.
    pub fn values(&self) -> Map<String, Value> {
        let mut values = self.fields.values();
        for (name, list) in &self.lists {
            let items = list.values().into_iter().map(Value::Object).collect();
            values.insert(name.clone(), Value::Array(items));
        }
        values
    }

    /// Resets every field and list and clears the submit errors.
    pub fn reset(&mut self) {
        self.submit.clear_errors();
        self.fields.reset();
        self.lists.values_mut().for_each(DynamicList::reset);
    }

    /// Validates every field and list item without submitting.
    pub fn validate(&mut self) -> Vec<FormError> {
        let mut errors = self.fields.validate_all();
        for (name, list) in &mut self.lists {
            errors.extend(
                list.base_mut()
                    .validate_all()
                    .into_iter()
                    .map(|error| error.prefixed(name)),
            );
        }
        errors
    }

    /// Makes every current value the baseline, changing nothing visible.
    pub fn make_clean(&mut self) {
        self.fields.make_clean();
        for list in self.lists.values_mut() {
            list.base_mut().make_clean();
        }
    }

    /// Writes handler errors into the fields and list items they name.
    pub fn propagate_errors(&mut self, errors: &[FormError]) {
        self.fields.propagate_errors(errors);
        for (name, list) in &mut self.lists {
            let scoped: Vec<FormError> = errors
                .iter()
                .filter_map(|error| match error.field.as_deref() {
                    Some([head, rest @ ..]) if head == name => {
                        Some(FormError::for_field(rest.iter().cloned(), error.message.clone()))
                    }
                    _ => None,
                })
                .collect();
            if !scoped.is_empty() {
                list.base_mut().set_errors(scoped);
            }
        }
    }
}

impl SubmitTarget for FormState {
    fn submit_state(&mut self) -> &mut SubmitState {
        &mut self.submit
    }

    fn validate_all(&mut self) -> Vec<FormError> {
        self.validate()
    }

    fn submit_values(&self) -> Value {
        Value::Object(self.values())
    }

    fn propagate_errors(&mut self, errors: &[FormError]) {
        Self::propagate_errors(self, errors);
    }

    fn make_clean(&mut self) {
        Self::make_clean(self);
    }
}

/// Notifications a [`Form`] sends to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Some state changed.
    Changed,
    /// Validation passed and the handler is being invoked.
    SubmitStarted,
    /// A submit attempt finished.
    SubmitFinished(SubmitOutcome),
}

/// Configures and builds a [`Form`].
pub struct FormBuilder {
    name: String,
    state: FormState,
    handler: Arc<dyn SubmitHandler>,
    make_clean_after_submit: bool,
    generic_error: String,
}

impl FormBuilder {
    fn new(name: impl Into<String>) -> Self {
        let settings = SETTINGS.get();
        Self {
            name: name.into(),
            state: FormState::default(),
            handler: Arc::new(NoopHandler),
            make_clean_after_submit: settings.make_clean_after_submit,
            generic_error: settings.generic_submit_error.clone(),
        }
    }

    /// Adds a flat field, group, or static list.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, node: impl Into<FieldNode>) -> Self {
        self.state.fields.insert(name, node);
        self
    }

    /// Replaces all flat fields.
    #[must_use]
    pub fn fields(mut self, fields: FieldBag) -> Self {
        self.state.fields = fields;
        self
    }

    /// Adds a dynamic list.
    #[must_use]
    pub fn dynamic_list(mut self, name: impl Into<String>, list: DynamicList) -> Self {
        self.state.lists.insert(name.into(), list);
        self
    }

    /// Sets the submit handler.
    #[must_use]
    pub fn on_submit(mut self, handler: impl SubmitHandler + 'static) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Whether a successful submit makes the form clean.
    #[must_use]
    pub const fn make_clean_after_submit(mut self, enabled: bool) -> Self {
        self.make_clean_after_submit = enabled;
        self
    }

    /// The message used when the handler rejects or panics.
    #[must_use]
    pub fn generic_submit_error(mut self, message: impl Into<String>) -> Self {
        self.generic_error = message.into();
        self
    }

    /// Builds the form.
    pub fn build(self) -> Form {
        tracing::debug!(
            form = %self.name,
            fields = self.state.fields.len(),
            lists = self.state.lists.len(),
            "form built"
        );
        Form {
            inner: Arc::new(FormInner {
                name: self.name,
                state: Mutex::new(self.state),
                pipeline: SubmitPipeline::new(
                    self.handler,
                    self.make_clean_after_submit,
                    self.generic_error,
                ),
                events: Signal::new(),
            }),
        }
    }
}

struct FormInner {
    name: String,
    state: Mutex<FormState>,
    pipeline: SubmitPipeline,
    events: Signal<FormEvent>,
}

/// A shareable handle to one form.
///
/// Clones refer to the same form.
///
/// # Examples
///
/// ```
/// use reform_rs_forms::field::Field;
/// use reform_rs_forms::form::Form;
///
/// let form = Form::builder("product").field("title", Field::new("A")).build();
///
/// form.change("title", "B").unwrap();
/// assert!(form.dirty());
///
/// form.reset();
/// assert!(!form.dirty());
/// assert_eq!(form.field("title").unwrap().value(), "A");
/// ```
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl Form {
    /// Starts building a form.
    pub fn builder(name: impl Into<String>) -> FormBuilder {
        FormBuilder::new(name)
    }

    /// The form's name, used in logs.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Notifications about state changes.
    pub fn events(&self) -> &Signal<FormEvent> {
        &self.inner.events
    }

    /// Reads the state.
    pub fn read<R>(&self, f: impl FnOnce(&FormState) -> R) -> R {
        f(&lock(&self.inner.state))
    }

    /// Mutates the state, then announces the change.
    pub fn update<R>(&self, f: impl FnOnce(&mut FormState) -> R) -> R {
        let result = f(&mut lock(&self.inner.state));
        self.inner.events.send(&FormEvent::Changed);
        result
    }

    /// Changes a top-level field.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::UnknownField`] if there is no such field.
    pub fn change(&self, name: &str, value: impl Into<Value>) -> ReformResult<()> {
        self.update(|state| state.fields.change(name, value))
    }

    /// Blurs a top-level field.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::UnknownField`] if there is no such field.
    pub fn blur(&self, name: &str) -> ReformResult<()> {
        self.update(|state| state.fields.blur(name))
    }

    /// A snapshot of a top-level field.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.read(|state| state.fields.field(name).cloned())
    }

    /// Runs `f` against a dynamic list.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::UnknownList`] if there is no such list.
    pub fn list_mut<R>(&self, name: &str, f: impl FnOnce(&mut DynamicList) -> R) -> ReformResult<R> {
        self.update(|state| state.list_mut(name).map(f))
    }

    /// Reinitializes a dynamic list from host-supplied items when they differ
    /// from its baseline, and announces a change only if it was rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::UnknownList`] if there is no such list.
    pub fn reconcile_list(&self, name: &str, items: &[Item]) -> ReformResult<bool> {
        let rebuilt = lock(&self.inner.state)
            .list_mut(name)?
            .base_mut()
            .reconcile(items);
        if rebuilt {
            self.inner.events.send(&FormEvent::Changed);
        }
        Ok(rebuilt)
    }

    /// Whether any field or list differs from its baseline.
    pub fn dirty(&self) -> bool {
        self.read(FormState::dirty)
    }

    /// Whether a submission is in flight.
    pub fn submitting(&self) -> bool {
        self.read(FormState::submitting)
    }

    /// Errors left by the last submit attempt.
    pub fn submit_errors(&self) -> Vec<FormError> {
        self.read(|state| state.submit_errors().to_vec())
    }

    /// Resets every field and list and clears the submit errors.
    pub fn reset(&self) {
        self.update(FormState::reset);
    }

    /// Validates every field and list item without submitting.
    pub fn validate(&self) -> Vec<FormError> {
        self.update(FormState::validate)
    }

    /// Makes every current value the baseline.
    pub fn make_clean(&self) {
        self.update(FormState::make_clean);
    }

    /// The plain values of every field and list.
    pub fn values(&self) -> Map<String, Value> {
        self.read(FormState::values)
    }

    /// The plain values deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::SerializationError`] if the values do not fit `T`.
    pub fn values_as<T: DeserializeOwned>(&self) -> ReformResult<T> {
        Ok(serde_json::from_value(Value::Object(self.values()))?)
    }

    /// Validates and, if everything passes, hands the values to the submit
    /// handler.
    ///
    /// Returns [`SubmitOutcome::Skipped`] without doing anything while
    /// another submission of this form is in flight.
    pub async fn submit(&self) -> SubmitOutcome {
        let events = &self.inner.events;
        let on_phase = |phase: SubmitPhase| {
            if phase == SubmitPhase::Submitting {
                events.send(&FormEvent::SubmitStarted);
            }
        };

        let outcome = self
            .inner
            .pipeline
            .run(&self.inner.state, &on_phase)
            .instrument(form_span(&self.inner.name))
            .await;

        if outcome != SubmitOutcome::Skipped {
            events.send(&FormEvent::SubmitFinished(outcome.clone()));
            events.send(&FormEvent::Changed);
        }
        outcome
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.inner.name)
            .field("state", &*lock(&self.inner.state))
            .field("pipeline", &self.inner.pipeline)
            .finish_non_exhaustive()
    }
}
