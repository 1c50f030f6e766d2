//! The atomic unit of form state.
//!
//! A [`Field`] owns a current value, a baseline ("initial") value, the
//! currently displayed error, and a dirty flag that always reflects whether
//! the value differs from the baseline under deep equality. Edits flow in
//! through [`Field::on_change`] and [`Field::on_blur`]; validation is
//! decoupled from change unless the field's [`ValidationTrigger`] asks for
//! it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use reform_rs_core::{ReformResult, ValidationTrigger, SETTINGS};

use crate::validation::{
    normalize_validation, run_validators, NormalizedValidation, ValidationContext, Validates,
};

/// The plain value of one list item: property name to value.
pub type Item = Map<String, Value>;

/// The field representation of one list item.
pub type FieldDictionary = BTreeMap<String, Field>;

/// A single editable value with its baseline, error, and dirty state.
///
/// # Examples
///
/// ```
/// use reform_rs_forms::field::Field;
///
/// let mut title = Field::new("A");
/// title.on_change("B");
/// assert!(title.dirty());
///
/// title.reset();
/// assert_eq!(title.value(), "A");
/// assert!(!title.dirty());
/// assert!(title.error().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    value: Value,
    initial_value: Value,
    error: Option<String>,
    dirty: bool,
    touched: bool,
    trigger: ValidationTrigger,
    validators: NormalizedValidation,
}

impl Field {
    /// Creates a clean field whose baseline is `value`.
    ///
    /// The validation trigger defaults to the global settings.
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            initial_value: value.clone(),
            value,
            error: None,
            dirty: false,
            touched: false,
            trigger: SETTINGS.get().validation_trigger,
            validators: normalize_validation(None),
        }
    }

    /// Creates a field from any serializable value.
    pub fn from_serialize<T: Serialize>(value: &T) -> ReformResult<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Attaches validation to this field.
    #[must_use]
    pub fn with_validation(mut self, validates: impl Into<Validates>) -> Self {
        self.validators = normalize_validation(Some(&validates.into()));
        self
    }

    /// Sets when edits re-run validation.
    #[must_use]
    pub const fn with_trigger(mut self, trigger: ValidationTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// The current value.
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// The current value deserialized into `T`.
    pub fn value_as<T: DeserializeOwned>(&self) -> ReformResult<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    /// The baseline the value is compared against.
    pub const fn initial_value(&self) -> &Value {
        &self.initial_value
    }

    /// The error currently displayed for this field.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the value differs from the baseline.
    pub const fn dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the field has been blurred since the last reset.
    pub const fn touched(&self) -> bool {
        self.touched
    }

    /// When edits re-run validation.
    pub const fn trigger(&self) -> ValidationTrigger {
        self.trigger
    }

    /// The normalized validators attached to this field.
    pub fn validators(&self) -> &NormalizedValidation {
        &self.validators
    }

    /// Sets the value and recomputes dirtiness.
    ///
    /// Validation only runs if the trigger asks for it.
    pub fn on_change(&mut self, value: impl Into<Value>) {
        self.on_change_with(value, &ValidationContext::default());
    }

    /// Like [`on_change`](Self::on_change), validating against `context`
    /// when the trigger fires.
    pub fn on_change_with(&mut self, value: impl Into<Value>, context: &ValidationContext<'_>) {
        self.value = value.into();
        self.recompute_dirty();
        if self.validates_on_change() {
            self.validate_with(context);
        }
    }

    /// Marks the field touched and runs its validators.
    pub fn on_blur(&mut self) {
        self.on_blur_with(&ValidationContext::default());
    }

    /// Like [`on_blur`](Self::on_blur), validating against `context`.
    pub fn on_blur_with(&mut self, context: &ValidationContext<'_>) {
        self.touched = true;
        self.validate_with(context);
    }

    /// Runs the attached validators without storing the result.
    pub fn run_validation(&self, context: &ValidationContext<'_>) -> Option<String> {
        run_validators(&self.validators, &self.value, context)
    }

    /// Runs the attached validators with an empty context and stores the result.
    pub fn validate(&mut self) -> Option<String> {
        self.validate_with(&ValidationContext::default())
    }

    /// Runs the attached validators against `context` and stores the result.
    pub fn validate_with(&mut self, context: &ValidationContext<'_>) -> Option<String> {
        let error = self.run_validation(context);
        if let Some(message) = &error {
            tracing::trace!(%message, "field validation failed");
        }
        self.error.clone_from(&error);
        error
    }

    /// Overrides the displayed error.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Replaces the baseline.
    ///
    /// A clean field also takes `value` as its current value and drops its
    /// error and touched state. A field the user has edited keeps its value
    /// and has its dirtiness recomputed against the new baseline.
    pub fn new_default_value(&mut self, value: impl Into<Value>) {
        let value = value.into();
        if self.dirty {
            self.initial_value = value;
            self.recompute_dirty();
        } else {
            self.initial_value = value.clone();
            self.value = value;
            self.error = None;
            self.touched = false;
            self.dirty = false;
        }
    }

    /// Restores the baseline value and clears error, touched, and dirty state.
    pub fn reset(&mut self) {
        self.value = self.initial_value.clone();
        self.error = None;
        self.touched = false;
        self.recompute_dirty();
    }

    /// Makes the current value the baseline without touching the display.
    pub fn make_clean(&mut self) {
        self.initial_value = self.value.clone();
        self.dirty = false;
    }

    pub(crate) fn mark_touched(&mut self) {
        self.touched = true;
    }

    pub(crate) fn validates_on_change(&self) -> bool {
        match self.trigger {
            ValidationTrigger::Blur => false,
            ValidationTrigger::Change => true,
            ValidationTrigger::ChangeWhenInvalid => self.error.is_some(),
        }
    }

    fn recompute_dirty(&mut self) {
        self.dirty = self.value != self.initial_value;
    }
}

/// Builds the field representation of a list item.
pub fn item_to_fields(item: &Item) -> FieldDictionary {
    item.iter()
        .map(|(key, value)| (key.clone(), Field::new(value.clone())))
        .collect()
}

/// Projects a field dictionary back to its plain item value.
pub fn fields_to_item(fields: &FieldDictionary) -> Item {
    fields
        .iter()
        .map(|(key, field)| (key.clone(), field.value.clone()))
        .collect()
}
