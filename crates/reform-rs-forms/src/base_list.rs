//! Lists of structured items with validation.
//!
//! [`BaseList`] wraps a [`ListState`] with a per-key validation dictionary.
//! Item validators receive a [`ValidationContext`] carrying the item index,
//! the item's own values as siblings, and the plain values of the whole
//! list.
//!
//! A host that supplies the list from outside calls [`BaseList::reconcile`]
//! before reading list state. When the supplied items are no longer equal to
//! the stored baseline the list reinitializes from them.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use reform_rs_core::{ReformError, ReformResult, ValidationTrigger};

use crate::field::{Field, FieldDictionary, Item};
use crate::list::{ListAction, ListState};
use crate::submit::FormError;
use crate::validation::{
    run_validators, validators_for, NormalizedValidationDictionary, ValidationCache,
    ValidationContext, ValidationDictionary,
};

/// A list of field dictionaries with validation and dirty tracking.
#[derive(Debug)]
pub struct BaseList {
    state: ListState,
    validates: Arc<ValidationDictionary>,
    dependencies: Vec<Value>,
    cache: ValidationCache,
}

impl BaseList {
    /// Creates a clean list from its initial items.
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            state: ListState::new(items),
            validates: Arc::default(),
            dependencies: Vec::new(),
            cache: ValidationCache::new(),
        }
    }

    /// Creates a list from typed items.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::ShapeMismatch`] if an item does not serialize
    /// to an object.
    pub fn from_items<T: Serialize>(items: &[T]) -> ReformResult<Self> {
        Ok(Self::new(to_items(items)?))
    }

    /// Attaches per-key item validation.
    #[must_use]
    pub fn with_validation(mut self, validates: ValidationDictionary) -> Self {
        self.validates = Arc::new(validates);
        self
    }

    /// Sets when item fields re-run validation on change.
    #[must_use]
    pub fn with_trigger(mut self, trigger: ValidationTrigger) -> Self {
        self.state = ListState::with_trigger(self.state.initial().to_vec(), trigger);
        self
    }

    /// Declares the values the validation closures depend on.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Value>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Replaces the validation dependencies.
    ///
    /// Validators are only renormalized when these change.
    pub fn set_dependencies(&mut self, dependencies: Vec<Value>) {
        self.dependencies = dependencies;
    }

    /// The underlying reducer state.
    pub const fn state(&self) -> &ListState {
        &self.state
    }

    /// The current field dictionaries, in order.
    pub fn fields(&self) -> &[FieldDictionary] {
        self.state.list()
    }

    /// One field of one item.
    ///
    /// # Errors
    ///
    /// Fails when `index` or `key` does not exist.
    pub fn field(&self, index: usize, key: &str) -> ReformResult<&Field> {
        self.state.field(index, key)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// The plain values of every item.
    pub fn values(&self) -> Vec<Item> {
        self.state.values()
    }

    /// The plain values deserialized into `T`.
    pub fn values_as<T: DeserializeOwned>(&self) -> ReformResult<Vec<T>> {
        self.values()
            .into_iter()
            .map(|item| Ok(serde_json::from_value(Value::Object(item))?))
            .collect()
    }

    /// The normalized validators, rebuilt only when the configuration or the
    /// dependencies changed.
    pub fn validators(&mut self) -> Arc<NormalizedValidationDictionary> {
        self.cache.get(&self.validates, &self.dependencies)
    }

    /// Applies a reducer action.
    ///
    /// # Errors
    ///
    /// Propagates structural errors from the reducer.
    pub fn dispatch(&mut self, action: ListAction) -> ReformResult<()> {
        self.state.apply(action)
    }

    /// Reinitializes from `items` when they differ from the stored baseline.
    ///
    /// Returns `true` if the list was rebuilt.
    pub fn reconcile(&mut self, items: &[Item]) -> bool {
        if items == self.state.initial() {
            return false;
        }
        tracing::debug!(len = items.len(), "list baseline changed, reinitializing");
        self.state = ListState::with_trigger(items.to_vec(), self.state.trigger());
        true
    }

    /// Rebuilds every item from the baseline.
    pub fn reset(&mut self) {
        self.state = ListState::with_trigger(self.state.initial().to_vec(), self.state.trigger());
    }

    /// Whether any field is dirty, or the values differ positionally from
    /// the baseline.
    pub fn dirty(&self) -> bool {
        self.state.differs_from_initial()
            || self
                .fields()
                .iter()
                .any(|item| item.values().any(Field::dirty))
    }

    /// Sets a field's value, validating when its trigger asks for it.
    ///
    /// # Errors
    ///
    /// Fails when `index` or `key` does not exist.
    pub fn on_change(&mut self, index: usize, key: &str, value: impl Into<Value>) -> ReformResult<()> {
        let validate = self.field(index, key)?.validates_on_change();
        self.dispatch(ListAction::UpdateField {
            index,
            key: key.to_string(),
            value: value.into(),
        })?;
        if validate {
            self.validate_field(index, key)?;
        }
        Ok(())
    }

    /// Marks a field touched and validates it.
    ///
    /// # Errors
    ///
    /// Fails when `index` or `key` does not exist.
    pub fn on_blur(&mut self, index: usize, key: &str) -> ReformResult<()> {
        self.dispatch(ListAction::Blur {
            index,
            key: key.to_string(),
        })?;
        self.validate_field(index, key)?;
        Ok(())
    }

    /// Runs the validators of one field and stores the result.
    ///
    /// # Errors
    ///
    /// Fails when `index` or `key` does not exist.
    pub fn validate_field(&mut self, index: usize, key: &str) -> ReformResult<Option<String>> {
        let validators = self.validators();
        let values = self.values();
        let error = run_validators(
            &validators_for(&validators, key),
            self.field(index, key)?.value(),
            &ValidationContext::for_list_item(index, &values),
        );
        self.dispatch(ListAction::UpdateError {
            index,
            key: key.to_string(),
            error: error.clone(),
        })?;
        Ok(error)
    }

    /// Validates every field of every item.
    ///
    /// Returns one error per failing field, addressed `[index, key]`.
    pub fn validate_all(&mut self) -> Vec<FormError> {
        let validators = self.validators();
        let values = self.values();
        let mut results = Vec::new();
        for (index, item) in self.fields().iter().enumerate() {
            let context = ValidationContext::for_list_item(index, &values);
            for (key, field) in item {
                let error = run_validators(&validators_for(&validators, key), field.value(), &context);
                results.push((index, key.clone(), error));
            }
        }

        let mut errors = Vec::new();
        for (index, key, error) in results {
            if let Some(message) = &error {
                errors.push(FormError::for_field([index.to_string(), key.clone()], message.clone()));
            }
            if let Ok(field) = self.state.field_mut(index, &key) {
                field.set_error(error);
            }
        }
        errors
    }

    /// Overrides the error of one field.
    ///
    /// # Errors
    ///
    /// Fails when `index` or `key` does not exist.
    pub fn set_error(&mut self, index: usize, key: &str, error: Option<String>) -> ReformResult<()> {
        self.dispatch(ListAction::UpdateError {
            index,
            key: key.to_string(),
            error,
        })
    }

    /// Writes `[index, key]`-addressed errors into their fields.
    pub fn set_errors(&mut self, errors: Vec<FormError>) {
        self.state.update_errors(errors);
    }

    /// Resets one field.
    ///
    /// # Errors
    ///
    /// Fails when `index` or `key` does not exist.
    pub fn reset_field(&mut self, index: usize, key: &str) -> ReformResult<()> {
        self.dispatch(ListAction::ResetField {
            index,
            key: key.to_string(),
        })
    }

    /// Gives one field a new baseline value.
    ///
    /// # Errors
    ///
    /// Fails when `index` or `key` does not exist.
    pub fn new_default_value(&mut self, index: usize, key: &str, value: impl Into<Value>) -> ReformResult<()> {
        self.dispatch(ListAction::NewDefaultValue {
            index,
            key: key.to_string(),
            value: value.into(),
        })
    }

    /// Makes the current values the baseline.
    pub fn make_clean(&mut self) {
        self.state.make_clean();
    }
}

/// Serializes typed items into list items.
pub(crate) fn to_items<T: Serialize>(items: &[T]) -> ReformResult<Vec<Item>> {
    items
        .iter()
        .map(|item| match serde_json::to_value(item)? {
            Value::Object(map) => Ok(map),
            other => Err(ReformError::ShapeMismatch(format!(
                "list items must serialize to objects, got {other}"
            ))),
        })
        .collect()
}
