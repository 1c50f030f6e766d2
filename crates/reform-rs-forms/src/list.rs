//! The list reducer.
//!
//! A [`ListState`] holds the field dictionaries of a list of structured
//! items together with the plain-value baseline they are compared against.
//! It only changes through [`ListAction`]s applied by [`reduce`] (or
//! [`ListState::apply`]); there is no other hidden state.
//!
//! Each field keeps the baseline of the item it was built from, so values,
//! errors, and reset targets travel with an item when it moves. List-level
//! dirtiness is positional: [`ListState::differs_from_initial`] compares the
//! plain values element by element against the baseline, so removing,
//! appending, or reordering different items makes the list dirty even though
//! no single field changed.

use reform_rs_core::{ReformError, ReformResult, ValidationTrigger, SETTINGS};
use serde_json::Value;

use crate::field::{fields_to_item, Field, FieldDictionary, Item};
use crate::submit::FormError;

/// The state owned by a list reducer.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    list: Vec<FieldDictionary>,
    initial: Vec<Item>,
    trigger: ValidationTrigger,
}

/// A state transition for a [`ListState`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListAction {
    /// Replace the baseline and rebuild every item from it.
    Reinitialize(Vec<Item>),
    /// Rebuild every item from the current baseline.
    Reset,
    /// Set the value of one field.
    UpdateField {
        /// Item position.
        index: usize,
        /// Field key inside the item.
        key: String,
        /// New value.
        value: Value,
    },
    /// Insert items, appending when `at` is `None`.
    AddItem {
        /// Items to insert, in order.
        items: Vec<Item>,
        /// Insertion position.
        at: Option<usize>,
    },
    /// Remove the item at the given position.
    RemoveItem(usize),
    /// Move the item at `from` so it ends up at `to`.
    MoveItem {
        /// Current position.
        from: usize,
        /// Target position.
        to: usize,
    },
    /// Set or clear the error of one field.
    UpdateError {
        /// Item position.
        index: usize,
        /// Field key inside the item.
        key: String,
        /// Error to display.
        error: Option<String>,
    },
    /// Write errors addressed by `[index, key]` paths into their fields.
    ///
    /// Errors whose path does not resolve are skipped.
    UpdateErrors(Vec<FormError>),
    /// Reset one field to its baseline.
    ResetField {
        /// Item position.
        index: usize,
        /// Field key inside the item.
        key: String,
    },
    /// Give one field a new baseline value.
    NewDefaultValue {
        /// Item position.
        index: usize,
        /// Field key inside the item.
        key: String,
        /// The new baseline.
        value: Value,
    },
    /// Mark one field touched.
    Blur {
        /// Item position.
        index: usize,
        /// Field key inside the item.
        key: String,
    },
    /// Make the current values the baseline.
    MakeClean,
}

impl ListState {
    /// Builds a clean state from a baseline.
    pub fn new(initial: Vec<Item>) -> Self {
        Self::with_trigger(initial, SETTINGS.get().validation_trigger)
    }

    /// Builds a clean state whose fields validate on `trigger`.
    pub fn with_trigger(initial: Vec<Item>, trigger: ValidationTrigger) -> Self {
        let mut state = Self {
            list: Vec::new(),
            initial,
            trigger,
        };
        state.rebuild();
        state
    }

    /// When item fields re-run validation on change.
    pub const fn trigger(&self) -> ValidationTrigger {
        self.trigger
    }

    /// The current field dictionaries, in order.
    pub fn list(&self) -> &[FieldDictionary] {
        &self.list
    }

    /// The baseline values, in order.
    pub fn initial(&self) -> &[Item] {
        &self.initial
    }

    /// Number of items currently in the list.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The plain values of every item, in order.
    pub fn values(&self) -> Vec<Item> {
        self.list.iter().map(fields_to_item).collect()
    }

    /// Whether the plain values differ positionally from the baseline.
    pub fn differs_from_initial(&self) -> bool {
        self.list.len() != self.initial.len()
            || self
                .list
                .iter()
                .zip(&self.initial)
                .any(|(fields, item)| &fields_to_item(fields) != item)
    }

    pub(crate) fn field(&self, index: usize, key: &str) -> ReformResult<&Field> {
        let len = self.list.len();
        self.list
            .get(index)
            .ok_or(ReformError::IndexOutOfRange { index, len })?
            .get(key)
            .ok_or_else(|| ReformError::UnknownField(key.to_string()))
    }

    pub(crate) fn field_mut(&mut self, index: usize, key: &str) -> ReformResult<&mut Field> {
        let len = self.list.len();
        self.list
            .get_mut(index)
            .ok_or(ReformError::IndexOutOfRange { index, len })?
            .get_mut(key)
            .ok_or_else(|| ReformError::UnknownField(key.to_string()))
    }

    /// Applies one action in place.
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::IndexOutOfRange`] or
    /// [`ReformError::UnknownField`] when the action references a position or
    /// key that does not exist. The state is left untouched in that case.
    pub fn apply(&mut self, action: ListAction) -> ReformResult<()> {
        tracing::trace!(?action, len = self.list.len(), "list action");
        match action {
            ListAction::Reinitialize(initial) => {
                self.initial = initial;
                self.rebuild();
            }
            ListAction::Reset => self.rebuild(),
            ListAction::UpdateField { index, key, value } => {
                self.field_mut(index, &key)?.on_change(value);
            }
            ListAction::AddItem { items, at } => {
                let len = self.list.len();
                let at = at.unwrap_or(len);
                if at > len {
                    return Err(ReformError::IndexOutOfRange { index: at, len });
                }
                let built: Vec<_> = items.iter().map(|item| self.build(item)).collect();
                self.list.splice(at..at, built);
            }
            ListAction::RemoveItem(index) => {
                let len = self.list.len();
                if index >= len {
                    return Err(ReformError::IndexOutOfRange { index, len });
                }
                self.list.remove(index);
            }
            ListAction::MoveItem { from, to } => {
                let len = self.list.len();
                for index in [from, to] {
                    if index >= len {
                        return Err(ReformError::IndexOutOfRange { index, len });
                    }
                }
                let item = self.list.remove(from);
                self.list.insert(to, item);
            }
            ListAction::UpdateError { index, key, error } => {
                self.field_mut(index, &key)?.set_error(error);
            }
            ListAction::UpdateErrors(errors) => self.update_errors(errors),
            ListAction::ResetField { index, key } => {
                self.field_mut(index, &key)?.reset();
            }
            ListAction::NewDefaultValue { index, key, value } => {
                self.field_mut(index, &key)?.new_default_value(value.clone());
                if let Some(item) = self.initial.get_mut(index) {
                    item.insert(key, value);
                }
            }
            ListAction::Blur { index, key } => {
                self.field_mut(index, &key)?.mark_touched();
            }
            ListAction::MakeClean => self.make_clean(),
        }
        Ok(())
    }

    pub(crate) fn update_errors(&mut self, errors: Vec<FormError>) {
        for error in errors {
            let target = match error.field.as_deref() {
                Some([index, key]) => index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.field_mut(i, key).ok()),
                _ => None,
            };
            match target {
                Some(field) => field.set_error(Some(error.message)),
                None => tracing::debug!(path = ?error.field, "list error path did not resolve"),
            }
        }
    }

    pub(crate) fn make_clean(&mut self) {
        for fields in &mut self.list {
            fields.values_mut().for_each(Field::make_clean);
        }
        self.initial = self.values();
    }

    fn build(&self, item: &Item) -> FieldDictionary {
        item.iter()
            .map(|(key, value)| (key.clone(), Field::new(value.clone()).with_trigger(self.trigger)))
            .collect()
    }

    fn rebuild(&mut self) {
        self.list = self.initial.iter().map(|item| self.build(item)).collect();
    }
}

/// Computes the state that results from applying `action` to `state`.
///
/// # Errors
///
/// See [`ListState::apply`].
pub fn reduce(state: &ListState, action: ListAction) -> ReformResult<ListState> {
    let mut next = state.clone();
    next.apply(action)?;
    Ok(next)
}
