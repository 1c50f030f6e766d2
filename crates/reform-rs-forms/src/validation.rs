//! Validation normalization.
//!
//! Callers describe validation in whichever shape is most convenient: a
//! plain function of the value, a function that also receives a
//! [`ValidationContext`], or a list mixing both. [`normalize_validation`]
//! flattens any of these into one ordered slice of contextual
//! [`Validator`]s, so consumers never inspect the configuration shape.
//!
//! [`ValidationCache`] memoizes a normalized dictionary and only rebuilds it
//! when the caller hands in a different configuration or a different set of
//! declared dependencies. Configurations are closures and cannot be
//! compared, so the dependency list is the only way to say "the captured
//! state changed".

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::field::Item;

/// Where a value being validated lives inside a list.
#[derive(Debug, Clone, Copy)]
pub struct ListContext<'a> {
    /// Position of the item being validated.
    pub index: usize,
    /// The plain values of every item in the list, in order.
    pub list_values: &'a [Item],
}

/// Extra information handed to contextual validators.
///
/// Flat fields see their sibling values. List item fields additionally see
/// the item index and the full list, which lets a validator enforce
/// cross-item constraints such as uniqueness.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    /// Values of the fields sharing the same scope as the validated field.
    pub siblings: Option<&'a Map<String, Value>>,
    /// Present when the validated field belongs to a list item.
    pub list: Option<ListContext<'a>>,
}

impl<'a> ValidationContext<'a> {
    /// A context carrying only sibling values.
    pub const fn with_siblings(siblings: &'a Map<String, Value>) -> Self {
        Self {
            siblings: Some(siblings),
            list: None,
        }
    }

    /// A context for the item at `index` of `list_values`.
    ///
    /// The item's own values become the sibling scope.
    pub fn for_list_item(index: usize, list_values: &'a [Item]) -> Self {
        Self {
            siblings: list_values.get(index),
            list: Some(ListContext { index, list_values }),
        }
    }

    /// Returns the value of a sibling field, if any.
    pub fn sibling(&self, key: &str) -> Option<&'a Value> {
        self.siblings.and_then(|s| s.get(key))
    }

    /// Returns the list index, when validating a list item.
    pub fn index(&self) -> Option<usize> {
        self.list.map(|l| l.index)
    }

    /// Returns every item of the surrounding list, when validating a list item.
    pub fn list_values(&self) -> Option<&'a [Item]> {
        self.list.map(|l| l.list_values)
    }
}

type ContextualFn = dyn Fn(&Value, &ValidationContext<'_>) -> Option<String> + Send + Sync;
type SimpleFn = dyn Fn(&Value) -> Option<String> + Send + Sync;

/// A normalized, context-aware validator.
///
/// Returns `Some(message)` when the value is invalid.
#[derive(Clone)]
pub struct Validator(Arc<ContextualFn>);

impl Validator {
    /// Wraps a contextual validation function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ValidationContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps a validation function that ignores its context.
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(move |value: &Value, _: &ValidationContext<'_>| f(value)))
    }

    /// Runs this validator.
    pub fn check(&self, value: &Value, context: &ValidationContext<'_>) -> Option<String> {
        (self.0)(value, context)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// A validation configuration as supplied by a caller.
#[derive(Clone)]
pub enum Validates {
    /// A function of the value alone.
    Simple(Arc<SimpleFn>),
    /// A function of the value and its context.
    Contextual(Validator),
    /// An ordered list of configurations, run in order.
    Many(Vec<Validates>),
}

impl Validates {
    /// Builds a [`Validates::Simple`] from a closure.
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Self::Simple(Arc::new(f))
    }

    /// Builds a [`Validates::Contextual`] from a closure.
    pub fn contextual<F>(f: F) -> Self
    where
        F: Fn(&Value, &ValidationContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self::Contextual(Validator::new(f))
    }
}

impl fmt::Debug for Validates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(_) => f.write_str("Simple(..)"),
            Self::Contextual(_) => f.write_str("Contextual(..)"),
            Self::Many(list) => f.debug_tuple("Many").field(list).finish(),
        }
    }
}

impl From<Validator> for Validates {
    fn from(validator: Validator) -> Self {
        Self::Contextual(validator)
    }
}

impl From<Vec<Validator>> for Validates {
    fn from(validators: Vec<Validator>) -> Self {
        Self::Many(validators.into_iter().map(Self::Contextual).collect())
    }
}

/// The canonical form: an ordered, shareable slice of validators.
pub type NormalizedValidation = Arc<[Validator]>;

/// Per-key validation configuration for the fields of a list item.
pub type ValidationDictionary = BTreeMap<String, Validates>;

/// Per-key normalized validation.
pub type NormalizedValidationDictionary = BTreeMap<String, NormalizedValidation>;

/// Flattens a configuration into an ordered list of contextual validators.
///
/// An absent configuration normalizes to an empty list, which never fails.
pub fn normalize_validation(validates: Option<&Validates>) -> NormalizedValidation {
    let mut out = Vec::new();
    if let Some(validates) = validates {
        flatten_into(validates, &mut out);
    }
    out.into()
}

fn flatten_into(validates: &Validates, out: &mut Vec<Validator>) {
    match validates {
        Validates::Simple(f) => {
            let f = Arc::clone(f);
            out.push(Validator::new(move |value, _| f(value)));
        }
        Validates::Contextual(v) => out.push(v.clone()),
        Validates::Many(list) => {
            for entry in list {
                flatten_into(entry, out);
            }
        }
    }
}

/// Normalizes every entry of a dictionary.
pub fn normalize_dictionary(dictionary: &ValidationDictionary) -> NormalizedValidationDictionary {
    dictionary
        .iter()
        .map(|(key, validates)| (key.clone(), normalize_validation(Some(validates))))
        .collect()
}

/// Returns the validators registered for `key`, or an empty list.
pub fn validators_for(dictionary: &NormalizedValidationDictionary, key: &str) -> NormalizedValidation {
    dictionary
        .get(key)
        .map_or_else(|| Arc::from(Vec::new()), Arc::clone)
}

/// Runs validators in order and returns the first failure.
///
/// Later validators are not invoked once one fails.
pub fn run_validators(
    validators: &[Validator],
    value: &Value,
    context: &ValidationContext<'_>,
) -> Option<String> {
    validators.iter().find_map(|v| v.check(value, context))
}

/// Memoized normalization keyed by configuration identity and dependencies.
#[derive(Debug, Default)]
pub struct ValidationCache {
    source: Option<Arc<ValidationDictionary>>,
    dependencies: Vec<Value>,
    normalized: Arc<NormalizedValidationDictionary>,
}

impl ValidationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the normalized form of `config`.
    ///
    /// The previous result is returned (same `Arc`) when `config` is the same
    /// allocation as last time and `dependencies` compare equal.
    pub fn get(
        &mut self,
        config: &Arc<ValidationDictionary>,
        dependencies: &[Value],
    ) -> Arc<NormalizedValidationDictionary> {
        let fresh = self
            .source
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, config) && self.dependencies == dependencies);

        if !fresh {
            tracing::trace!(keys = config.len(), "normalizing validation dictionary");
            self.normalized = Arc::new(normalize_dictionary(config));
            self.source = Some(Arc::clone(config));
            self.dependencies = dependencies.to_vec();
        }
        Arc::clone(&self.normalized)
    }

    /// Returns the most recently normalized dictionary without revalidating
    /// the cache key.
    pub fn current(&self) -> Arc<NormalizedValidationDictionary> {
        Arc::clone(&self.normalized)
    }
}
