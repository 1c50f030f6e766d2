//! Built-in validators.
//!
//! Every constructor takes the message to report on failure. Apart from
//! [`not_empty`] and [`not_empty_string`], validators treat an empty value
//! (`null` or `""`) as valid so that "required" stays a separate, explicit
//! concern.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use reform_rs_core::{ReformError, ReformResult};

use crate::validation::Validator;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?\s*$").expect("valid regex"));

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Length in characters for strings, in elements for arrays and objects.
fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        Value::Object(o) => Some(o.len()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if NUMBER_RE.is_match(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Fails on `null`, `""`, `[]` and `{}`.
pub fn not_empty(message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::simple(move |value| {
        let empty = is_blank(value) || length_of(value) == Some(0);
        empty.then(|| message.clone())
    })
}

/// Fails on `null` and on strings that contain only whitespace.
pub fn not_empty_string(message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::simple(move |value| {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        empty.then(|| message.clone())
    })
}

/// Fails unless the value is longer than `length`.
///
/// Values without a length (numbers, booleans) fail.
pub fn length_more_than(length: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::simple(move |value| {
        if is_blank(value) {
            return None;
        }
        match length_of(value) {
            Some(len) if len > length => None,
            _ => Some(message.clone()),
        }
    })
}

/// Fails unless the value is shorter than `length`.
pub fn length_less_than(length: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::simple(move |value| {
        if is_blank(value) {
            return None;
        }
        match length_of(value) {
            Some(len) if len < length => None,
            _ => Some(message.clone()),
        }
    })
}

/// Fails unless the value is a number, or numeric string, greater than zero.
pub fn positive_number(message: impl Into<String>) -> Validator {
    let message = message.into();
    Validator::simple(move |value| {
        if is_blank(value) {
            return None;
        }
        match as_number(value) {
            Some(n) if n > 0.0 => None,
            _ => Some(message.clone()),
        }
    })
}

/// Fails unless the value is a string matching `pattern`.
///
/// # Errors
///
/// Returns [`ReformError::ConfigurationError`] if `pattern` does not compile.
pub fn matches(pattern: &str, message: impl Into<String>) -> ReformResult<Validator> {
    let re = Regex::new(pattern)
        .map_err(|e| ReformError::ConfigurationError(format!("invalid pattern {pattern:?}: {e}")))?;
    let message = message.into();
    Ok(Validator::simple(move |value| {
        if is_blank(value) {
            return None;
        }
        match value {
            Value::String(s) if re.is_match(s) => None,
            _ => Some(message.clone()),
        }
    }))
}

/// Fails when another item of the surrounding list has the same value
/// under `key`.
///
/// Outside a list this validator always passes.
pub fn unique_in_list(key: impl Into<String>, message: impl Into<String>) -> Validator {
    let key = key.into();
    let message = message.into();
    Validator::new(move |value, context| {
        if is_blank(value) {
            return None;
        }
        let (index, items) = (context.index()?, context.list_values()?);
        let duplicate = items
            .iter()
            .enumerate()
            .any(|(i, item)| i != index && item.get(&key) == Some(value));
        duplicate.then(|| message.clone())
    })
}
