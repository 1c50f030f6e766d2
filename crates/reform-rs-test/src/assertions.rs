//! Assertion helpers for form state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reform_rs_forms::{Field, Form};
//! use reform_rs_test::assertions::{assert_clean, assert_field_error};
//!
//! let form = Form::builder("profile").field("name", Field::new("Ada")).build();
//! assert_clean(&form);
//! assert_field_error(&form, "name", None);
//! ```

use reform_rs_forms::Form;

/// Asserts that no field or list of `form` is dirty.
///
/// # Panics
///
/// Panics if the form is dirty.
#[track_caller]
pub fn assert_clean(form: &Form) {
    assert!(
        !form.dirty(),
        "Expected form '{}' to be clean, values: {:?}",
        form.name(),
        form.values()
    );
}

/// Asserts that some field or list of `form` is dirty.
///
/// # Panics
///
/// Panics if the form is clean.
#[track_caller]
pub fn assert_dirty(form: &Form) {
    assert!(form.dirty(), "Expected form '{}' to be dirty", form.name());
}

/// Asserts the error displayed on a top-level field.
///
/// # Panics
///
/// Panics if the field does not exist or shows a different error.
#[track_caller]
pub fn assert_field_error(form: &Form, name: &str, expected: Option<&str>) {
    let field = form
        .field(name)
        .unwrap_or_else(|| panic!("Form '{}' has no field '{name}'", form.name()));
    assert_eq!(
        field.error(),
        expected,
        "Unexpected error on field '{name}'"
    );
}

/// Asserts the dotted paths of the form's submit errors, in order.
///
/// Form-level errors are listed as `""`.
///
/// # Panics
///
/// Panics if the paths differ.
#[track_caller]
pub fn assert_submit_error_paths(form: &Form, expected: &[&str]) {
    let actual: Vec<String> = form
        .submit_errors()
        .iter()
        .map(|error| error.field_path().unwrap_or_default())
        .collect();
    assert_eq!(actual, expected, "Unexpected submit error paths");
}
