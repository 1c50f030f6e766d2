//! # reform-rs-forms
//!
//! Form state for reform-rs. Tracks the value, validity, and dirtiness of a
//! set of fields, including lists of structured items that grow, shrink, and
//! reorder at runtime, and coordinates submission to an asynchronous handler
//! behind client-side validation.
//!
//! ## Modules
//!
//! - [`field`] - The atomic [`Field`](field::Field)
//! - [`validation`] - Validator types, normalization, and caching
//! - [`validators`] - Built-in validators
//! - [`bag`] - Named trees of fields
//! - [`list`] - The list reducer
//! - [`base_list`] - Lists of items with validation
//! - [`dynamic_list`] - Lists that add, remove, and move items
//! - [`dirty`] - Dirty tracking across nested scopes
//! - [`submit`] - The submit pipeline and handler trait
//! - [`form`] - The form facade

pub mod bag;
pub mod base_list;
pub mod dirty;
pub mod dynamic_list;
pub mod field;
pub mod form;
pub mod list;
pub mod submit;
pub mod validation;
pub mod validators;

pub use bag::{FieldBag, FieldNode};
pub use base_list::BaseList;
pub use dirty::{compute_dirty, Dirty};
pub use dynamic_list::{DynamicList, ItemFactory};
pub use field::{Field, FieldDictionary, Item};
pub use form::{Form, FormBuilder, FormEvent, FormState};
pub use list::{reduce, ListAction, ListState};
pub use submit::{
    submit_fn, FormError, SubmitHandler, SubmitOutcome, SubmitPhase, SubmitRejection,
    SubmitResult,
};
pub use validation::{ValidationContext, Validates, Validator};
