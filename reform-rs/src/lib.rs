//! # reform-rs
//!
//! Reactive form state for Rust.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `reform-rs` to get everything, or depend on individual
//! crates for finer-grained control.

/// Errors, settings, and logging.
pub use reform_rs_core as core;

/// Change notifications.
#[cfg(feature = "signals")]
pub use reform_rs_signals as signals;

/// Fields, lists, validation, dirty tracking, and submission.
#[cfg(feature = "forms")]
pub use reform_rs_forms as forms;

/// Test handlers, counting validators, and assertions.
#[cfg(feature = "testing")]
pub use reform_rs_test as test;

/// Third-party crates used in public signatures.
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use tracing;

/// The types most forms need.
#[cfg(feature = "forms")]
pub mod prelude {
    pub use reform_rs_core::{ReformError, ReformResult, Settings, ValidationTrigger, SETTINGS};
    pub use reform_rs_forms::validators::{
        length_less_than, length_more_than, matches, not_empty, not_empty_string,
        positive_number, unique_in_list,
    };
    pub use reform_rs_forms::{
        submit_fn, Dirty, DynamicList, Field, FieldBag, Form, FormError, FormEvent, Item,
        SubmitHandler, SubmitOutcome, SubmitRejection, SubmitResult, ValidationContext,
        Validates, Validator,
    };
}
