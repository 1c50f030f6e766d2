//! # reform-rs-test
//!
//! Testing utilities for reform-rs. Provides submit handlers that record or
//! hold back submissions, validators that count their invocations, and
//! assertion helpers for form state.

pub mod assertions;
pub mod call_counter;
pub mod handlers;

pub use call_counter::CallCounter;
pub use handlers::{GatedHandler, RecordingHandler};
