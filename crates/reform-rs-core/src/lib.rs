//! # reform-rs-core
//!
//! Core types, settings, and error types for reform-rs.
//! This crate has no dependencies on the other workspace crates and provides
//! the foundation for all of them.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Engine settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{ReformError, ReformResult};
pub use settings::{Settings, ValidationTrigger, SETTINGS};
