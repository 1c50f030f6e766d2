//! Core error types for the reform-rs workspace.
//!
//! [`ReformError`] covers the programmer-facing failure modes of the form
//! engine: structural list operations that reference positions which do not
//! exist, lookups of unknown fields or lists, item shape mismatches, and
//! configuration loading problems.
//!
//! User-facing problems (validation messages, submit failures) are never
//! represented here. Those travel as data on fields and in the form's
//! submit error list.

use thiserror::Error;

/// The primary error type for the reform-rs workspace.
///
/// Every variant describes a misuse of the API or an environment problem.
/// None of them are expected during ordinary user interaction with a form.
#[derive(Error, Debug)]
pub enum ReformError {
    // ── Structural ───────────────────────────────────────────────────

    /// A list operation referenced an index outside the current list.
    #[error("Index {index} is out of range for a list of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the list at the time of the operation.
        len: usize,
    },

    /// A field name did not resolve to a field.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A dynamic list name did not resolve to a registered list.
    #[error("Unknown dynamic list: {0}")]
    UnknownList(String),

    /// A value did not have the shape required by the operation
    /// (for example a list item that is not an object).
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred converting between typed values and field values.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReformError {
    /// Returns `true` for errors caused by a structural misuse of a list or
    /// field bag, as opposed to configuration or I/O problems.
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. }
                | Self::UnknownField(_)
                | Self::UnknownList(_)
                | Self::ShapeMismatch(_)
        )
    }
}

/// A convenience type alias for `Result<T, ReformError>`.
pub type ReformResult<T> = Result<T, ReformError>;
