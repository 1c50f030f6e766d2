//! Settings system for reform-rs.
//!
//! This module provides the [`Settings`] struct, which holds the defaults a
//! form instance starts from, and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance. Individual forms may override any
//! of these values when they are built.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// When a field re-runs its validators in response to edits.
///
/// Blur always runs validation regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTrigger {
    /// Validate only on blur (and on explicit `validate` calls).
    #[default]
    Blur,
    /// Validate on every change.
    Change,
    /// Re-validate on change only while the field already shows an error.
    ChangeWhenInvalid,
}

/// The complete set of form engine settings.
///
/// # Examples
///
/// ```
/// use reform_rs_core::settings::{Settings, ValidationTrigger};
///
/// let settings = Settings::default();
/// assert!(!settings.make_clean_after_submit);
/// assert_eq!(settings.validation_trigger, ValidationTrigger::Blur);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled. Controls the log output format.
    pub debug: bool,

    // ── Forms ────────────────────────────────────────────────────────

    /// Whether a successful submit rebases every baseline to the submitted
    /// values.
    pub make_clean_after_submit: bool,
    /// The default validation trigger for newly created fields.
    pub validation_trigger: ValidationTrigger,
    /// The message recorded when a submit handler rejects instead of
    /// returning an outcome.
    pub generic_submit_error: String,

    // ── Logging ──────────────────────────────────────────────────────

    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"reform_rs_forms=debug"`.
    pub log_level: String,

    // ── Host-defined ─────────────────────────────────────────────────

    /// Values read by the host application, not by the engine.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            make_clean_after_submit: false,
            validation_trigger: ValidationTrigger::Blur,
            generic_submit_error: "Something went wrong while submitting the form.".to_string(),
            log_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

/// Process-wide settings, fixed on first use.
///
/// Call [`configure`](LazySettings::configure) once at startup. Until then
/// [`get`](LazySettings::get) hands out the defaults.
pub struct LazySettings {
    cell: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// An empty container; reads fall back to [`Settings::default`].
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Configures the global settings.
    ///
    /// Returns the rejected settings if the global instance was already
    /// configured or already read.
    pub fn configure(&self, settings: Settings) -> Result<(), Settings> {
        self.cell.set(settings)
    }

    /// Returns a reference to the configured settings, initializing them to
    /// the defaults on first access if nothing was configured.
    pub fn get(&self) -> &Settings {
        self.cell.get_or_init(Settings::default)
    }

    /// Returns `true` if settings have been configured or read.
    pub fn is_configured(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// The settings every form falls back to.
pub static SETTINGS: LazySettings = LazySettings::new();
