//! Loading [`Settings`] from configuration sources.
//!
//! A source only needs to name the keys it changes: the parsed document is
//! overlaid on the serialized defaults before deserialization, so
//! `make_clean_after_submit = true` on its own is a complete TOML file.
//! `REFORM_*` environment variables are applied last.
//!
//! | Variable | Setting |
//! |---|---|
//! | `REFORM_DEBUG` | `debug` |
//! | `REFORM_LOG_LEVEL` | `log_level` |
//! | `REFORM_MAKE_CLEAN_AFTER_SUBMIT` | `make_clean_after_submit` |
//! | `REFORM_VALIDATION_TRIGGER` | `validation_trigger` (`blur`, `change`, `change_when_invalid`) |
//! | `REFORM_GENERIC_SUBMIT_ERROR` | `generic_submit_error` |
//!
//! ```rust,no_run
//! use reform_rs_core::settings_loader;
//! use reform_rs_core::SETTINGS;
//!
//! let settings = settings_loader::load("config/forms.toml").unwrap();
//! SETTINGS.configure(settings).ok();
//! ```

use std::path::Path;

use serde_json::Value;

use crate::error::{ReformError, ReformResult};
use crate::settings::{Settings, ValidationTrigger};

/// The document formats settings can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML, chosen for `.toml` files.
    Toml,
    /// JSON, chosen for `.json` files.
    Json,
}

impl ConfigFormat {
    /// Picks a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn parse(self, source: &str) -> ReformResult<Value> {
        match self {
            Self::Toml => toml::from_str(source)
                .map_err(|e| ReformError::ConfigurationError(format!("Invalid TOML settings: {e}"))),
            Self::Json => serde_json::from_str(source)
                .map_err(|e| ReformError::ConfigurationError(format!("Invalid JSON settings: {e}"))),
        }
    }
}

/// Parses `source` and overlays it on the default settings.
pub fn from_str(format: ConfigFormat, source: &str) -> ReformResult<Settings> {
    let mut document = serde_json::to_value(Settings::default())?;
    overlay(&mut document, format.parse(source)?);
    serde_json::from_value(document)
        .map_err(|e| ReformError::ConfigurationError(format!("Unusable settings: {e}")))
}

/// Shorthand for [`from_str`] with [`ConfigFormat::Toml`].
pub fn from_toml_str(source: &str) -> ReformResult<Settings> {
    from_str(ConfigFormat::Toml, source)
}

/// Shorthand for [`from_str`] with [`ConfigFormat::Json`].
pub fn from_json_str(source: &str) -> ReformResult<Settings> {
    from_str(ConfigFormat::Json, source)
}

/// Reads a settings file, choosing the format from its extension, and
/// applies environment overrides.
///
/// # Errors
///
/// Returns [`ReformError::ConfigurationError`] for an unknown extension or
/// an unparseable document, and [`ReformError::IoError`] if the file cannot
/// be read.
pub fn load(path: impl AsRef<Path>) -> ReformResult<Settings> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path).ok_or_else(|| {
        ReformError::ConfigurationError(format!(
            "Cannot tell the settings format of '{}'",
            path.display()
        ))
    })?;
    let mut settings = from_str(format, &std::fs::read_to_string(path)?)?;
    apply_env_overrides(&mut settings);
    tracing::debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}

/// The default settings with environment overrides applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

type Override = fn(&mut Settings, String);

const ENV_OVERRIDES: [(&str, Override); 5] = [
    ("REFORM_DEBUG", |s: &mut Settings, v: String| {
        s.debug = is_truthy(&v);
    }),
    ("REFORM_LOG_LEVEL", |s: &mut Settings, v: String| {
        s.log_level = v;
    }),
    ("REFORM_MAKE_CLEAN_AFTER_SUBMIT", |s: &mut Settings, v: String| {
        s.make_clean_after_submit = is_truthy(&v);
    }),
    ("REFORM_VALIDATION_TRIGGER", |s: &mut Settings, v: String| {
        if let Some(trigger) = parse_trigger(&v) {
            s.validation_trigger = trigger;
        } else {
            tracing::warn!(value = %v, "ignoring unknown REFORM_VALIDATION_TRIGGER");
        }
    }),
    ("REFORM_GENERIC_SUBMIT_ERROR", |s: &mut Settings, v: String| {
        s.generic_submit_error = v;
    }),
];

/// Applies every `REFORM_*` variable that is set.
///
/// A trigger name that is not recognized leaves the setting unchanged.
pub fn apply_env_overrides(settings: &mut Settings) {
    for (name, apply) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(name) {
            apply(settings, value);
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_trigger(value: &str) -> Option<ValidationTrigger> {
    serde_json::from_value(Value::String(value.trim().to_ascii_lowercase())).ok()
}

/// Writes `patch` into `base`, recursing into objects present in both.
fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, patch) => *slot = patch,
    }
}
