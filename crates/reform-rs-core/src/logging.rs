//! Tracing setup and per-form spans.
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! left to the host. [`setup_logging`] is a convenience for hosts that have
//! no subscriber of their own.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::settings::Settings;

/// Builds the event filter: `RUST_LOG` wins, then `settings.log_level`,
/// then `info`.
pub fn log_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a global subscriber: pretty output in debug mode, JSON lines
/// otherwise.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn setup_logging(settings: &Settings) -> bool {
    let format: Box<dyn Layer<Registry> + Send + Sync> = if settings.debug {
        fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer().json().with_current_span(true).boxed()
    };

    tracing_subscriber::registry()
        .with(format)
        .with(log_filter(settings))
        .try_init()
        .is_ok()
}

/// The span under which a form's submit attempts are recorded.
///
/// ```
/// use reform_rs_core::logging::form_span;
///
/// let _entered = form_span("checkout").entered();
/// tracing::info!("submitting");
/// ```
pub fn form_span(form_name: &str) -> tracing::Span {
    tracing::info_span!("form", form = form_name)
}
