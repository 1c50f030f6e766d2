//! Validators that count how often they run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reform_rs_forms::validation::Validator;

/// Shared invocation counter backing stub validators.
///
/// Every validator built from the same counter increments it.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
}

impl CallCounter {
    /// A counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times validators from this counter have run.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Sets the count back to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// A validator that counts and always passes.
    pub fn passing(&self) -> Validator {
        let count = Arc::clone(&self.count);
        Validator::simple(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            None
        })
    }

    /// A validator that counts and always fails with `message`.
    pub fn failing(&self, message: impl Into<String>) -> Validator {
        let count = Arc::clone(&self.count);
        let message = message.into();
        Validator::simple(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            Some(message.clone())
        })
    }
}
