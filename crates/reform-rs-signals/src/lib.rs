//! # reform-rs-signals
//!
//! A small synchronous dispatcher. A form sends an event through a
//! [`Signal`] after each state transition, and whoever renders the form
//! (a UI scheduler, a logger, a test) recomputes its projection without the
//! form knowing about it.
//!
//! ```
//! use std::sync::Arc;
//! use reform_rs_signals::Signal;
//!
//! let signal: Signal<&str> = Signal::new();
//! signal.connect("printer", Arc::new(|event: &&str| println!("{event}")));
//!
//! assert_eq!(signal.send(&"changed"), 1);
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A connected callback.
pub type SignalReceiver<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    id: String,
    callback: SignalReceiver<T>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

/// An ordered set of named receivers for payloads of type `T`.
///
/// The receiver list is copy-on-write: [`send`](Self::send) works on the
/// list as it was when the send began, so a receiver may connect or
/// disconnect (itself included) and the change applies from the next send.
pub struct Signal<T: 'static> {
    slots: RwLock<Arc<[Slot<T>]>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.receiver_ids()).finish()
    }
}

impl<T: 'static> Signal<T> {
    /// A signal nobody listens to yet.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Arc::from(Vec::new())),
        }
    }

    fn snapshot(&self) -> Arc<[Slot<T>]> {
        Arc::clone(&self.slots.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn rewrite(&self, f: impl FnOnce(&mut Vec<Slot<T>>)) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = slots.to_vec();
        f(&mut next);
        *slots = next.into();
    }

    /// Adds `callback` under `id`.
    ///
    /// Connecting an id that is already present replaces its callback and
    /// keeps its position.
    pub fn connect(&self, id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = id.into();
        self.rewrite(|slots| match slots.iter().position(|slot| slot.id == id) {
            Some(index) => slots[index].callback = callback,
            None => slots.push(Slot { id, callback }),
        });
    }

    /// Removes the receiver named `id`. Returns whether one was removed.
    pub fn disconnect(&self, id: &str) -> bool {
        let mut removed = false;
        self.rewrite(|slots| {
            let before = slots.len();
            slots.retain(|slot| slot.id != id);
            removed = slots.len() != before;
        });
        removed
    }

    /// Removes every receiver.
    pub fn disconnect_all(&self) {
        *self.slots.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(Vec::new());
    }

    /// Calls every receiver in connection order and returns how many ran.
    pub fn send(&self, payload: &T) -> usize {
        let slots = self.snapshot();
        for slot in slots.iter() {
            (slot.callback)(payload);
        }
        slots.len()
    }

    /// Number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Receiver ids in connection order.
    pub fn receiver_ids(&self) -> Vec<String> {
        self.snapshot().iter().map(|slot| slot.id.clone()).collect()
    }
}
