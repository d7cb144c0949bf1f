// ============================================================================
// spark-features - Revision
// Monotonic change counter that derived views key their caches on
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::reactivity::events::{Listeners, Subscription};

/// A monotonically increasing counter. Any change means "recompute".
///
/// # Example
///
/// ```
/// use spark_features::Revision;
///
/// let rev = Revision::new();
/// assert_eq!(rev.get(), 0);
/// assert_eq!(rev.bump(), 1);
/// ```
pub struct Revision {
    value: Cell<u64>,
    listeners: Rc<Listeners<u64>>,
}

impl Revision {
    pub fn new() -> Self {
        Self {
            value: Cell::new(0),
            listeners: Rc::new(Listeners::new()),
        }
    }

    pub fn get(&self) -> u64 {
        self.value.get()
    }

    /// Increment synchronously and notify subscribers with the new value.
    pub fn bump(&self) -> u64 {
        let next = self.value.get() + 1;
        self.value.set(next);
        self.listeners.emit(&next);
        next
    }

    /// Observe every bump.
    pub fn subscribe(&self, f: impl Fn(u64) + 'static) -> Subscription {
        self.listeners.subscribe(move |rev| f(*rev))
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every subscriber.
    pub(crate) fn clear_subscribers(&self) {
        self.listeners.clear();
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Revision").field(&self.value.get()).finish()
    }
}
