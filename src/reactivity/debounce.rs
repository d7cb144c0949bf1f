// ============================================================================
// spark-features - Debounce
// Timer-based coalescing of bursty notifications
// ============================================================================
//
// Each raw event resets one single-shot timer. When the timer finally fires
// (a full window with no new events), the callback runs once for the whole
// burst. A drag-edit emitting an event per frame collapses to one signal.
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::reactivity::scheduling::{Scheduler, TimerId};

/// Coalesces triggers into at most one callback per quiet window.
pub struct Debouncer {
    scheduler: Rc<Scheduler>,
    window: Duration,
    callback: Box<dyn Fn()>,

    /// Timer for the current burst, if one is open
    pending: Cell<Option<TimerId>>,

    /// Number of coalesced firings so far
    fired: Cell<u64>,

    self_weak: Weak<Debouncer>,
}

impl Debouncer {
    pub fn new(
        scheduler: Rc<Scheduler>,
        window: Duration,
        callback: impl Fn() + 'static,
    ) -> Rc<Self> {
        Rc::new_cyclic(|self_weak| Self {
            scheduler,
            window,
            callback: Box::new(callback),
            pending: Cell::new(None),
            fired: Cell::new(0),
            self_weak: self_weak.clone(),
        })
    }

    /// Record a raw event: restart the quiet window.
    pub fn trigger(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.clear_timeout(id);
        }

        let weak = self.self_weak.clone();
        let id = self.scheduler.set_timeout(self.window, move || {
            if let Some(debouncer) = weak.upgrade() {
                debouncer.fire();
            }
        });
        self.pending.set(Some(id));
    }

    fn fire(&self) {
        self.pending.set(None);
        self.fired.set(self.fired.get() + 1);
        (self.callback)();
    }

    /// Drop the open burst without firing. Returns true if one was open.
    pub fn cancel(&self) -> bool {
        match self.pending.take() {
            Some(id) => self.scheduler.clear_timeout(id),
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    pub fn fire_count(&self) -> u64 {
        self.fired.get()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .field("pending", &self.is_pending())
            .field("fired", &self.fired.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
