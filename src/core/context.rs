// ============================================================================
// spark-features - Feature Context
// Thread-local state shared by every container on this thread
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::reactivity::scheduling::Scheduler;

// =============================================================================
// FEATURE CONTEXT
// =============================================================================

/// Thread-local context: the default scheduler and watch accounting.
///
/// Containers built without an explicit scheduler share the one held here,
/// so every container on a thread drains on the same tick.
pub struct FeatureContext {
    /// Scheduler handed to containers that do not bring their own
    scheduler: RefCell<Rc<Scheduler>>,

    /// Number of per-feature watches alive on this thread (all containers)
    live_watches: Cell<usize>,
}

impl FeatureContext {
    pub fn new() -> Self {
        Self {
            scheduler: RefCell::new(Rc::new(Scheduler::new())),
            live_watches: Cell::new(0),
        }
    }

    /// Get the default scheduler
    pub fn scheduler(&self) -> Rc<Scheduler> {
        self.scheduler.borrow().clone()
    }

    /// Replace the default scheduler, returning the previous one
    pub fn set_scheduler(&self, scheduler: Rc<Scheduler>) -> Rc<Scheduler> {
        self.scheduler.replace(scheduler)
    }

    pub fn live_watches(&self) -> usize {
        self.live_watches.get()
    }

    pub(crate) fn watch_started(&self) {
        self.live_watches.set(self.live_watches.get() + 1);
    }

    pub(crate) fn watch_stopped(&self) {
        self.live_watches.set(self.live_watches.get().saturating_sub(1));
    }
}

impl Default for FeatureContext {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CONTEXT: FeatureContext = FeatureContext::new();
}

/// Run a closure with the thread-local context.
pub fn with_context<R>(f: impl FnOnce(&FeatureContext) -> R) -> R {
    CONTEXT.with(f)
}

/// The scheduler containers on this thread use by default.
pub fn current_scheduler() -> Rc<Scheduler> {
    with_context(|ctx| ctx.scheduler())
}

/// Number of live per-feature watches on this thread.
pub fn live_watches() -> usize {
    with_context(|ctx| ctx.live_watches())
}

// =============================================================================
// TESTS
// =============================================================================
