// ============================================================================
// spark-features - Feature Events
// Outward feature-added / feature-removed notifications, one tick late
// ============================================================================
//
// `notify` never delivers synchronously. Each call queues its own task on
// the scheduler's next-tick queue, so notifications raised in one turn are
// delivered together after it, in order, and never merged.
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::core::constants::{FEATURE_ADDED, FEATURE_REMOVED};
use crate::primitives::feature::Feature;
use crate::reactivity::events::{Listeners, Subscription};
use crate::reactivity::scheduling::Scheduler;

/// Which structural change a notification reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureEventKind {
    Added,
    Removed,
}

impl FeatureEventKind {
    /// Event name as seen by the component layer.
    pub fn name(self) -> &'static str {
        match self {
            FeatureEventKind::Added => FEATURE_ADDED,
            FeatureEventKind::Removed => FEATURE_REMOVED,
        }
    }
}

/// A delivered notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureEvent {
    pub kind: FeatureEventKind,
    pub feature: Feature,
}

/// Deferred notification emitter.
pub struct FeatureEvents {
    scheduler: Rc<Scheduler>,
    listeners: Rc<Listeners<FeatureEvent>>,

    /// Notifications queued but not yet delivered
    pending: Rc<Cell<usize>>,
}

impl FeatureEvents {
    pub fn new(scheduler: Rc<Scheduler>) -> Self {
        Self {
            scheduler,
            listeners: Rc::new(Listeners::new()),
            pending: Rc::new(Cell::new(0)),
        }
    }

    /// Queue a notification for the next tick.
    ///
    /// The queued task holds the listener list weakly: notifications still
    /// queued when the emitter goes away are dropped on delivery.
    pub fn notify(&self, kind: FeatureEventKind, feature: &Feature) {
        let listeners = Rc::downgrade(&self.listeners);
        let pending = self.pending.clone();
        let event = FeatureEvent {
            kind,
            feature: feature.clone(),
        };

        pending.set(pending.get() + 1);
        self.scheduler.next_tick(move || {
            pending.set(pending.get().saturating_sub(1));
            if let Some(listeners) = listeners.upgrade() {
                log::trace!("delivering {} for feature {}", kind.name(), event.feature.uid());
                listeners.emit(&event);
            }
        });
    }

    /// Observe every notification.
    pub fn subscribe(&self, f: impl Fn(&FeatureEvent) + 'static) -> Subscription {
        self.listeners.subscribe(f)
    }

    /// Observe notifications of one kind.
    pub fn on(&self, kind: FeatureEventKind, f: impl Fn(&Feature) + 'static) -> Subscription {
        self.listeners.subscribe(move |event| {
            if event.kind == kind {
                f(&event.feature);
            }
        })
    }

    /// Notifications queued but not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every listener. Queued notifications then deliver to no one.
    pub fn clear(&self) {
        self.listeners.clear();
    }
}

impl fmt::Debug for FeatureEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureEvents")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
