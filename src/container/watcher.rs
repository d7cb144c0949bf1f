// ============================================================================
// spark-features - Feature Watcher
// One debounced change subscription per store member
// ============================================================================
//
// State per feature object: unwatched -> watched -> unwatched.
//
// watch:   subscribe to propertychange + change, both feeding one debouncer
//          whose firing bumps the revision; bump once for the add itself and
//          queue a feature-added notification.
// unwatch: drop the subscriptions (and any open debounce burst), bump, queue
//          a feature-removed notification.
//
// Watches are keyed by the feature's object token, never by its id.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::container::emitter::{FeatureEventKind, FeatureEvents};
use crate::core::constants::{CHANGE, PROPERTY_CHANGE};
use crate::core::context::with_context;
use crate::core::types::ObjectUid;
use crate::error::Result;
use crate::primitives::feature::Feature;
use crate::primitives::revision::Revision;
use crate::reactivity::debounce::Debouncer;
use crate::reactivity::events::Subscription;
use crate::reactivity::scheduling::Scheduler;

// =============================================================================
// WATCH HANDLE
// =============================================================================

/// An active watch on one feature.
struct Watch {
    _property_changes: Subscription,
    _changes: Subscription,
    debouncer: Rc<Debouncer>,
}

impl Drop for Watch {
    fn drop(&mut self) {
        self.debouncer.cancel();
        with_context(|ctx| ctx.watch_stopped());
    }
}

// =============================================================================
// FEATURE WATCHER
// =============================================================================

/// Owns every per-feature watch of one container.
pub struct FeatureWatcher {
    scheduler: Rc<Scheduler>,
    window: Duration,
    revision: Rc<Revision>,
    events: Rc<FeatureEvents>,
    watches: RefCell<HashMap<ObjectUid, Watch>>,
}

impl FeatureWatcher {
    pub fn new(
        scheduler: Rc<Scheduler>,
        window: Duration,
        revision: Rc<Revision>,
        events: Rc<FeatureEvents>,
    ) -> Self {
        Self {
            scheduler,
            window,
            revision,
            events,
            watches: RefCell::new(HashMap::new()),
        }
    }

    /// Start watching a feature that just joined the store.
    ///
    /// Fails if the feature refuses listeners; nothing is bumped or queued
    /// in that case. Watching an already watched feature is a no-op.
    pub fn watch(&self, feature: &Feature) -> Result<()> {
        let uid = feature.uid();
        if self.is_watching(feature) {
            log::debug!("feature {} is already watched", uid);
            return Ok(());
        }

        let revision = Rc::downgrade(&self.revision);
        let debouncer = Debouncer::new(self.scheduler.clone(), self.window, move || {
            if let Some(revision) = revision.upgrade() {
                let rev = revision.bump();
                log::trace!("feature {} changed, revision {}", uid, rev);
            }
        });

        // If the second attach fails the first subscription drops with it
        let d = debouncer.clone();
        let property_changes = feature.on_property_change(move |event| {
            log::trace!("{} '{}' on feature {}", PROPERTY_CHANGE, event.key, uid);
            d.trigger();
        })?;
        let d = debouncer.clone();
        let changes = feature.on_change(move || {
            log::trace!("{} on feature {}", CHANGE, uid);
            d.trigger();
        })?;

        self.watches.borrow_mut().insert(
            uid,
            Watch {
                _property_changes: property_changes,
                _changes: changes,
                debouncer,
            },
        );
        with_context(|ctx| ctx.watch_started());

        let rev = self.revision.bump();
        self.events.notify(FeatureEventKind::Added, feature);
        log::debug!("watching feature {} (id {:?}), revision {}", uid, feature.id(), rev);

        Ok(())
    }

    /// Stop watching a feature that left the store.
    ///
    /// Returns false, without bumping or notifying, if it was not watched.
    pub fn unwatch(&self, feature: &Feature) -> bool {
        let uid = feature.uid();
        let removed = self.watches.borrow_mut().remove(&uid);

        match removed {
            Some(watch) => {
                drop(watch);
                let rev = self.revision.bump();
                self.events.notify(FeatureEventKind::Removed, feature);
                log::debug!("unwatched feature {} (id {:?}), revision {}", uid, feature.id(), rev);
                true
            }
            None => false,
        }
    }

    /// Drop every watch without bumping or notifying. Used on teardown.
    pub fn unwatch_all(&self) -> usize {
        let watches: Vec<Watch> = self.watches.borrow_mut().drain().map(|(_, w)| w).collect();
        let count = watches.len();
        drop(watches);
        count
    }

    pub fn is_watching(&self, feature: &Feature) -> bool {
        self.watches.borrow().contains_key(&feature.uid())
    }

    /// Whether a debounce burst is open for this feature.
    pub fn is_pending(&self, feature: &Feature) -> bool {
        self.watches
            .borrow()
            .get(&feature.uid())
            .is_some_and(|w| w.debouncer.is_pending())
    }

    /// Number of active watches.
    pub fn active(&self) -> usize {
        self.watches.borrow().len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Drop for FeatureWatcher {
    fn drop(&mut self) {
        self.unwatch_all();
    }
}

impl fmt::Debug for FeatureWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureWatcher")
            .field("window", &self.window)
            .field("active", &self.active())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
