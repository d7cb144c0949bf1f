// ============================================================================
// spark-features - Subscription Scope
//
// Group subscriptions so they end together.
// ============================================================================
//
// A container registers its long-lived listeners (store add/remove, ...)
// in one scope. Disposing the scope unsubscribes all of them and runs any
// cleanup callbacks, in reverse registration order, leaving nothing
// dangling. After disposal the scope refuses new subscriptions.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::reactivity::events::Subscription;

/// Cleanup function run on scope disposal
pub type ScopeCleanupFn = Box<dyn FnOnce()>;

/// Key for a subscription held by a scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeKey(u64);

/// A bag of subscriptions with a single teardown point.
pub struct SubscriptionScope {
    active: Cell<bool>,
    next_key: Cell<u64>,
    subscriptions: RefCell<Vec<(ScopeKey, Subscription)>>,
    cleanups: RefCell<Vec<ScopeCleanupFn>>,
}

impl SubscriptionScope {
    pub fn new() -> Self {
        Self {
            active: Cell::new(true),
            next_key: Cell::new(1),
            subscriptions: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Take ownership of a subscription until `unsubscribe` or `dispose`.
    ///
    /// A disposed scope drops the subscription right away and returns None.
    pub fn subscribe(&self, subscription: Subscription) -> Option<ScopeKey> {
        if !self.active.get() {
            return None;
        }

        let key = ScopeKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.subscriptions.borrow_mut().push((key, subscription));
        Some(key)
    }

    /// End one subscription early. Returns false if the key is unknown.
    pub fn unsubscribe(&self, key: ScopeKey) -> bool {
        let removed = {
            let mut subs = self.subscriptions.borrow_mut();
            subs.iter()
                .position(|(k, _)| *k == key)
                .map(|idx| subs.remove(idx))
        };
        // Teardown runs after the borrow is released
        match removed {
            Some((_, subscription)) => {
                subscription.cancel();
                true
            }
            None => false,
        }
    }

    /// Register a callback for disposal time.
    pub fn on_dispose(&self, cleanup: impl FnOnce() + 'static) {
        if self.active.get() {
            self.cleanups.borrow_mut().push(Box::new(cleanup));
        } else {
            cleanup();
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.borrow().is_empty()
    }

    /// End every subscription, then run cleanups in reverse order.
    pub fn dispose(&self) {
        if !self.active.replace(false) {
            return;
        }

        let subscriptions: Vec<_> = self.subscriptions.borrow_mut().drain(..).collect();
        for (_, subscription) in subscriptions.into_iter().rev() {
            subscription.cancel();
        }

        let cleanups: Vec<_> = self.cleanups.borrow_mut().drain(..).collect();
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
    }
}

impl Default for SubscriptionScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("active", &self.active.get())
            .field("subscriptions", &self.subscriptions.borrow().len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
