// ============================================================================
// spark-features - Event Listeners
// Keyed listener lists and RAII subscription handles
// ============================================================================
//
// Every observable thing in the crate (feature change streams, store add /
// remove, revision, outward notifications) is a `Listeners` list. Emission
// runs on a snapshot so listeners may subscribe or unsubscribe while being
// notified without tripping a RefCell borrow.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

// =============================================================================
// LISTENERS
// =============================================================================

/// Key returned by [`Listeners::add`], used to remove the listener later.
pub type ListenerKey = u64;

type Listener<E, R> = Rc<dyn Fn(&E) -> R>;

/// An ordered list of listeners for events of type `E`.
///
/// `R` is the listener return type: `()` for plain notifications,
/// [`Result<()>`] for listeners that may reject the event (see `try_emit`).
pub struct Listeners<E: ?Sized, R = ()> {
    next_key: Cell<ListenerKey>,
    entries: RefCell<Vec<(ListenerKey, Listener<E, R>)>>,
}

impl<E: ?Sized + 'static, R: 'static> Listeners<E, R> {
    pub fn new() -> Self {
        Self {
            next_key: Cell::new(1),
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Register a listener. Listeners run in registration order.
    pub fn add(&self, f: impl Fn(&E) -> R + 'static) -> ListenerKey {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.entries.borrow_mut().push((key, Rc::new(f)));
        key
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove(&self, key: ListenerKey) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(k, _)| *k != key);
        entries.len() != before
    }

    /// Register a listener and get back a handle that removes it on drop.
    ///
    /// The handle holds only a weak reference, so it never keeps the
    /// listener list alive on its own.
    pub fn subscribe(self: &Rc<Self>, f: impl Fn(&E) -> R + 'static) -> Subscription {
        let key = self.add(f);
        let weak = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.remove(key);
            }
        })
    }

    pub fn contains(&self, key: ListenerKey) -> bool {
        self.entries.borrow().iter().any(|(k, _)| *k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn snapshot(&self) -> Vec<(ListenerKey, Listener<E, R>)> {
        self.entries.borrow().clone()
    }
}

impl<E: ?Sized + 'static> Listeners<E> {
    /// Notify every listener.
    ///
    /// A listener removed by an earlier listener during the same emit is
    /// skipped.
    pub fn emit(&self, event: &E) {
        for (key, listener) in self.snapshot() {
            if self.contains(key) {
                listener(event);
            }
        }
    }
}

impl<E: ?Sized + 'static> Listeners<E, Result<()>> {
    /// Notify listeners in order, stopping at the first rejection.
    pub fn try_emit(&self, event: &E) -> Result<()> {
        for (key, listener) in self.snapshot() {
            if self.contains(key) {
                listener(event)?;
            }
        }
        Ok(())
    }
}

impl<E: ?Sized + 'static, R: 'static> Default for Listeners<E, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized, R> fmt::Debug for Listeners<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.borrow().len())
            .finish()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Teardown function run when a subscription ends
pub type TeardownFn = Box<dyn FnOnce()>;

/// RAII handle for an active listener registration.
///
/// Dropping the handle (or calling [`cancel`](Subscription::cancel)) runs the
/// teardown exactly once.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<TeardownFn>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Whether the teardown has yet to run.
    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    /// End the subscription now.
    pub fn cancel(mut self) {
        self.run_teardown();
    }

    fn run_teardown(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use crate::core::types::ObjectUid;

    #[test]
    fn emit_runs_in_order() {
        let listeners: Listeners<i32> = Listeners::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s1 = seen.clone();
        listeners.add(move |v| s1.borrow_mut().push(("a", *v)));
        let s2 = seen.clone();
        listeners.add(move |v| s2.borrow_mut().push(("b", *v)));

        listeners.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn remove_listener() {
        let listeners: Listeners<()> = Listeners::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let key = listeners.add(move |_| c.set(c.get() + 1));

        listeners.emit(&());
        assert!(listeners.remove(key));
        assert!(!listeners.remove(key));
        listeners.emit(&());

        assert_eq!(count.get(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let listeners: Rc<Listeners<()>> = Rc::new(Listeners::new());
        let count = Rc::new(Cell::new(0));

        {
            let c = count.clone();
            let _sub = listeners.subscribe(move |_| c.set(c.get() + 1));
            listeners.emit(&());
            assert_eq!(listeners.len(), 1);
        }

        listeners.emit(&());
        assert_eq!(count.get(), 1);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn subscription_outliving_listeners_is_harmless() {
        let listeners: Rc<Listeners<()>> = Rc::new(Listeners::new());
        let sub = listeners.subscribe(|_| {});
        drop(listeners);
        sub.cancel();
    }

    #[test]
    fn listener_may_unsubscribe_during_emit() {
        let listeners: Rc<Listeners<()>> = Rc::new(Listeners::new());
        let count = Rc::new(Cell::new(0));

        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot_clone = slot.clone();
        let c = count.clone();
        let sub = listeners.subscribe(move |_| {
            c.set(c.get() + 1);
            slot_clone.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        listeners.emit(&());
        listeners.emit(&());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn removed_mid_emit_is_skipped() {
        let listeners: Rc<Listeners<()>> = Rc::new(Listeners::new());
        let second_ran = Rc::new(Cell::new(false));

        let weak = Rc::downgrade(&listeners);
        let second_key = Rc::new(Cell::new(0));
        let sk = second_key.clone();
        listeners.add(move |_| {
            if let Some(l) = weak.upgrade() {
                l.remove(sk.get());
            }
        });
        let flag = second_ran.clone();
        second_key.set(listeners.add(move |_| flag.set(true)));

        listeners.emit(&());
        assert!(!second_ran.get());
    }

    #[test]
    fn try_emit_stops_at_first_rejection() {
        let listeners: Listeners<u32, Result<()>> = Listeners::new();
        let reached = Rc::new(Cell::new(false));

        listeners.add(|_| Err(FeatureError::watch(ObjectUid::next(), "nope")));
        let r = reached.clone();
        listeners.add(move |_| {
            r.set(true);
            Ok(())
        });

        assert!(listeners.try_emit(&1).is_err());
        assert!(!reached.get());
    }

    #[test]
    fn cancel_runs_teardown_once() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let sub = Subscription::new(move || c.set(c.get() + 1));
        assert!(sub.is_active());
        sub.cancel();
        assert_eq!(count.get(), 1);

        assert!(!Subscription::empty().is_active());
    }
}
