// ============================================================================
// spark-features - FeatureCollection
// Ordered, mutation-observable set of features (the source of truth)
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::types::FeatureId;
use crate::error::Result;
use crate::primitives::feature::Feature;
use crate::reactivity::events::{Listeners, Subscription};

// =============================================================================
// FEATURE COLLECTION
// =============================================================================

/// An ordered collection of features, unique by object identity.
///
/// Three hooks fire synchronously at the point of mutation:
/// 1. admit: after a feature is appended, before anyone else hears of it.
///    An admit guard may reject the feature, in which case it is withdrawn
///    again, no add event fires and `add` returns the error. Guards are
///    crate-internal; the container's watcher is the only one.
/// 2. add: once the feature has been admitted. Add listeners cannot veto.
/// 3. remove: after a feature has left the collection.
///
/// Lookup by id is a linear scan; there is no id index.
///
/// # Example
///
/// ```
/// use spark_features::{Feature, FeatureCollection};
///
/// let features = FeatureCollection::new();
/// let f = Feature::new().with_id("a");
///
/// assert!(features.add(f.clone()).unwrap());
/// assert!(!features.add(f.clone()).unwrap()); // already a member
/// assert_eq!(features.find_by_id(&"a".into()), Some(f.clone()));
///
/// assert!(features.remove(&f));
/// assert!(features.is_empty());
/// ```
pub struct FeatureCollection {
    data: RefCell<Vec<Feature>>,
    admits: Rc<Listeners<Feature, Result<()>>>,
    adds: Rc<Listeners<Feature>>,
    removes: Rc<Listeners<Feature>>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            data: RefCell::new(Vec::new()),
            admits: Rc::new(Listeners::new()),
            adds: Rc::new(Listeners::new()),
            removes: Rc::new(Listeners::new()),
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Append a feature.
    ///
    /// Returns `Ok(false)` without firing if the object is already a member.
    pub fn add(&self, feature: Feature) -> Result<bool> {
        if self.contains(&feature) {
            return Ok(false);
        }

        self.data.borrow_mut().push(feature.clone());

        if let Err(err) = self.admits.try_emit(&feature) {
            self.data.borrow_mut().retain(|f| !f.ptr_eq(&feature));
            log::debug!("feature {} withdrawn from collection: {}", feature.uid(), err);
            return Err(err);
        }

        self.adds.emit(&feature);
        Ok(true)
    }

    /// Remove a member by object identity. Returns false if it was not a
    /// member.
    pub fn remove(&self, feature: &Feature) -> bool {
        let removed = {
            let mut data = self.data.borrow_mut();
            data.iter()
                .position(|f| f.ptr_eq(feature))
                .map(|idx| data.remove(idx))
        };

        match removed {
            Some(removed) => {
                self.removes.emit(&removed);
                true
            }
            None => false,
        }
    }

    /// Remove every member, one remove event each (last member first).
    ///
    /// Returns the number of members removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        loop {
            let last = self.data.borrow_mut().pop();
            match last {
                Some(feature) => {
                    self.removes.emit(&feature);
                    removed += 1;
                }
                None => break,
            }
        }
        removed
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    /// Snapshot of the members in insertion order.
    pub fn list(&self) -> Vec<Feature> {
        self.data.borrow().clone()
    }

    /// Borrow the members without cloning the list.
    ///
    /// The closure must not mutate the collection.
    pub fn with_features<R>(&self, f: impl FnOnce(&[Feature]) -> R) -> R {
        f(&self.data.borrow())
    }

    pub fn get(&self, index: usize) -> Option<Feature> {
        self.data.borrow().get(index).cloned()
    }

    /// First member whose id equals `id` (linear scan).
    pub fn find_by_id(&self, id: &FeatureId) -> Option<Feature> {
        self.data
            .borrow()
            .iter()
            .find(|f| f.id().as_ref() == Some(id))
            .cloned()
    }

    /// Is this exact object a member?
    pub fn contains(&self, feature: &Feature) -> bool {
        self.data.borrow().iter().any(|f| f.ptr_eq(feature))
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Observe additions. Runs only for features that were admitted.
    pub fn on_add(&self, f: impl Fn(&Feature) + 'static) -> Subscription {
        self.adds.subscribe(f)
    }

    /// Install an admission guard. Returning an error rejects the feature.
    ///
    /// The collection withdraws a rejected feature without firing add or
    /// remove events, so a guard that fails must not have changed anything.
    /// No other guard or listener can undo what an accepting guard did,
    /// which is why this hook stays inside the crate.
    pub(crate) fn on_admit(&self, f: impl Fn(&Feature) -> Result<()> + 'static) -> Subscription {
        self.admits.subscribe(f)
    }

    /// Observe removals.
    pub fn on_remove(&self, f: impl Fn(&Feature) + 'static) -> Subscription {
        self.removes.subscribe(f)
    }

    /// Number of guards and add/remove listeners attached.
    pub fn listener_count(&self) -> usize {
        self.admits.len() + self.adds.len() + self.removes.len()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FeatureCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureCollection")
            .field("data", &self.data.borrow())
            .field("len", &self.data.borrow().len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
