// ============================================================================
// spark-features - Merge Strategy
// Insert a normalized feature, or fold it into the member with its id
// ============================================================================
//
// Two identities meet here. Lookup is by feature id (linear scan), while
// store membership is by object. A candidate whose id matches a member is
// merged into that member, which keeps its object identity; the candidate
// object itself never enters the store.
// ============================================================================

use crate::collections::FeatureCollection;
use crate::error::Result;
use crate::primitives::feature::Feature;

/// What `reconcile` did with a candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// No member had the candidate's id; the candidate was appended
    Inserted(Feature),

    /// The candidate was merged into this existing member
    Merged(Feature),

    /// The candidate already is the member with its id
    Unchanged(Feature),
}

impl Reconciled {
    /// The store member that now represents the candidate.
    pub fn feature(&self) -> &Feature {
        match self {
            Reconciled::Inserted(f) | Reconciled::Merged(f) | Reconciled::Unchanged(f) => f,
        }
    }

    pub fn into_feature(self) -> Feature {
        match self {
            Reconciled::Inserted(f) | Reconciled::Merged(f) | Reconciled::Unchanged(f) => f,
        }
    }
}

/// Insert `candidate` into `store`, or merge it into the member sharing its
/// id.
///
/// Inserting fires the store's add event (and fails if an add listener
/// rejects the feature). Merging fires no store events, only the member's
/// own change events.
pub fn reconcile(store: &FeatureCollection, candidate: Feature) -> Result<Reconciled> {
    let existing = candidate.id().and_then(|id| store.find_by_id(&id));

    match existing {
        None => {
            store.add(candidate.clone())?;
            Ok(Reconciled::Inserted(candidate))
        }
        Some(member) if member.ptr_eq(&candidate) => Ok(Reconciled::Unchanged(member)),
        Some(member) => {
            merge_features(&member, &candidate);
            Ok(Reconciled::Merged(member))
        }
    }
}

/// Copy geometry and properties from `source` onto `target`.
///
/// Present fields overwrite; a missing geometry or an absent property key
/// leaves the target's value in place. The target's id is never touched.
pub fn merge_features(target: &Feature, source: &Feature) {
    if let Some(geometry) = source.geometry() {
        target.set_geometry(Some(geometry));
    }
    target.set_properties(source.properties());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, Point};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn point(x: f64) -> Geometry<f64> {
        Geometry::Point(Point::new(x, 0.0))
    }

    #[test]
    fn new_id_is_inserted() {
        let store = FeatureCollection::new();
        let f = Feature::new().with_id("a");

        let outcome = reconcile(&store, f.clone()).unwrap();
        assert_eq!(outcome, Reconciled::Inserted(f.clone()));
        assert!(store.contains(&f));
    }

    #[test]
    fn same_id_merges_into_existing_member() {
        let store = FeatureCollection::new();
        let first = Feature::new()
            .with_id("a")
            .with_geometry(point(1.0))
            .with_property("name", "old")
            .with_property("kept", true);
        reconcile(&store, first.clone()).unwrap();

        let second = Feature::new()
            .with_id("a")
            .with_geometry(point(2.0))
            .with_property("name", "new");
        let outcome = reconcile(&store, second.clone()).unwrap();

        assert_eq!(outcome, Reconciled::Merged(first.clone()));
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&second));
        assert_eq!(first.geometry(), Some(point(2.0)));
        assert_eq!(first.property("name"), Some(json!("new")));
        assert_eq!(first.property("kept"), Some(json!(true)));
    }

    #[test]
    fn missing_geometry_leaves_target_geometry() {
        let target = Feature::new().with_geometry(point(1.0));
        merge_features(&target, &Feature::new().with_property("x", 1));
        assert_eq!(target.geometry(), Some(point(1.0)));
        assert_eq!(target.property("x"), Some(json!(1)));
    }

    #[test]
    fn merge_fires_member_events_not_store_events() {
        let store = FeatureCollection::new();
        let member = Feature::new().with_id("a").with_geometry(point(1.0));
        reconcile(&store, member.clone()).unwrap();

        let store_events = Rc::new(Cell::new(0));
        let s = store_events.clone();
        let _adds = store.on_add(move |_| s.set(s.get() + 1));
        let s = store_events.clone();
        let _removes = store.on_remove(move |_| s.set(s.get() + 1));

        let changes = Rc::new(Cell::new(0));
        let c = changes.clone();
        let _sub = member.on_change(move || c.set(c.get() + 1)).unwrap();

        reconcile(&store, Feature::new().with_id("a").with_geometry(point(9.0))).unwrap();

        assert_eq!(store_events.get(), 0);
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn re_adding_the_member_is_unchanged() {
        let store = FeatureCollection::new();
        let f = Feature::new().with_id("a");
        reconcile(&store, f.clone()).unwrap();

        assert_eq!(reconcile(&store, f.clone()).unwrap(), Reconciled::Unchanged(f));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rejected_insert_propagates() {
        let store = FeatureCollection::new();
        let _adds = store.on_admit(|f| Err(crate::FeatureError::watch(f.uid(), "no")));

        let f = Feature::new().with_id("a");
        assert!(reconcile(&store, f.clone()).is_err());
        assert!(store.is_empty());
    }
}
