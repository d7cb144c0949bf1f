// ============================================================================
// spark-features - Reactive Feature Collections for Rust
// ============================================================================
//
// Keeps an ordered, observable collection of map features in sync with the
// descriptors, components and native features fed into it. An add whose id
// is already present merges into that member. Members are watched for
// changes through a one-frame debounce, and a revision counter tells
// derived views when to recompute.
// ============================================================================

pub mod collections;
pub mod container;
pub mod core;
pub mod error;
pub mod primitives;
pub mod projection;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use crate::core::constants;
pub use crate::core::context::{current_scheduler, live_watches, with_context, FeatureContext};
pub use crate::core::types::{FeatureId, ObjectUid};

pub use error::{FeatureError, ResolveError, Result};

// Re-export primitives
pub use primitives::{
    Feature, Properties, PropertyChange, Revision, RevisionMemo, ScopeKey, SubscriptionScope,
};

// Re-export reactivity plumbing
pub use reactivity::{Clock, Debouncer, Listeners, ManualClock, Scheduler, Subscription};

// Re-export collections
pub use collections::FeatureCollection;

// Re-export the container surface
pub use container::{
    ContainerBuilder, ContainerOptions, DeferredComponent, FeatureComponent, FeatureEvent,
    FeatureEventKind, FeatureLike, FeatureResolver, FeaturesContainer, Reconciled,
};

pub use projection::{CoordinateTransform, FnTransform, IdentityTransform};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn add_watch_debounce_remove_round() {
        let (scheduler, clock) = Scheduler::manual();
        let container = FeaturesContainer::builder()
            .scheduler(scheduler.clone())
            .build()
            .unwrap();

        let feature = block_on(container.add_feature(json!({
            "id": "well-1",
            "geometry": {"type": "Point", "coordinates": [10.0, 20.0]},
            "properties": {"depth": 30}
        })))
        .unwrap();
        assert_eq!(container.revision(), 1);

        feature.set_property("depth", 35);
        feature.set_property("depth", 40);
        clock.advance(constants::FRAME);
        scheduler.run_timers();
        assert_eq!(container.revision(), 2);

        assert!(container.remove_feature_by_id(&"well-1".into()).is_some());
        assert_eq!(container.revision(), 3);
        assert_eq!(container.active_watchers(), 0);
    }

    #[test]
    fn live_watches_track_every_container_on_the_thread() {
        let before = live_watches();
        let (scheduler, _clock) = Scheduler::manual();
        let a = FeaturesContainer::builder().scheduler(scheduler.clone()).build().unwrap();
        let b = FeaturesContainer::builder().scheduler(scheduler).build().unwrap();

        block_on(a.add_feature(Feature::new())).unwrap();
        block_on(b.add_feature(Feature::new())).unwrap();
        assert_eq!(live_watches(), before + 2);

        drop(a);
        assert_eq!(live_watches(), before + 1);
        b.dispose();
        assert_eq!(live_watches(), before);
    }

    #[test]
    fn custom_debounce_window() {
        let (scheduler, clock) = Scheduler::manual();
        let container = FeaturesContainer::builder()
            .scheduler(scheduler.clone())
            .debounce_ms(100.0)
            .build()
            .unwrap();
        let feature = block_on(container.add_feature(Feature::new())).unwrap();

        let bumps = Rc::new(Cell::new(0));
        let b = bumps.clone();
        let _sub = container.on_revision(move |_| b.set(b.get() + 1));

        feature.changed();
        clock.advance(constants::FRAME);
        scheduler.run_timers();
        assert_eq!(bumps.get(), 0);

        clock.advance(Duration::from_millis(100));
        scheduler.run_timers();
        assert_eq!(bumps.get(), 1);
    }
}
