//! Property-based tests for the features container.
//!
//! Random sequences of adds, removes, clears and edits must keep the store
//! free of duplicate ids, keep exactly one watch per member, and move the
//! revision forward on every structural change.

use futures::executor::block_on;
use proptest::prelude::*;
use serde_json::json;
use spark_features::constants::FRAME;
use spark_features::{Feature, FeatureId, FeaturesContainer, Scheduler};
use std::collections::HashSet;

// =============================================================================
// Generators
// =============================================================================

#[derive(Clone, Debug)]
enum Op {
    AddRaw { id: u8, value: u8 },
    AddNative { id: u8 },
    Remove { id: u8 },
    Clear,
    Edit { index: usize, value: u8 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..8, any::<u8>()).prop_map(|(id, value)| Op::AddRaw { id, value }),
        3 => (0u8..8).prop_map(|id| Op::AddNative { id }),
        3 => (0u8..8).prop_map(|id| Op::Remove { id }),
        1 => Just(Op::Clear),
        2 => (0usize..8, any::<u8>()).prop_map(|(index, value)| Op::Edit { index, value }),
    ]
}

fn arb_ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(arb_op(), 0..=max)
}

fn feature_id(id: u8) -> FeatureId {
    FeatureId::from(format!("f{}", id))
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No two members ever share an id, and every member has exactly one
    /// active watch.
    #[test]
    fn prop_unique_ids_and_watch_parity(ops in arb_ops(40)) {
        let (scheduler, clock) = Scheduler::manual();
        let c = FeaturesContainer::builder().scheduler(scheduler.clone()).build().unwrap();

        for op in ops {
            let before = c.revision();
            let structural = match op {
                Op::AddRaw { id, value } => {
                    let existed = c.get_feature_by_id(&feature_id(id)).is_some();
                    block_on(c.add_feature(json!({
                        "id": feature_id(id).to_json(),
                        "properties": {"value": value}
                    }))).unwrap();
                    !existed
                }
                Op::AddNative { id } => {
                    let existed = c.get_feature_by_id(&feature_id(id)).is_some();
                    block_on(c.add_feature(Feature::new().with_id(feature_id(id)))).unwrap();
                    !existed
                }
                Op::Remove { id } => c.remove_feature_by_id(&feature_id(id)).is_some(),
                Op::Clear => c.clear_features() > 0,
                Op::Edit { index, value } => {
                    if let Some(f) = c.get_features().get(index) {
                        f.set_property("edited", value);
                    }
                    false
                }
            };

            if structural {
                prop_assert!(c.revision() > before, "structural change must bump the revision");
            }

            let ids: Vec<FeatureId> = c.get_features().iter().filter_map(Feature::id).collect();
            let unique: HashSet<&FeatureId> = ids.iter().collect();
            prop_assert_eq!(unique.len(), c.features_count());
            prop_assert_eq!(c.active_watchers(), c.features_count());

            clock.advance(FRAME / 4);
            scheduler.run_until_idle();
        }

        c.clear_features();
        prop_assert_eq!(c.active_watchers(), 0);
    }

    /// Any number of edits inside one window collapse into one bump.
    #[test]
    fn prop_burst_collapses_to_one_bump(edits in 1usize..30) {
        let (scheduler, clock) = Scheduler::manual();
        let c = FeaturesContainer::builder().scheduler(scheduler.clone()).build().unwrap();
        let f = block_on(c.add_feature(Feature::new())).unwrap();
        let before = c.revision();

        for i in 0..edits {
            f.set_property("n", i as u64);
        }
        clock.advance(FRAME);
        scheduler.run_timers();

        prop_assert_eq!(c.revision(), before + 1);
    }
}
