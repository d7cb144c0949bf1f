//! Benchmarks for spark-features
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::executor::block_on;
use serde_json::json;
use spark_features::constants::FRAME;
use spark_features::{Feature, FeatureId, FeaturesContainer, Scheduler};

fn container() -> FeaturesContainer {
    let (scheduler, _clock) = Scheduler::manual();
    FeaturesContainer::builder()
        .scheduler(scheduler)
        .build()
        .unwrap()
}

fn filled(n: usize) -> FeaturesContainer {
    let c = container();
    let features: Vec<Feature> = (0..n).map(|i| Feature::new().with_id(i as u64)).collect();
    block_on(c.add_features(features)).unwrap();
    c
}

// =============================================================================
// ADD / MERGE BENCHMARKS
// =============================================================================

fn bench_add_native(c: &mut Criterion) {
    c.bench_function("add_native", |b| {
        b.iter_with_setup(container, |container| {
            black_box(block_on(container.add_feature(Feature::new())).unwrap())
        })
    });
}

fn bench_add_raw(c: &mut Criterion) {
    c.bench_function("add_raw_descriptor", |b| {
        b.iter_with_setup(container, |container| {
            let raw = json!({
                "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]},
                "properties": {"name": "trail"}
            });
            black_box(block_on(container.add_feature(raw)).unwrap())
        })
    });
}

fn bench_merge(c: &mut Criterion) {
    let container = filled(100);
    c.bench_function("merge_existing_id", |b| {
        b.iter(|| {
            let raw = json!({"id": 50, "properties": {"v": black_box(1)}});
            black_box(block_on(container.add_feature(raw)).unwrap())
        })
    });
}

// =============================================================================
// LOOKUP BENCHMARKS
// =============================================================================

fn bench_find_by_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_by_id");
    for size in [10usize, 100, 1000] {
        let container = filled(size);
        let last = FeatureId::from((size - 1) as u64);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(container.get_feature_by_id(&last)))
        });
    }
    group.finish();
}

// =============================================================================
// DEBOUNCE BENCHMARKS
// =============================================================================

fn bench_debounced_burst(c: &mut Criterion) {
    let (scheduler, clock) = Scheduler::manual();
    let container = FeaturesContainer::builder()
        .scheduler(scheduler.clone())
        .build()
        .unwrap();
    let feature = block_on(container.add_feature(Feature::new())).unwrap();

    c.bench_function("debounced_burst_100", |b| {
        b.iter(|| {
            for i in 0..100u64 {
                feature.set_property("n", i);
            }
            clock.advance(FRAME);
            black_box(scheduler.run_timers())
        })
    });
}

criterion_group!(
    benches,
    bench_add_native,
    bench_add_raw,
    bench_merge,
    bench_find_by_id,
    bench_debounced_burst,
);
criterion_main!(benches);
