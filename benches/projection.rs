//! Criterion benchmarks for the projection engine.
//!
//! Run with:
//!   cargo bench
//!   cargo bench --features parallel
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cerebro::prelude::*;

fn stimulated_brain(n: usize, k: usize, seed: u64) -> Brain {
    let mut brain = Brain::with_seed(0.05, seed);
    brain.add_stimulus("stim", k).unwrap();
    brain.add_area("a", n, k, 0.05).unwrap();

    let stim_map = ProjectionMap::from([("stim".to_string(), vec!["a".to_string()])]);
    brain.project(&stim_map, &ProjectionMap::new()).unwrap();
    brain
}

/// Self-projection rounds at varying area sizes. The firing quota scales as
/// sqrt(n), the regime the order-statistic approximation is built for.
fn bench_projection_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("project_round");

    for size in [10_000usize, 100_000, 1_000_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("self", size), size, |b, &size| {
            let k = (size as f64).sqrt() as usize;
            let mut brain = stimulated_brain(size, k, 42);
            let area_map = ProjectionMap::from([("a".to_string(), vec!["a".to_string()])]);
            let empty = ProjectionMap::new();

            b.iter(|| {
                brain.project(&empty, &area_map).unwrap();
                black_box(brain.area("a").unwrap().support_size())
            });
        });
    }

    group.finish();
}

/// Stimulus fan-in to a fresh area: dominated by first-winner
/// materialization and connectome growth.
fn bench_fresh_area_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("fresh_area");

    group.bench_function("stimulate_100k", |b| {
        b.iter(|| {
            let brain = stimulated_brain(100_000, 316, 7);
            black_box(brain.diagnostics().stored_weights)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_projection_sizes, bench_fresh_area_growth);
criterion_main!(benches);
