//! # Keel Planning Benchmarks
//!
//! | Stage | Claim | Target |
//! |-------|-------|--------|
//! | kd-01 Graph build | Linear in configs + references | < 50ms for 5k configs |
//! | kd-01 Split + sort | O(V + E log V) | < 20ms for 5k configs |
//! | kd-01 Implicit references | Template scan per config | < 500ms for 1k configs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kd_01_dependency_graph::{DependencyGraphApi, DependencyGraphService, GraphConfig};
use keel_tests::integration::fixtures::random_dag;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("kd-01-plan");
    group.measurement_time(Duration::from_secs(10));

    let service = DependencyGraphService::with_config(GraphConfig {
        implicit_references: false,
        ..Default::default()
    });

    for size in [100, 1_000, 5_000] {
        let configs = random_dag(size, 3, &mut StdRng::seed_from_u64(7));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("plan_random_dag", size), &configs, |b, configs| {
            b.iter(|| black_box(service.plan(configs.clone()).map(|p| p.components.len())))
        });
    }

    group.finish();
}

fn bench_implicit_references(c: &mut Criterion) {
    let mut group = c.benchmark_group("kd-01-implicit-references");

    let service = DependencyGraphService::new();

    for size in [100, 1_000] {
        let configs = random_dag(size, 2, &mut StdRng::seed_from_u64(11));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build_with_scan", size), &configs, |b, configs| {
            b.iter(|| black_box(service.build(configs.clone()).map(|(g, _)| g.edge_count())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan, bench_implicit_references);
criterion_main!(benches);
