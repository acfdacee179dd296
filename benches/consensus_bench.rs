use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use floodwatch_core::{
    ConsensusConfig, ConsensusEngine, ConsensusVariant, ImpactCategory, InMemoryReportRepository,
    Report,
};

fn seeded_engine(variant: ConsensusVariant, size: usize) -> ConsensusEngine<InMemoryReportRepository> {
    let engine = ConsensusEngine::new(
        Arc::new(InMemoryReportRepository::new()),
        ConsensusConfig::for_variant(variant),
    );
    for i in 0..size {
        let report = match (variant, i % 5) {
            (_, 0) => Report::not_flooded(),
            (ConsensusVariant::Depth, n) => Report::flooded_with_depth(0.4 + n as f64 * 0.05),
            (ConsensusVariant::Impact, n) => {
                Report::flooded_with_impact(ImpactCategory::ALL[n % ImpactCategory::ALL.len()])
            }
        };
        engine.submit(report).expect("seed report");
    }
    engine
}

fn bench_current_status(c: &mut Criterion) {
    // Keep per-report logging out of the measurement.
    log::set_max_level(log::LevelFilter::Off);

    let mut group = c.benchmark_group("current_status");
    for size in [100usize, 1_000, 10_000] {
        for variant in [ConsensusVariant::Depth, ConsensusVariant::Impact] {
            let engine = seeded_engine(variant, size);
            group.bench_with_input(BenchmarkId::new(variant.as_str(), size), &engine, |b, engine| {
                b.iter(|| black_box(engine.current_status().expect("status")))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_current_status);
criterion_main!(benches);
