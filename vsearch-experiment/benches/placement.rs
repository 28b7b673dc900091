use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;
use vsearch_core::TrialConfig;
use vsearch_experiment::PlacementEngine;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");

    for (distractors, canvas) in [(20u32, 600u32), (60, 600), (100, 1000), (100, 300)] {
        let cfg = TrialConfig {
            distractor_count: distractors,
            canvas_size: canvas,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{distractors}@{canvas}")),
            &cfg,
            |b, cfg| b.iter(|| black_box(PlacementEngine::generate(cfg, &mut rng))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
