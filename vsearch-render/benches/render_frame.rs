use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use vsearch_core::TrialConfig;
use vsearch_experiment::{PlacementEngine, RenderRequest};
use vsearch_render::SkiaRenderer;

fn stimulus_request(cfg: &TrialConfig) -> RenderRequest {
    let set = PlacementEngine::generate(cfg, &mut StdRng::seed_from_u64(5));
    RenderRequest::Stimulus {
        stimulus: Arc::new(set),
        canvas_size: cfg.canvas_size,
        glyph_size: cfg.glyph_size,
    }
}

pub fn bench_frames(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(40);

    let cfg = TrialConfig {
        distractor_count: 60,
        target_count: 5,
        canvas_size: 800,
        ..Default::default()
    };
    let request = stimulus_request(&cfg);

    g.bench_function("stimulus_warm_cache", |b| {
        let mut r = SkiaRenderer::new(cfg.canvas_size).expect("renderer");
        r.render(&request).expect("warm-up frame");
        let mut fb = vec![0u8; (cfg.canvas_size * cfg.canvas_size * 4) as usize];
        b.iter(|| {
            let stats = r.render(&request).expect("frame");
            r.copy_into(&mut fb).expect("copy");
            black_box(stats.glyphs);
        })
    });

    g.bench_function("stimulus_cold_cache", |b| {
        b.iter_batched(
            || SkiaRenderer::new(cfg.canvas_size).expect("renderer"),
            |mut r| black_box(r.render(&request).expect("frame").glyphs),
            BatchSize::SmallInput,
        )
    });

    g.bench_function("fixation", |b| {
        let mut r = SkiaRenderer::new(cfg.canvas_size).expect("renderer");
        let fixation = RenderRequest::Fixation {
            canvas_size: cfg.canvas_size,
            glyph_size: cfg.glyph_size,
        };
        b.iter(|| black_box(r.render(&fixation).expect("frame").total))
    });

    g.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
