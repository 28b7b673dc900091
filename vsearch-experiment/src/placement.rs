use rand::Rng;
use tracing::debug;
use vsearch_core::{palette, GlyphPlacement, StimulusSet, Symbol, TrialConfig};

/// Margin kept free along every canvas edge
pub const PADDING: f32 = 40.0;
/// Draws per glyph before it is dropped
pub const MAX_ATTEMPTS: usize = 1000;
/// Minimum center distance as a multiple of the glyph size
pub const SPACING_FACTOR: f32 = 1.5;
/// Far more than fits on the largest canvas at the smallest glyph size
const MAX_PREALLOCATED: usize = 1024;

/// Rejection-sampling placement of distractors and targets
pub struct PlacementEngine;

impl PlacementEngine {
    /// Places `distractor_count` back-slashes then `target_count`
    /// forward-slashes, each at least `glyph_size * 1.5` from every glyph
    /// already placed. A glyph that finds no free spot within
    /// [`MAX_ATTEMPTS`] draws is left out, so the set may be shorter than
    /// requested.
    pub fn generate<R: Rng + ?Sized>(config: &TrialConfig, rng: &mut R) -> StimulusSet {
        let canvas = config.canvas_size as f32;
        let min_distance = config.glyph_size as f32 * SPACING_FACTOR;
        let mut glyphs: Vec<GlyphPlacement> =
            Vec::with_capacity(config.requested_glyphs().min(MAX_PREALLOCATED));
        let mut dropped = 0usize;

        for _ in 0..config.distractor_count {
            let Some((x, y)) = find_free_spot(&glyphs, canvas, min_distance, rng) else {
                dropped += 1;
                continue;
            };
            let color = pick_random(&config.distractor_colors, rng)
                .unwrap_or(palette::GREY)
                .to_string();
            glyphs.push(GlyphPlacement {
                x,
                y,
                is_target: false,
                color,
                symbol: Symbol::BackSlash,
            });
        }

        let mut placed_targets = 0usize;
        for _ in 0..config.target_count {
            let Some((x, y)) = find_free_spot(&glyphs, canvas, min_distance, rng) else {
                dropped += 1;
                continue;
            };
            let is_target = placed_targets == 0;
            let color = if is_target {
                config.correct_target_color.clone()
            } else {
                false_target_color(config, placed_targets - 1).to_string()
            };
            glyphs.push(GlyphPlacement {
                x,
                y,
                is_target,
                color,
                symbol: Symbol::ForwardSlash,
            });
            placed_targets += 1;
        }

        if dropped > 0 {
            debug!(
                dropped,
                requested = config.requested_glyphs(),
                canvas = config.canvas_size,
                glyph = config.glyph_size,
                "placement exhausted attempts for some glyphs"
            );
        }

        StimulusSet::new(glyphs)
    }
}

/// Color of the `index`-th false target, cycling through the configured list
pub fn false_target_color(config: &TrialConfig, index: usize) -> &str {
    if config.false_target_colors.is_empty() {
        return &config.correct_target_color;
    }
    &config.false_target_colors[index % config.false_target_colors.len()]
}

fn pick_random<'a, R: Rng + ?Sized>(colors: &'a [String], rng: &mut R) -> Option<&'a str> {
    if colors.is_empty() {
        return None;
    }
    Some(&colors[rng.random_range(0..colors.len())])
}

fn find_free_spot<R: Rng + ?Sized>(
    placed: &[GlyphPlacement],
    canvas: f32,
    min_distance: f32,
    rng: &mut R,
) -> Option<(f32, f32)> {
    let span = (canvas - 2.0 * PADDING).max(0.0);
    for _ in 0..MAX_ATTEMPTS {
        let x = PADDING + rng.random::<f32>() * span;
        let y = PADDING + rng.random::<f32>() * span;
        if placed.iter().all(|g| g.distance_to(x, y) > min_distance) {
            return Some((x, y));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(distractors: u32, targets: u32, canvas: u32, glyph: u32) -> TrialConfig {
        TrialConfig {
            distractor_count: distractors,
            target_count: targets,
            canvas_size: canvas,
            glyph_size: glyph,
            ..Default::default()
        }
    }

    #[test]
    fn single_target_on_empty_canvas() {
        let set = PlacementEngine::generate(&config(0, 1, 600, 24), &mut rand::rng());
        assert_eq!(set.len(), 1);
        assert!(set.glyphs()[0].is_target);
        assert_eq!(set.glyphs()[0].symbol, Symbol::ForwardSlash);
    }

    #[test]
    fn generous_spacing_places_everything() {
        let cfg = config(20, 3, 1000, 12);
        let set = PlacementEngine::generate(&cfg, &mut rand::rng());
        assert_eq!(set.len(), 23);
        assert_eq!(set.distractors().count(), 20);
        assert_eq!(set.targets().count(), 3);
    }

    #[test]
    fn distractors_precede_targets() {
        let set = PlacementEngine::generate(&config(10, 4, 800, 12), &mut rand::rng());
        let first_target = set
            .iter()
            .position(|g| g.symbol == Symbol::ForwardSlash)
            .unwrap();
        assert!(set.glyphs()[first_target..]
            .iter()
            .all(|g| g.symbol == Symbol::ForwardSlash));
    }

    #[test]
    fn correct_target_uses_correct_color_and_false_targets_cycle() {
        let cfg = TrialConfig {
            target_count: 6,
            distractor_count: 0,
            canvas_size: 1000,
            glyph_size: 12,
            false_target_colors: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let set = PlacementEngine::generate(&cfg, &mut rand::rng());
        let colors: Vec<&str> = set.targets().map(|g| g.color.as_str()).collect();
        assert_eq!(
            colors,
            vec![cfg.correct_target_color.as_str(), "a", "b", "a", "b", "a"]
        );
        assert_eq!(set.iter().filter(|g| g.is_target).count(), 1);
        assert!(set.glyphs()[0].is_target);
    }

    #[test]
    fn distractor_colors_come_from_the_configured_list() {
        let cfg = config(30, 0, 1000, 12);
        let set = PlacementEngine::generate(&cfg, &mut rand::rng());
        assert!(set.iter().all(|g| cfg.distractor_colors.contains(&g.color)));
        assert!(set.iter().all(|g| !g.is_target));
    }

    #[test]
    fn dense_configuration_degrades_without_panicking() {
        let cfg = config(100, 20, 200, 48);
        let set = PlacementEngine::generate(&cfg, &mut StdRng::seed_from_u64(7));
        assert!(set.len() < cfg.requested_glyphs());
        assert!(!set.is_empty());
        if let Some(d) = set.min_pairwise_distance() {
            assert!(d > 48.0 * SPACING_FACTOR);
        }
    }

    #[test]
    fn empty_color_lists_fall_back() {
        let cfg = TrialConfig {
            distractor_count: 2,
            target_count: 2,
            distractor_colors: vec![],
            false_target_colors: vec![],
            ..Default::default()
        };
        let set = PlacementEngine::generate(&cfg, &mut rand::rng());
        for g in set.distractors() {
            assert_eq!(g.color, palette::GREY);
        }
        for g in set.targets() {
            assert_eq!(g.color, cfg.correct_target_color);
        }
    }

    #[test]
    fn undersized_canvas_does_not_panic() {
        let set = PlacementEngine::generate(&config(3, 1, 50, 12), &mut rand::rng());
        assert_eq!(set.len(), 1);
        assert_eq!(set.glyphs()[0].x, PADDING);
    }

    #[test]
    fn oversized_request_keeps_only_what_fits() {
        let cfg = config(5000, 0, 100, 48);
        assert_eq!(cfg.requested_glyphs(), 5000);
        let set = PlacementEngine::generate(&cfg, &mut StdRng::seed_from_u64(11));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn positions_stay_inside_padding() {
        let cfg = config(40, 5, 400, 12);
        let set = PlacementEngine::generate(&cfg, &mut rand::rng());
        let max = cfg.canvas_size as f32 - PADDING;
        for g in &set {
            assert!(g.x >= PADDING && g.x <= max);
            assert!(g.y >= PADDING && g.y <= max);
        }
    }

    proptest! {
        #[test]
        fn placements_respect_spacing_and_counts(
            distractors in 0u32..60,
            targets in 0u32..10,
            canvas in 200u32..1000,
            glyph in 12u32..48,
            seed in any::<u64>(),
        ) {
            let cfg = config(distractors, targets, canvas, glyph);
            let set = PlacementEngine::generate(&cfg, &mut StdRng::seed_from_u64(seed));

            prop_assert!(set.len() <= cfg.requested_glyphs());
            if let Some(d) = set.min_pairwise_distance() {
                prop_assert!(d > glyph as f32 * SPACING_FACTOR);
            }

            let correct = set.iter().filter(|g| g.is_target).count();
            if set.targets().count() > 0 {
                prop_assert_eq!(correct, 1);
                let first = set.targets().next().unwrap();
                prop_assert!(first.is_target);
                prop_assert_eq!(&first.color, &cfg.correct_target_color);
            } else {
                prop_assert_eq!(correct, 0);
            }

            for (i, g) in set.targets().enumerate().skip(1) {
                let expected = &cfg.false_target_colors[(i - 1) % cfg.false_target_colors.len()];
                prop_assert_eq!(&g.color, expected);
            }
        }
    }
}
