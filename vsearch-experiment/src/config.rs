use serde::{Deserialize, Serialize};
use vsearch_core::{palette, TrialConfig};

/// Inclusive range a numeric setting is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, v: u32) -> u32 {
        v.clamp(self.min, self.max)
    }
}

pub const DISTRACTOR_BOUNDS: Bounds = Bounds::new(0, 100);
pub const TARGET_BOUNDS: Bounds = Bounds::new(0, 20);
pub const CANVAS_BOUNDS: Bounds = Bounds::new(200, 1000);
pub const GLYPH_BOUNDS: Bounds = Bounds::new(12, 48);
pub const REPEAT_BOUNDS: Bounds = Bounds::new(0, 100);
pub const FIXATION_BOUNDS: Bounds = Bounds::new(0, 5000);
pub const TRIAL_BOUNDS: Bounds = Bounds::new(1, 1000);

/// Coerce raw user input into `bounds`. Non-numeric input becomes the lower
/// bound; out-of-range numbers (negative included) snap to the nearest bound.
pub fn coerce(raw: &str, bounds: Bounds) -> u32 {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(v) => v.clamp(bounds.min as i64, bounds.max as i64) as u32,
        // Fractional input keeps its integer part, like a number field would
        Err(_) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                (v.trunc() as i64).clamp(bounds.min as i64, bounds.max as i64) as u32
            }
            _ => bounds.min,
        },
    }
}

/// Full run configuration: the per-trial generation parameters plus the
/// length of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentSettings {
    #[serde(flatten)]
    pub trial: TrialConfig,
    pub total_trials: u32,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            trial: TrialConfig::default(),
            total_trials: 30,
        }
    }
}

impl ExperimentSettings {
    /// Clamp every numeric field and repair unusable color lists
    pub fn sanitized(mut self) -> Self {
        let t = &mut self.trial;
        t.distractor_count = DISTRACTOR_BOUNDS.clamp(t.distractor_count);
        t.target_count = TARGET_BOUNDS.clamp(t.target_count);
        t.canvas_size = CANVAS_BOUNDS.clamp(t.canvas_size);
        t.glyph_size = GLYPH_BOUNDS.clamp(t.glyph_size);
        t.repeat_percentage = REPEAT_BOUNDS.clamp(t.repeat_percentage);
        t.fixation_ms = t.fixation_ms.min(FIXATION_BOUNDS.max as u64);

        if t.correct_target_color.trim().is_empty() {
            t.correct_target_color = palette::GREEN.to_string();
        }
        t.distractor_colors.retain(|c| !c.trim().is_empty());
        if t.distractor_colors.is_empty() {
            t.distractor_colors = TrialConfig::default().distractor_colors;
        }
        t.false_target_colors.retain(|c| !c.trim().is_empty());
        if t.false_target_colors.is_empty() {
            t.false_target_colors = TrialConfig::default().false_target_colors;
        }

        self.total_trials = TRIAL_BOUNDS.clamp(self.total_trials);
        self
    }
}
