use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use vsearch_experiment::config::{
    coerce, CANVAS_BOUNDS, DISTRACTOR_BOUNDS, FIXATION_BOUNDS, GLYPH_BOUNDS, REPEAT_BOUNDS,
    TARGET_BOUNDS, TRIAL_BOUNDS,
};
use vsearch_experiment::ExperimentSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

/// Contents of `vsearch.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub experiment: ExperimentSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// A missing file means defaults; a malformed one is an error
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        info!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    /// Command-line values win over the file; everything ends up clamped
    pub fn apply_args(mut self, args: &Args) -> Self {
        let t = &mut self.experiment.trial;
        if let Some(v) = &args.distractors {
            t.distractor_count = coerce(v, DISTRACTOR_BOUNDS);
        }
        if let Some(v) = &args.targets {
            t.target_count = coerce(v, TARGET_BOUNDS);
        }
        if let Some(v) = &args.canvas {
            t.canvas_size = coerce(v, CANVAS_BOUNDS);
        }
        if let Some(v) = &args.glyph {
            t.glyph_size = coerce(v, GLYPH_BOUNDS);
        }
        if let Some(v) = &args.repeat {
            t.repeat_percentage = coerce(v, REPEAT_BOUNDS);
        }
        if let Some(v) = &args.fixation {
            t.fixation_ms = coerce(v, FIXATION_BOUNDS) as u64;
        }
        if let Some(v) = &args.trials {
            self.experiment.total_trials = coerce(v, TRIAL_BOUNDS);
        }
        if let Some(dir) = &args.output_dir {
            self.output.dir = dir.clone();
        }
        self.experiment = self.experiment.sanitized();
        self
    }
}
