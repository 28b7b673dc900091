use std::sync::Arc;
use vsearch_core::{StimulusSet, TrialConfig};

/// Trial in progress. Finished trials live on as [`vsearch_core::TrialResult`].
#[derive(Debug, Clone)]
pub struct Trial {
    pub index: usize,
    pub config: TrialConfig,
    pub stimulus: Option<Arc<StimulusSet>>,
    pub is_repeat: bool,
    pub timestamps: TrialTimestamps,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrialTimestamps {
    pub fixation_start: u64,
    pub stimulus_start: Option<u64>,
}

impl Trial {
    pub fn new(index: usize, config: TrialConfig, now_ns: u64) -> Self {
        Self {
            index,
            config,
            stimulus: None,
            is_repeat: false,
            timestamps: TrialTimestamps {
                fixation_start: now_ns,
                stimulus_start: None,
            },
        }
    }

    pub fn fixation_deadline(&self) -> u64 {
        self.timestamps
            .fixation_start
            .saturating_add(self.config.fixation_ms.saturating_mul(1_000_000))
    }

    /// Whole milliseconds between stimulus onset and `now_ns`
    pub fn reaction_ms(&self, now_ns: u64) -> Option<u64> {
        self.timestamps
            .stimulus_start
            .map(|start| now_ns.saturating_sub(start) / 1_000_000)
    }
}
