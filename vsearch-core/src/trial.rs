use crate::{StimulusSet, TrialConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Recorded result per completed trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub config: TrialConfig,
    pub is_repeat: bool,
    pub elapsed_ms: u64,
    /// Glyphs shown in the trial, kept for the tabular export only
    #[serde(skip)]
    pub stimulus: Arc<StimulusSet>,
}
