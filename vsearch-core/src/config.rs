use serde::{Deserialize, Serialize};

/// Palette entry offered to the experimenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub value: &'static str,
}

pub mod palette {
    use super::NamedColor;

    pub const GREEN: &str = "hsl(162, 73%, 46%)";
    pub const RED: &str = "hsl(0, 73%, 57%)";
    pub const BLUE: &str = "hsl(221, 83%, 53%)";
    pub const YELLOW: &str = "hsl(43, 96%, 56%)";
    pub const PURPLE: &str = "hsl(270, 50%, 40%)";
    pub const ORANGE: &str = "hsl(15, 86%, 50%)";
    pub const GREY: &str = "hsl(210, 11%, 30%)";
    pub const CYAN: &str = "hsl(180, 73%, 46%)";
    pub const PINK: &str = "hsl(330, 73%, 57%)";

    pub const BACKGROUND: &str = "hsl(0, 0%, 95%)";
    pub const FIXATION: &str = "#222";

    pub const AVAILABLE: [NamedColor; 9] = [
        NamedColor { name: "Green", value: GREEN },
        NamedColor { name: "Red", value: RED },
        NamedColor { name: "Blue", value: BLUE },
        NamedColor { name: "Yellow", value: YELLOW },
        NamedColor { name: "Purple", value: PURPLE },
        NamedColor { name: "Orange", value: ORANGE },
        NamedColor { name: "Grey", value: GREY },
        NamedColor { name: "Cyan", value: CYAN },
        NamedColor { name: "Pink", value: PINK },
    ];

    /// Case-insensitive lookup of a palette name
    pub fn by_name(name: &str) -> Option<&'static NamedColor> {
        AVAILABLE.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Snapshot of every stimulus generation parameter. A copy is taken when a
/// trial starts and stored with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    pub distractor_count: u32,
    pub target_count: u32,
    pub canvas_size: u32,
    pub glyph_size: u32,
    pub correct_target_color: String,
    pub distractor_colors: Vec<String>,
    pub false_target_colors: Vec<String>,
    pub repeat_percentage: u32,
    pub fixation_ms: u64,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            distractor_count: 20,
            target_count: 3,
            canvas_size: 600,
            glyph_size: 24,
            correct_target_color: palette::GREEN.to_string(),
            distractor_colors: vec![
                palette::GREY.to_string(),
                palette::PURPLE.to_string(),
                palette::ORANGE.to_string(),
            ],
            false_target_colors: vec![
                palette::RED.to_string(),
                palette::BLUE.to_string(),
                palette::YELLOW.to_string(),
            ],
            repeat_percentage: 20,
            fixation_ms: 1000,
        }
    }
}

impl TrialConfig {
    /// Requested glyph count, before any placement is dropped
    pub fn requested_glyphs(&self) -> usize {
        self.distractor_count.saturating_add(self.target_count) as usize
    }

    /// Probability that a trial reuses the reserve stimulus set
    pub fn repeat_probability(&self) -> f64 {
        (self.repeat_percentage.min(100) as f64) / 100.0
    }
}
