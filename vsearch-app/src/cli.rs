use clap::Parser;
use std::path::PathBuf;

/// Numeric overrides are taken as text and clamped into range, so a typo
/// never aborts a session.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "vsearch.toml")]
    pub config: PathBuf,

    /// Directory for exported results, configs and snapshots (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Run without a window: generate one stimulus, save PNG and config, exit
    #[arg(long, default_value_t = false)]
    pub nogui: bool,

    /// Distractor count (0-100)
    #[arg(long, allow_hyphen_values = true)]
    pub distractors: Option<String>,

    /// Target slash count (0-20)
    #[arg(long, allow_hyphen_values = true)]
    pub targets: Option<String>,

    /// Canvas edge in pixels (200-1000)
    #[arg(long, allow_hyphen_values = true)]
    pub canvas: Option<String>,

    /// Glyph size in pixels (12-48)
    #[arg(long, allow_hyphen_values = true)]
    pub glyph: Option<String>,

    /// Share of repeat trials in percent (0-100)
    #[arg(long, allow_hyphen_values = true)]
    pub repeat: Option<String>,

    /// Fixation duration in ms (0-5000)
    #[arg(long, allow_hyphen_values = true)]
    pub fixation: Option<String>,

    /// Number of trials (1-1000)
    #[arg(long, allow_hyphen_values = true)]
    pub trials: Option<String>,
}
