pub mod config;
pub mod glyph;
pub mod phase;
pub mod trial;

pub use config::{palette, NamedColor, TrialConfig};
pub use glyph::{GlyphPlacement, StimulusSet, Symbol};
pub use phase::TrialPhase;
pub use trial::TrialResult;
