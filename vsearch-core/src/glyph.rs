use serde::{Deserialize, Serialize};

/// Glyph drawn at a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "/")]
    ForwardSlash,
    #[serde(rename = "\\")]
    BackSlash,
}

impl Symbol {
    pub fn as_char(&self) -> char {
        match self {
            Symbol::ForwardSlash => '/',
            Symbol::BackSlash => '\\',
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One glyph on the stimulus canvas. Coordinates are the glyph center in
/// canvas units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphPlacement {
    pub x: f32,
    pub y: f32,
    pub is_target: bool,
    pub color: String,
    pub symbol: Symbol,
}

impl GlyphPlacement {
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

/// Ordered glyphs of one trial: distractors first, then targets. The first
/// target-symbol glyph is the correct target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StimulusSet {
    glyphs: Vec<GlyphPlacement>,
}

impl StimulusSet {
    pub fn new(glyphs: Vec<GlyphPlacement>) -> Self {
        Self { glyphs }
    }

    pub fn glyphs(&self) -> &[GlyphPlacement] {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GlyphPlacement> {
        self.glyphs.iter()
    }

    /// Target-symbol glyphs in placement order, correct target first
    pub fn targets(&self) -> impl Iterator<Item = &GlyphPlacement> {
        self.glyphs
            .iter()
            .filter(|g| g.symbol == Symbol::ForwardSlash)
    }

    pub fn distractors(&self) -> impl Iterator<Item = &GlyphPlacement> {
        self.glyphs.iter().filter(|g| g.symbol == Symbol::BackSlash)
    }

    pub fn correct_target(&self) -> Option<&GlyphPlacement> {
        self.glyphs.iter().find(|g| g.is_target)
    }

    /// Smallest distance between any two glyphs, `None` with fewer than two
    pub fn min_pairwise_distance(&self) -> Option<f32> {
        let mut min: Option<f32> = None;
        for (i, a) in self.glyphs.iter().enumerate() {
            for b in &self.glyphs[i + 1..] {
                let d = a.distance_to(b.x, b.y);
                min = Some(min.map_or(d, |m| m.min(d)));
            }
        }
        min
    }
}

impl<'a> IntoIterator for &'a StimulusSet {
    type Item = &'a GlyphPlacement;
    type IntoIter = std::slice::Iter<'a, GlyphPlacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.glyphs.iter()
    }
}
