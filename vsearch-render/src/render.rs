use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tiny_skia::{
    Color, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Stroke,
    Transform,
};
use tracing::debug;
use vsearch_cache::{resolve_color, Rgba};
use vsearch_core::{palette, GlyphPlacement, Symbol};
use vsearch_experiment::RenderRequest;
use vsearch_timing::{HighPrecisionTimer, Timer};

/// Half the glyph box a slash spans horizontally, as a fraction of glyph size
const SLASH_HALF_WIDTH: f32 = 0.25;
/// Half the glyph box a slash spans vertically
const SLASH_HALF_HEIGHT: f32 = 0.35;
const FALLBACK_RGBA: Rgba = [0, 0, 0, 255];

pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub total: Duration,
    pub glyphs: usize,
}

#[derive(Hash, Eq, PartialEq, Clone, Copy)]
struct SpriteKey {
    symbol: Symbol,
    rgba: Rgba,
    glyph_size: u32,
}

/// Software renderer for the square stimulus canvas
pub struct SkiaRenderer {
    size: u32,
    canvas: Pixmap,
    background: PremultipliedColorU8,
    sprites: HashMap<SpriteKey, Pixmap>,
    timer: HighPrecisionTimer,
}

impl SkiaRenderer {
    pub fn new(size: u32) -> Result<Self> {
        let canvas = new_pixmap(size, size)?;
        let bg = rgba_of(palette::BACKGROUND);
        let background = PremultipliedColorU8::from_rgba(bg[0], bg[1], bg[2], bg[3])
            .ok_or_else(|| anyhow!("background color is not opaque"))?;
        Ok(Self {
            size,
            canvas,
            background,
            sprites: HashMap::with_capacity(32),
            timer: HighPrecisionTimer::new(),
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Last rendered frame
    pub fn pixmap(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn resize(&mut self, size: u32) -> Result<()> {
        if size == self.size {
            return Ok(());
        }
        self.canvas = new_pixmap(size, size)?;
        self.size = size;
        Ok(())
    }

    /// Draw `request` onto the canvas, resizing it to the requested canvas
    /// size first when needed.
    pub fn render(&mut self, request: &RenderRequest) -> Result<FrameStats> {
        let start = self.timer.now();
        if let Some(size) = request.canvas_size() {
            self.resize(size)?;
        }
        self.canvas.pixels_mut().fill(self.background);
        let cleared = self.timer.now();

        let glyphs = match request {
            RenderRequest::Blank => 0,
            RenderRequest::Fixation { glyph_size, .. } => {
                self.draw_fixation(*glyph_size)?;
                0
            }
            RenderRequest::Stimulus {
                stimulus,
                glyph_size,
                ..
            } => {
                for glyph in stimulus.iter() {
                    self.draw_glyph(glyph, *glyph_size)?;
                }
                stimulus.len()
            }
        };
        let done = self.timer.now();

        Ok(FrameStats {
            clear: Duration::from_nanos(cleared - start),
            draw: Duration::from_nanos(done - cleared),
            total: self.timer.elapsed(start),
            glyphs,
        })
    }

    /// Copy the canvas into an RGBA8 frame buffer of the same dimensions
    pub fn copy_into(&self, frame: &mut [u8]) -> Result<()> {
        let data = self.canvas.data();
        if frame.len() != data.len() {
            return Err(anyhow!(
                "frame buffer is {} bytes, canvas is {}",
                frame.len(),
                data.len()
            ));
        }
        frame.copy_from_slice(data);
        Ok(())
    }

    /// Static image snapshot of the last rendered frame
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.canvas
            .save_png(path)
            .map_err(|e| anyhow!("failed to write {}: {e}", path.display()))
    }

    fn draw_glyph(&mut self, glyph: &GlyphPlacement, glyph_size: u32) -> Result<()> {
        let key = SpriteKey {
            symbol: glyph.symbol,
            rgba: rgba_of(&glyph.color),
            glyph_size,
        };
        if !self.sprites.contains_key(&key) {
            let sprite = render_sprite(key)?;
            self.sprites.insert(key, sprite);
        }
        let Some(sprite) = self.sprites.get(&key) else {
            return Ok(());
        };
        let half = sprite.width() as f32 / 2.0;
        self.canvas.draw_pixmap(
            (glyph.x - half).round() as i32,
            (glyph.y - half).round() as i32,
            sprite.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// `X` of twice the glyph size at the canvas center
    fn draw_fixation(&mut self, glyph_size: u32) -> Result<()> {
        let c = self.size as f32 / 2.0;
        let arm = glyph_size as f32 * 2.0 * SLASH_HALF_WIDTH;
        let mut pb = PathBuilder::new();
        pb.move_to(c - arm, c - arm);
        pb.line_to(c + arm, c + arm);
        pb.move_to(c - arm, c + arm);
        pb.line_to(c + arm, c - arm);
        let path = pb
            .finish()
            .ok_or_else(|| anyhow!("empty fixation path"))?;

        let stroke = Stroke {
            width: stroke_width(glyph_size * 2),
            line_cap: LineCap::Round,
            ..Default::default()
        };
        let mut paint = Paint::default();
        paint.set_color(color_of(rgba_of(palette::FIXATION)));
        paint.anti_alias = true;
        self.canvas
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }
}

fn render_sprite(key: SpriteKey) -> Result<Pixmap> {
    let s = key.glyph_size as f32;
    let dim = key.glyph_size + 4;
    let mut pm = new_pixmap(dim, dim)?;
    let c = dim as f32 / 2.0;
    let dx = s * SLASH_HALF_WIDTH;
    let dy = s * SLASH_HALF_HEIGHT;

    let mut pb = PathBuilder::new();
    match key.symbol {
        Symbol::ForwardSlash => {
            pb.move_to(c - dx, c + dy);
            pb.line_to(c + dx, c - dy);
        }
        Symbol::BackSlash => {
            pb.move_to(c - dx, c - dy);
            pb.line_to(c + dx, c + dy);
        }
    }
    let path = pb.finish().ok_or_else(|| anyhow!("empty glyph path"))?;

    let stroke = Stroke {
        width: stroke_width(key.glyph_size),
        line_cap: LineCap::Round,
        ..Default::default()
    };
    let mut paint = Paint::default();
    paint.set_color(color_of(key.rgba));
    paint.anti_alias = true;
    pm.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    Ok(pm)
}

fn stroke_width(glyph_size: u32) -> f32 {
    (glyph_size as f32 * 0.1).max(2.0)
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or_else(|| anyhow!("cannot allocate {width}x{height} pixmap"))
}

fn rgba_of(color: &str) -> Rgba {
    resolve_color(color).unwrap_or_else(|| {
        debug!(color, "unrecognized color, drawing in black");
        FALLBACK_RGBA
    })
}

fn color_of(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}
