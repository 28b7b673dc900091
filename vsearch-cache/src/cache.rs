use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
pub use string_cache::DefaultAtom as Atom;
use vsearch_core::palette;

/// Straight (non-premultiplied) RGBA
pub type Rgba = [u8; 4];

lazy_static! {
    static ref COLOR_CACHE: RwLock<HashMap<Atom, Rgba>> = RwLock::new(HashMap::new());
}

/// Resolve a color identifier, memoizing successful parses. Glyph colors
/// repeat across every placement of every trial, so each distinct string is
/// parsed once.
pub fn resolve_color(s: &str) -> Option<Rgba> {
    let atom = Atom::from(s);
    {
        let map = COLOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(rgba) = map.get(&atom) {
            return Some(*rgba);
        }
    }
    let rgba = parse_color(s)?;
    COLOR_CACHE
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(atom, rgba);
    Some(rgba)
}

/// Current count of cached colors
pub fn color_count() -> usize {
    COLOR_CACHE.read().unwrap_or_else(|e| e.into_inner()).len()
}

/// Parse `hsl(h, s%, l%)`, `#rgb`, `#rrggbb`, `#rrggbbaa` or a palette name
pub fn parse_color(s: &str) -> Option<Rgba> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(body) = s
        .strip_prefix("hsl(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_hsl(body);
    }
    palette::by_name(s).and_then(|named| parse_color(named.value))
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some([digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, 255]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

fn parse_hsl(body: &str) -> Option<Rgba> {
    let mut parts = body
        .split([',', ' '])
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let h: f32 = parts.next()?.trim_end_matches("deg").parse().ok()?;
    let s: f32 = parts.next()?.trim_end_matches('%').parse().ok()?;
    let l: f32 = parts.next()?.trim_end_matches('%').parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let (r, g, b) = hsl_to_rgb(h, s / 100.0, l / 100.0);
    Some([r, g, b, 255])
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
