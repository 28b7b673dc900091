pub mod cache;

pub use cache::{Atom, Rgba, color_count, parse_color, resolve_color};
