mod image;
mod pattern;
mod table;

pub use image::image_timestamp;
pub use pattern::{format_bytes, parse_pattern, pattern_matches};
pub use table::{CodeRegion, OffsetRegistry, OffsetTable, load_offsets, save_offsets};
