//! Brush settings: colour, size, and how size scales with the image.

use super::EditorError;
use image::Rgba;

/// Slider value the brush starts at.
pub const DEFAULT_SIZE: f64 = 5.0;

/// How a stroke combines with what is already on the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOp {
    /// Source-over with the brush colour.
    Paint,
    /// Clear whatever the stroke covers.
    Erase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Rgba<u8>,
    pub size: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Rgba([255, 0, 0, 255]),
            size: DEFAULT_SIZE,
        }
    }
}

impl Brush {
    /// Stroke width in image pixels. A size-`n` brush is `n` pixels wide on
    /// a 500 px image and `8n` wide on a 4000 px one.
    pub fn line_width(&self, native_width: f64) -> f64 {
        self.size * (native_width / 1000.0 * 2.0)
    }

    pub fn set_color_hex(&mut self, hex: &str) -> Result<(), EditorError> {
        self.color = parse_hex_color(hex)?;
        Ok(())
    }
}

/// Parse `#rgb` or `#rrggbb` (the `#` is optional) into an opaque colour.
pub fn parse_hex_color(input: &str) -> Result<Rgba<u8>, EditorError> {
    let invalid = || EditorError::InvalidColor(input.to_string());
    let hex = input.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ])),
        3 => {
            let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
            Ok(Rgba([short(0)?, short(1)?, short(2)?, 255]))
        }
        _ => Err(invalid()),
    }
}
