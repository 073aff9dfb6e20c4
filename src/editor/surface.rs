//! The stroke layer: a transparent RGBA buffer at the target's native size.
//!
//! Segments are rasterized as capsules (a line with round caps), so a
//! polyline of segments gets round joins for free.

use super::EditorError;
use super::brush::CompositeOp;
use super::geometry::Point;
use crate::overlay;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone)]
pub struct StrokeLayer {
    pixels: RgbaImage,
}

impl StrokeLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, CLEAR),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Stroke `from → to` with the given width in image pixels.
    pub fn stroke_segment(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Rgba<u8>,
        op: CompositeOp,
    ) {
        let radius = (width / 2.0).max(0.5);
        let (w, h) = (self.width() as f64, self.height() as f64);

        let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius).ceil().min(w);
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
        let max_y = (from.y.max(to.y) + radius).ceil().min(h);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let paint = match op {
            CompositeOp::Paint => color,
            CompositeOp::Erase => CLEAR,
        };

        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if distance_to_segment(center, from, to) <= radius {
                    self.pixels.put_pixel(x, y, paint);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = CLEAR;
        }
    }

    /// True when nothing visible has been drawn.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[3] == 0)
    }

    pub fn to_png(&self) -> Result<Vec<u8>, EditorError> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| EditorError::Encode(e.to_string()))?;
        Ok(buf.into_inner())
    }

    /// PNG data URL, the form `/reprocess` expects.
    pub fn to_data_url(&self) -> Result<String, EditorError> {
        Ok(overlay::to_data_url("image/png", &self.to_png()?))
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + ab.x * t, a.y + ab.y * t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Overlay;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn new_layer_is_blank() {
        let layer = StrokeLayer::new(16, 8);
        assert!(layer.is_blank());
        assert_eq!((layer.width(), layer.height()), (16, 8));
    }

    #[test]
    fn horizontal_stroke_covers_its_band() {
        let mut layer = StrokeLayer::new(20, 20);
        layer.stroke_segment(
            Point::new(2.0, 10.0),
            Point::new(18.0, 10.0),
            4.0,
            RED,
            CompositeOp::Paint,
        );

        assert_eq!(*layer.pixels().get_pixel(10, 10), RED);
        assert_eq!(*layer.pixels().get_pixel(10, 8), RED);
        assert_eq!(layer.pixels().get_pixel(10, 3).0[3], 0);
        // Round cap reaches past the endpoint by the radius.
        assert_eq!(*layer.pixels().get_pixel(0, 10), RED);
    }

    #[test]
    fn zero_length_segment_draws_a_dot() {
        let mut layer = StrokeLayer::new(10, 10);
        let p = Point::new(5.0, 5.0);
        layer.stroke_segment(p, p, 3.0, RED, CompositeOp::Paint);
        assert!(!layer.is_blank());
        assert_eq!(layer.pixels().get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn erase_clears_only_covered_pixels() {
        let mut layer = StrokeLayer::new(10, 10);
        layer.stroke_segment(
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
            10.0,
            RED,
            CompositeOp::Paint,
        );
        layer.stroke_segment(
            Point::new(5.0, 5.0),
            Point::new(5.0, 5.0),
            2.0,
            RED,
            CompositeOp::Erase,
        );
        assert_eq!(layer.pixels().get_pixel(5, 5).0[3], 0);
        assert_eq!(*layer.pixels().get_pixel(1, 1), RED);
    }

    #[test]
    fn strokes_outside_the_layer_are_ignored() {
        let mut layer = StrokeLayer::new(10, 10);
        layer.stroke_segment(
            Point::new(-50.0, -50.0),
            Point::new(-40.0, -40.0),
            4.0,
            RED,
            CompositeOp::Paint,
        );
        assert!(layer.is_blank());
    }

    #[test]
    fn clear_resets_layer() {
        let mut layer = StrokeLayer::new(4, 4);
        layer.stroke_segment(Point::ZERO, Point::new(4.0, 4.0), 2.0, RED, CompositeOp::Paint);
        layer.clear();
        assert!(layer.is_blank());
    }

    #[test]
    fn data_url_decodes_back_to_same_size_png() {
        let layer = StrokeLayer::new(7, 3);
        let url = layer.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let decoded = Overlay::from_data_url(&url).unwrap();
        let img = image::load_from_memory(&decoded.bytes).unwrap();
        assert_eq!((img.width(), img.height()), (7, 3));
    }
}
