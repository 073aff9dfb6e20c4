//! Zoom and pan of the editing surface, and the screen → pixel mapping.
//!
//! The surface is laid out at some rect (its *layout rect*, scale 1, no pan)
//! and displayed through `translate(pan) scale(scale)` about its own centre.
//! Pointer positions are mapped through the *displayed* rect, so the mapping
//! stays correct under any zoom and pan:
//!
//! ```text
//! pixel = (pointer - displayed.origin) * native / displayed.size
//! ```

use super::geometry::{Point, Rect, Size};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan: Point::ZERO,
        }
    }
}

impl Viewport {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    /// Set the scale, clamped to `[MIN_SCALE, MAX_SCALE]`.
    pub fn set_scale(&mut self, scale: f64) {
        // Snap to the step grid so repeated steps do not accumulate drift.
        let snapped = (scale / ZOOM_STEP).round() * ZOOM_STEP;
        self.scale = snapped.clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    /// Wheel: scrolling down (positive delta) zooms out, anything else zooms in.
    pub fn on_wheel(&mut self, delta_y: f64) {
        if delta_y > 0.0 {
            self.zoom_out();
        } else {
            self.zoom_in();
        }
    }

    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    /// Back to scale 1 at the layout position.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// CSS transform for the surface wrapper.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.pan.x, self.pan.y, self.scale
        )
    }

    /// Zoom label, e.g. `150` for 150%.
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// Where the surface ends up on screen.
    pub fn displayed_rect(&self, layout: Rect) -> Rect {
        let size = layout.size();
        Rect::from_center_size(
            layout.center() + self.pan,
            Size::new(size.width * self.scale, size.height * self.scale),
        )
    }

    /// Map a screen position to a (fractional) pixel of a `native`-sized image.
    pub fn to_pixel(&self, pointer: Point, layout: Rect, native: Size) -> Point {
        map_to_pixel(pointer, self.displayed_rect(layout), native)
    }
}

/// Map a screen position through an on-screen rect to image pixels.
pub fn map_to_pixel(pointer: Point, displayed: Rect, native: Size) -> Point {
    let offset = pointer - displayed.origin();
    Point::new(
        offset.x * native.width / displayed.width,
        offset.y * native.height / displayed.height,
    )
}
