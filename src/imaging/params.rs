//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what an enhanced image should look like) and the
//! [`backend`](super::backend) (which does the actual pixel work). Swapping the
//! backend for a mock in tests never touches operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (sigma + threshold).
//! - [`Modulation`]: Optional brightness/saturation multipliers.
//! - [`EnhanceParams`]: Everything one enhancement needs: source, output, target size, quality, sharpening, modulation.
//! - [`CompositeParams`]: An encoded overlay layer to blend onto an existing file in place.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// The fixed sharpening applied after upscaling a fresh upload.
    pub fn enhance_default() -> Self {
        Self {
            sigma: 1.5,
            threshold: 10,
        }
    }
}

/// Colour modulation applied after sharpening.
///
/// Both values are multipliers: `1.0` leaves the channel alone, `None` skips it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Modulation {
    pub brightness: Option<f32>,
    pub saturation: Option<f32>,
}

impl Modulation {
    pub fn is_identity(&self) -> bool {
        self.brightness.is_none_or(|b| b == 1.0) && self.saturation.is_none_or(|s| s == 1.0)
    }
}

/// Parameters for the upscale + sharpen (+ modulate) pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
    pub modulation: Modulation,
}

/// Parameters for compositing an encoded layer onto `target`, rewriting it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams {
    pub target: PathBuf,
    /// Encoded image bytes (PNG from the editor, but any decodable format works).
    pub overlay: Vec<u8>,
    pub quality: Quality,
}
