//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, CompositeOutcome, Dimensions, ImageBackend};
use super::calculations::calculate_enhanced_dimensions;
use super::params::{CompositeParams, EnhanceParams, Modulation, Quality, Sharpening};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for the enhancement pipeline.
#[derive(Debug, Clone)]
pub struct EnhanceConfig {
    /// Upscale multiplier applied to the width.
    pub scale_factor: u32,
    /// Hard cap on the output width.
    pub max_width: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
    pub modulation: Modulation,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            scale_factor: 2,
            max_width: 4000,
            quality: Quality::default(),
            sharpening: Some(Sharpening::enhance_default()),
            modulation: Modulation::default(),
        }
    }
}

/// Plan an enhancement without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_enhance(
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
    config: &EnhanceConfig,
) -> EnhanceParams {
    let (width, height) =
        calculate_enhanced_dimensions(original_dims, config.scale_factor, config.max_width);

    EnhanceParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: config.quality,
        sharpening: config.sharpening,
        modulation: config.modulation,
    }
}

/// Run the enhancement pipeline on `source`, writing the result to `output`.
///
/// Returns the dimensions of the written image.
pub fn enhance_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &EnhanceConfig,
) -> Result<Dimensions> {
    let original = get_dimensions(backend, source)?;
    let params = plan_enhance(source, output, original, config);
    backend.enhance(&params)?;
    Ok(Dimensions {
        width: params.width,
        height: params.height,
    })
}

/// Composite an encoded overlay onto `target` in place.
pub fn apply_overlay(
    backend: &impl ImageBackend,
    target: &Path,
    overlay: Vec<u8>,
    quality: Quality,
) -> Result<CompositeOutcome> {
    backend.composite(&CompositeParams {
        target: target.to_path_buf(),
        overlay,
        quality,
    })
}
