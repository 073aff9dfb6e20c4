//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output size of the upscale step.
///
/// The width grows by `scale_factor` but never beyond `max_width`; the height
/// follows the source aspect ratio. Neither edge drops below one pixel.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculate_enhanced_dimensions;
/// // 1000x800 doubled → 2000x1600
/// assert_eq!(calculate_enhanced_dimensions((1000, 800), 2, 4000), (2000, 1600));
///
/// // 3000x2000 doubled would be 6000 wide → capped at 4000x2667
/// assert_eq!(calculate_enhanced_dimensions((3000, 2000), 2, 4000), (4000, 2667));
/// ```
pub fn calculate_enhanced_dimensions(
    original: (u32, u32),
    scale_factor: u32,
    max_width: u32,
) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 {
        return (orig_w.max(1), orig_h.max(1));
    }

    let width = orig_w.saturating_mul(scale_factor).min(max_width).max(1);
    let height = (orig_h as f64 * width as f64 / orig_w as f64).round() as u32;
    (width, height.max(1))
}

/// Offset that centres `layer` on `base`, or `None` when the layer does not fit.
///
/// Layers drawn by the editor have the base's exact size, which yields `(0, 0)`.
pub fn centered_offset(base: (u32, u32), layer: (u32, u32)) -> Option<(i64, i64)> {
    let (base_w, base_h) = base;
    let (layer_w, layer_h) = layer;
    if layer_w > base_w || layer_h > base_h {
        return None;
    }
    Some((
        ((base_w - layer_w) / 2) as i64,
        ((base_h - layer_h) / 2) as i64,
    ))
}
