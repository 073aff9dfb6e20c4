//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image` crate (pure Rust decoders) |
//! | Upscale | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Sharpening | `DynamicImage::unsharpen` |
//! | Brightness / saturation | per-pixel multiply around Rec. 709 luma |
//! | Overlay composite | `image::imageops::overlay` (source-over alpha blend) |
//! | Encode | format chosen from the output extension |

use super::backend::{BackendError, CompositeOutcome, Dimensions, ImageBackend};
use super::calculations::centered_offset;
use super::params::{CompositeParams, EnhanceParams, Modulation};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Extensions whose decoders and encoders are compiled in.
const SUPPORTED: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
];

/// Returns the set of image file extensions this backend reads and writes.
pub fn supported_extensions() -> Vec<&'static str> {
    SUPPORTED
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| BackendError::Decode(format!("Failed to decode {}: {}", path.display(), e)))
}

/// Pick the output encoding from the file extension.
fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    SUPPORTED
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Unsupported output format: {}", ext))
        })
}

/// Encode an image into memory in the given format.
///
/// JPEG has no alpha channel and WebP only takes 8-bit RGB(A), so those two
/// are converted first.
fn encode_image(
    img: &DynamicImage,
    format: ImageFormat,
    quality: u32,
) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality as u8);
            img.to_rgb8().write_with_encoder(encoder)
        }
        ImageFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buffer, format),
        _ => img.write_to(&mut buffer, format),
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("Encode failed: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Multiply brightness and push channels away from (or toward) luma.
fn modulate(img: DynamicImage, modulation: &Modulation) -> DynamicImage {
    if modulation.is_identity() {
        return img;
    }
    let brightness = modulation.brightness.unwrap_or(1.0);
    let saturation = modulation.saturation.unwrap_or(1.0);

    let mut rgba = img.into_rgba8();
    for pixel in rgba.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let (r, g, b) = (
            r as f32 * brightness,
            g as f32 * brightness,
            b as f32 * brightness,
        );
        let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let adjust = |c: f32| (luma + (c - luma) * saturation).round().clamp(0.0, 255.0) as u8;
        pixel.0 = [adjust(r), adjust(g), adjust(b), a];
    }
    DynamicImage::ImageRgba8(rgba)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {}", e)))?;
        Ok(Dimensions { width, height })
    }

    fn enhance(&self, params: &EnhanceParams) -> Result<(), BackendError> {
        let format = output_format(&params.output)?;
        let img = load_image(&params.source)?;

        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        let sharpened = match params.sharpening {
            Some(sharpening) => resized.unsharpen(sharpening.sigma, sharpening.threshold),
            None => resized,
        };
        let final_img = modulate(sharpened, &params.modulation);

        let bytes = encode_image(&final_img, format, params.quality.value())?;
        std::fs::write(&params.output, bytes).map_err(BackendError::Io)
    }

    fn composite(&self, params: &CompositeParams) -> Result<CompositeOutcome, BackendError> {
        let layer = image::load_from_memory(&params.overlay)
            .map_err(|e| BackendError::Decode(format!("Failed to decode overlay: {}", e)))?
            .into_rgba8();

        if layer.pixels().all(|p| p.0[3] == 0) {
            return Ok(CompositeOutcome::Unchanged);
        }

        let format = output_format(&params.target)?;
        let base = load_image(&params.target)?;
        let (x, y) = centered_offset(
            (base.width(), base.height()),
            (layer.width(), layer.height()),
        )
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "Overlay {}x{} does not fit target {}x{}",
                layer.width(),
                layer.height(),
                base.width(),
                base.height()
            ))
        })?;

        let has_alpha = base.color().has_alpha();
        let mut canvas = base.into_rgba8();
        image::imageops::overlay(&mut canvas, &layer, x, y);

        let blended = if has_alpha {
            DynamicImage::ImageRgba8(canvas)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).into_rgb8())
        };

        // Encode fully before touching the file so a failure leaves it intact.
        let bytes = encode_image(&blended, format, params.quality.value())?;
        std::fs::write(&params.target, bytes).map_err(BackendError::Io)?;
        Ok(CompositeOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Quality, Sharpening};
    use crate::test_helpers::{create_test_jpeg, create_test_png, encode_png};
    use image::{GenericImageView, Rgba, RgbaImage};

    fn enhance_params(source: &Path, output: &Path, width: u32, height: u32) -> EnhanceParams {
        EnhanceParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            width,
            height,
            quality: Quality::new(85),
            sharpening: Some(Sharpening::enhance_default()),
            modulation: Modulation::default(),
        }
    }

    #[test]
    fn supported_extensions_cover_upload_types() {
        let exts = supported_extensions();
        for expected in &["jpg", "jpeg", "png", "webp", "tiff", "bmp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_sniffs_content_not_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        std::fs::write(&path, encode_png(&RgbaImage::new(40, 30))).unwrap();

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (40, 30));
    }

    #[test]
    fn enhance_png_content_with_jpg_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("photo.jpg");
        std::fs::write(
            &source,
            encode_png(&RgbaImage::from_pixel(40, 30, Rgba([200, 10, 10, 255]))),
        )
        .unwrap();

        let output = tmp.path().join("enhanced_photo.jpg");
        let dims = crate::imaging::enhance_image(
            &RustBackend::new(),
            &source,
            &output,
            &crate::imaging::EnhanceConfig::default(),
        )
        .unwrap();

        assert_eq!((dims.width, dims.height), (80, 60));
        assert_eq!(image::open(&output).unwrap().dimensions(), (80, 60));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn enhance_jpeg_writes_requested_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 80);

        let output = tmp.path().join("enhanced.jpg");
        RustBackend::new()
            .enhance(&enhance_params(&source, &output, 200, 160))
            .unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!(written.dimensions(), (200, 160));
    }

    #[test]
    fn enhance_png_keeps_png_encoding() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 40, 30, Rgba([10, 200, 30, 255]));

        let output = tmp.path().join("enhanced.png");
        RustBackend::new()
            .enhance(&enhance_params(&source, &output, 80, 60))
            .unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn enhance_with_modulation_brightens() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("grey.png");
        create_test_png(&source, 8, 8, Rgba([100, 100, 100, 255]));

        let output = tmp.path().join("bright.png");
        let mut params = enhance_params(&source, &output, 8, 8);
        params.sharpening = None;
        params.modulation = Modulation {
            brightness: Some(1.5),
            saturation: None,
        };
        RustBackend::new().enhance(&params).unwrap();

        let px = image::open(&output).unwrap().to_rgba8().get_pixel(4, 4).0;
        assert_eq!(px, [150, 150, 150, 255]);
    }

    #[test]
    fn enhance_undecodable_source_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("fake.jpg");
        std::fs::write(&source, b"definitely not a jpeg").unwrap();

        let output = tmp.path().join("out.jpg");
        let result = RustBackend::new().enhance(&enhance_params(&source, &output, 10, 10));
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert!(!output.exists());
    }

    #[test]
    fn enhance_unsupported_output_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 20, 20);

        let output = tmp.path().join("out.gif");
        let result = RustBackend::new().enhance(&enhance_params(&source, &output, 40, 40));
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn composite_paints_visible_pixels() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("target.png");
        create_test_png(&target, 10, 10, Rgba([255, 255, 255, 255]));

        let mut layer = RgbaImage::new(10, 10);
        layer.put_pixel(3, 4, Rgba([255, 0, 0, 255]));

        let outcome = RustBackend::new()
            .composite(&CompositeParams {
                target: target.clone(),
                overlay: encode_png(&layer),
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(outcome, CompositeOutcome::Applied);
        let result = image::open(&target).unwrap().to_rgba8();
        assert_eq!(result.get_pixel(3, 4).0, [255, 0, 0, 255]);
        assert_eq!(result.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn composite_transparent_layer_leaves_file_untouched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("target.jpg");
        create_test_jpeg(&target, 32, 32);
        let before = std::fs::read(&target).unwrap();

        let layer = RgbaImage::new(32, 32);
        for _ in 0..3 {
            let outcome = RustBackend::new()
                .composite(&CompositeParams {
                    target: target.clone(),
                    overlay: encode_png(&layer),
                    quality: Quality::default(),
                })
                .unwrap();
            assert_eq!(outcome, CompositeOutcome::Unchanged);
        }

        assert_eq!(std::fs::read(&target).unwrap(), before);
    }

    #[test]
    fn composite_oversized_layer_errors_without_writing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("target.png");
        create_test_png(&target, 10, 10, Rgba([0, 0, 0, 255]));
        let before = std::fs::read(&target).unwrap();

        let mut layer = RgbaImage::new(20, 20);
        layer.put_pixel(0, 0, Rgba([255, 0, 0, 255]));

        let result = RustBackend::new().composite(&CompositeParams {
            target: target.clone(),
            overlay: encode_png(&layer),
            quality: Quality::default(),
        });

        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
        assert_eq!(std::fs::read(&target).unwrap(), before);
    }

    #[test]
    fn composite_garbage_overlay_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("target.png");
        create_test_png(&target, 4, 4, Rgba([0, 0, 0, 255]));

        let result = RustBackend::new().composite(&CompositeParams {
            target,
            overlay: b"nope".to_vec(),
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}
