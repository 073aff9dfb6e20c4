//! Shared test utilities for the retouch test suite.
//!
//! Synthetic images are generated on the fly so no binary fixtures are
//! checked in, and [`service_config`] points both stores into a temp dir.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let config = service_config(tmp.path());
//! create_test_jpeg(&config.storage.uploads_dir.join("cat.jpg"), 100, 80);
//! ```

use crate::config::ServerConfig;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Write a JPEG with a horizontal gradient (so it has some detail to sharpen).
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    });
    img.save_with_format(path, ImageFormat::Jpeg).unwrap();
}

/// Write a solid-colour PNG.
pub fn create_test_png(path: &Path, width: u32, height: u32, color: Rgba<u8>) {
    RgbaImage::from_pixel(width, height, color)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Encode an RGBA buffer as PNG bytes, the way the editor ships overlays.
pub fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Default config with both stores rooted under `root`.
pub fn service_config(root: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.storage.uploads_dir = root.join("uploads");
    config.storage.results_dir = root.join("results");
    config.server.public_dir = root.join("public");
    config
}
