//! Image processing: pure Rust on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Enhance** | Lanczos3 upscale + `unsharpen` (+ optional modulation) |
//! | **Composite** | `imageops::overlay`, rewrite in the target's own format |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, CompositeOutcome, Dimensions, ImageBackend};
pub use calculations::{calculate_enhanced_dimensions, centered_offset};
pub use operations::{EnhanceConfig, apply_overlay, enhance_image, get_dimensions, plan_enhance};
pub use params::{CompositeParams, EnhanceParams, Modulation, Quality, Sharpening};
pub use rust_backend::{RustBackend, supported_extensions};
