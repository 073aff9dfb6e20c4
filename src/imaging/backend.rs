//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, enhance, and composite.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Everything is statically linked into the binary.

use super::params::{CompositeParams, EnhanceParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// What a composite did to the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOutcome {
    /// The layer had visible pixels; the target was blended and rewritten.
    Applied,
    /// The layer was fully transparent; the target was not touched.
    Unchanged,
}

/// Trait for image processing backends.
///
/// The rest of the codebase only talks to this trait, so handlers and the
/// processing service can be exercised against a recording mock.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize, sharpen and modulate `params.source` into `params.output`.
    fn enhance(&self, params: &EnhanceParams) -> Result<(), BackendError>;

    /// Blend an encoded layer onto an existing file and write it back in place.
    fn composite(&self, params: &CompositeParams) -> Result<CompositeOutcome, BackendError>;
}
