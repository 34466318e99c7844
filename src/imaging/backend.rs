//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait has one operation: stretch a source image to an
//! exact size and write it out as PNG.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in a recording mock.

use super::params::StretchParams;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Cannot allocate a {width}x{height} pixel buffer")]
    Allocation { width: u32, height: u32 },
    #[error("PNG encode failed for {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// Trait for image processing backends.
///
/// `Sync` so a backend reference can be shared with the worker thread.
pub trait ImageBackend: Sync {
    /// Decode `params.source`, stretch it to `params.size`, and write a PNG
    /// to `params.output`, replacing any existing file.
    fn stretch(&self, params: &StretchParams) -> Result<(), BackendError>;
}
