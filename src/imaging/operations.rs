//! High-level image operations.
//!
//! These functions build [`StretchParams`] and hand them to a backend. The
//! batch runner calls [`try_resize_image`] so it can record why a file
//! failed; [`resize_image`] is the plain success/failure form.

use super::backend::{BackendError, ImageBackend};
use super::params::{StretchParams, TargetSize};
use std::path::Path;
use tracing::warn;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan a stretch operation without executing it.
pub fn plan_stretch(source: &Path, destination: &Path, size: TargetSize) -> StretchParams {
    StretchParams {
        source: source.to_path_buf(),
        output: destination.to_path_buf(),
        size,
    }
}

/// Stretch `source` to `size` and write it as PNG to `destination`.
pub fn try_resize_image(
    backend: &impl ImageBackend,
    source: &Path,
    destination: &Path,
    size: TargetSize,
) -> Result<()> {
    backend.stretch(&plan_stretch(source, destination, size))
}

/// Like [`try_resize_image`], but every failure collapses to `false`.
///
/// The error is logged here because it is not returned. The batch runner
/// calls [`try_resize_image`] instead, keeps the error as the file's failure
/// reason and logs it itself, so a batch run logs each failure once.
pub fn resize_image(
    backend: &impl ImageBackend,
    source: &Path,
    destination: &Path,
    size: TargetSize,
) -> bool {
    match try_resize_image(backend, source, destination, size) {
        Ok(()) => true,
        Err(e) => {
            warn!(source = %source.display(), error = %e, "resize failed");
            false
        }
    }
}
