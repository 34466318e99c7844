//! Directory walk and success/failure tally.
//!
//! Takes a [`JobRequest`], lists the direct children of the input directory,
//! and stretches every supported image into the output directory.
//!
//! ## Rules
//!
//! - **Non-recursive**: subdirectories are ignored, even ones named `x.png`.
//! - **Allow-list**: `png`, `jpg`, `jpeg`, `tiff`, `bmp`, case-insensitive.
//!   Everything else is neither counted nor written.
//! - **Same name out**: `photo.JPG` becomes `<output>/photo.JPG` holding PNG
//!   data. Existing files are overwritten.
//! - **Per-file failures are counted, not fatal**: decode, allocation, and
//!   write errors bump the failure counter and the run moves on. No retries.
//! - **Listing failures are fatal**: if the input directory can't be
//!   enumerated the run stops before touching any file and reports no counts.
//!
//! ## Output Structure
//!
//! ```text
//! input/                 output/
//! ├── a.png      →       ├── a.png    (300x150 PNG)
//! ├── b.jpg      →       └── b.jpg    (300x150 PNG)
//! ├── notes.txt          (skipped)
//! └── nested/            (skipped)
//! ```

use crate::imaging::{ImageBackend, RustBackend, TargetSize, is_supported_image, try_resize_image};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot list input directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot start batch worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Batch worker panicked")]
    WorkerPanicked,
}

/// Everything one run needs. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub size: TargetSize,
}

/// A file that failed to resize, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file_name: String,
    pub reason: String,
}

/// Tally for one batch run.
///
/// `succeeded + failed` always equals the number of candidates processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FileFailure>,
}

impl RunResult {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    fn record_success(&mut self) {
        self.succeeded += 1;
    }

    fn record_failure(&mut self, file_name: String, reason: String) {
        self.failed += 1;
        self.failures.push(FileFailure { file_name, reason });
    }
}

/// List the supported image files directly inside `input_dir`, sorted by name.
pub fn list_candidates(input_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let list_err = |source| BatchError::ListDir {
        path: input_dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(input_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();
        // Follows symlinks: a link to a regular image file counts.
        if !path.is_file() || !is_supported_image(&path) {
            debug!(path = %path.display(), "skipping");
            continue;
        }
        candidates.push(path);
    }
    candidates.sort();
    Ok(candidates)
}

/// Output path for `source`: the output directory joined with its base name.
///
/// The extension is kept even though the content will be PNG.
pub fn destination_for(output_dir: &Path, source: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) => output_dir.join(name),
        None => output_dir.to_path_buf(),
    }
}

/// Run a batch with the production backend.
pub fn run(request: &JobRequest) -> Result<RunResult, BatchError> {
    run_with_backend(&RustBackend::new(), request)
}

/// Run a batch with a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    request: &JobRequest,
) -> Result<RunResult, BatchError> {
    let span = info_span!(
        "batch",
        input = %request.input_dir.display(),
        output = %request.output_dir.display(),
    );
    let _guard = span.enter();

    let candidates = list_candidates(&request.input_dir).inspect_err(|e| error!("{e}"))?;
    info!(count = candidates.len(), size = %request.size, "found images");

    // Not fatal: if this fails every write below fails and is counted.
    if let Err(e) = std::fs::create_dir_all(&request.output_dir) {
        warn!(error = %e, "cannot create output directory");
    }

    let mut result = RunResult::default();
    for source in &candidates {
        let destination = destination_for(&request.output_dir, source);
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match try_resize_image(backend, source, &destination, request.size) {
            Ok(()) => {
                debug!(file = %file_name, "resized");
                result.record_success();
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "resize failed");
                result.record_failure(file_name, e.to_string());
            }
        }
    }

    info!(
        succeeded = result.succeeded,
        failed = result.failed,
        "batch complete"
    );
    Ok(result)
}
