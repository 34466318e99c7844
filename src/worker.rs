//! Background execution of one batch.
//!
//! A run goes to a dedicated thread so the caller stays free; files are still
//! processed one at a time on that thread. The caller gets a [`JobHandle`]
//! and receives the [`RunResult`] exactly once, after the whole batch is done.
//! There is no progress stream and no cancellation.

use crate::batch::{self, BatchError, JobRequest, RunResult};
use crate::imaging::{ImageBackend, RustBackend};
use std::thread::JoinHandle;
use tracing::error;

const WORKER_NAME: &str = "batch-worker";

/// Handle to a batch running on the worker thread.
pub struct JobHandle {
    handle: JoinHandle<Result<RunResult, BatchError>>,
}

impl JobHandle {
    /// Block until the batch completes.
    ///
    /// A panic on the worker is reported as [`BatchError::WorkerPanicked`].
    pub fn wait(self) -> Result<RunResult, BatchError> {
        self.handle.join().unwrap_or_else(|_| {
            error!("{WORKER_NAME} panicked");
            Err(BatchError::WorkerPanicked)
        })
    }
}

/// Start `request` on a new worker thread with the production backend.
pub fn spawn(request: JobRequest) -> Result<JobHandle, BatchError> {
    spawn_with_backend(RustBackend::new(), request)
}

/// Start `request` on a new worker thread with a specific backend.
pub fn spawn_with_backend<B>(backend: B, request: JobRequest) -> Result<JobHandle, BatchError>
where
    B: ImageBackend + Send + 'static,
{
    let handle = std::thread::Builder::new()
        .name(WORKER_NAME.to_string())
        .spawn(move || batch::run_with_backend(&backend, &request))
        .map_err(BatchError::Spawn)
        .inspect_err(|e| error!("{e}"))?;
    Ok(JobHandle { handle })
}
