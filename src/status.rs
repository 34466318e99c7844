//! Run status as shown to the user, and its exit code.
//!
//! ```text
//! Ready ──► Working... ──► Success (N)        exit 0
//!                     ├──► Done with errors   exit 1
//!                     └──► Error              exit 2
//! ```

use crate::batch::{BatchError, RunResult};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ready,
    Working,
    /// Every candidate succeeded. Carries the success count.
    Success(usize),
    DoneWithErrors,
    /// The input directory could not be listed, or the worker died.
    Error,
}

impl Status {
    /// Terminal status for a finished run.
    pub fn from_outcome(outcome: &Result<RunResult, BatchError>) -> Self {
        match outcome {
            Ok(result) if result.has_failures() => Status::DoneWithErrors,
            Ok(result) => Status::Success(result.succeeded),
            Err(_) => Status::Error,
        }
    }

    /// Process exit code, or `None` while the run hasn't finished.
    pub fn exit_code(self) -> Option<u8> {
        match self {
            Status::Ready | Status::Working => None,
            Status::Success(_) => Some(0),
            Status::DoneWithErrors => Some(1),
            Status::Error => Some(2),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => f.write_str("Ready"),
            Status::Working => f.write_str("Working..."),
            Status::Success(n) => write!(f, "Success ({n})"),
            Status::DoneWithErrors => f.write_str("Done with errors"),
            Status::Error => f.write_str("Error"),
        }
    }
}
