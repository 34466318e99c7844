//! # batch-resize
//!
//! Stretch every image in a folder to one resolution and write PNG copies to
//! another folder.
//!
//! # Pipeline
//!
//! ```text
//! CLI flags + config  →  JobRequest  →  worker thread  →  RunResult  →  status + exit code
//!                                         │
//!                                         └─ for each input/*.{png,jpg,jpeg,tiff,bmp}:
//!                                              decode → stretch → PNG → output/<same name>
//! ```
//!
//! A run is a pure function of its [`JobRequest`](batch::JobRequest): no
//! global state, nothing persisted between runs. The result comes back once,
//! after the last file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Lists candidates, resizes each one, tallies successes and failures |
//! | [`imaging`] | Decode, stretch resample, PNG encode behind the `ImageBackend` trait |
//! | [`worker`] | Runs one batch on a background thread, hands back the result |
//! | [`status`] | `Ready` / `Working...` / `Success (N)` / `Done with errors` / `Error`, and exit codes |
//! | [`config`] | `batch-resize.toml` loading, presets, target-size resolution |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stretch, Don't Fit
//!
//! Output is always exactly the requested width × height. Source aspect ratio
//! is discarded; there is no letterboxing and no cropping. The common use is
//! producing store screenshots at a fixed size, where the size is the contract.
//!
//! ## Failures Are Counted, Not Fatal
//!
//! One unreadable file should not cost the other hundred. Decode and write
//! errors are recorded per file and the run continues. Only a directory that
//! can't be listed at all stops a run.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and PNG encoding all come from the `image`
//! crate. No system libraries to install.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod status;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
