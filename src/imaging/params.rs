//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the [`operations`](super::operations) module and the
//! [`backend`](super::backend), so the batch runner can be tested against a
//! mock backend without touching pixels.
//!
//! ## Types
//!
//! - [`TargetSize`]: Output width × height, both non-zero. Checked on construction.
//! - [`StretchParams`]: Source, destination, and target size for one resize.

use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Exact output resolution for a stretch resize.
///
/// Both edges are non-zero; there is no way to build one that isn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    width: NonZeroU32,
    height: NonZeroU32,
}

impl TargetSize {
    /// Returns `None` when either edge is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }

    pub fn width(self) -> u32 {
        self.width.get()
    }

    pub fn height(self) -> u32 {
        self.height.get()
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parameters for a single stretch-and-export operation.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub size: TargetSize,
}
