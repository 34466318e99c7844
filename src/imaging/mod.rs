//! Image processing: pure Rust, `image` crate only.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Filter** | extension allow-list: png, jpg, jpeg, tiff, bmp |
//! | **Decode** | `image::ImageReader` (first frame, format sniffed) |
//! | **Stretch** | `imageops::resize` Lanczos3 to the exact target size |
//! | **Encode** | `PngEncoder`, RGBA8 straight alpha |
//!
//! The module is split into:
//! - **Parameters**: [`TargetSize`] and the stretch parameter struct
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`resize_image`] / [`try_resize_image`] over any backend

pub mod backend;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use operations::{resize_image, try_resize_image};
pub use params::{StretchParams, TargetSize};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
