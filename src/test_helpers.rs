//! Shared test utilities: synthetic fixture images and output inspection.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_png(&tmp.path().join("a.png"), 100, 100);
//! write_jpeg(&tmp.path().join("b.jpg"), 50, 200);
//! ```

use image::{ImageEncoder, ImageFormat, ImageReader, RgbImage};
use std::path::Path;

/// Gradient fill so resampling has something to chew on.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid PNG with the given dimensions.
pub fn write_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write a small valid JPEG with the given dimensions.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Dimensions of a file that must contain PNG data, whatever its extension.
pub fn png_dimensions(path: &Path) -> (u32, u32) {
    let reader = ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap();
    assert_eq!(
        reader.format(),
        Some(ImageFormat::Png),
        "{} is not PNG",
        path.display()
    );
    reader.into_dimensions().unwrap()
}

/// File names in a directory, sorted.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
