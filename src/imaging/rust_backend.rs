//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, TIFF, BMP) | `image::ImageReader`, format sniffed from content |
//! | Resize | `imageops::resize` with `Lanczos3`, exact target size |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, RGBA8 |
//!
//! Every image is resampled premultiplied in `f32` and un-premultiplied
//! before encoding, so fully transparent pixels never leak their color into
//! visible neighbours. All buffers a stretch needs are reserved up front; a
//! target too large for memory is [`BackendError::Allocation`], never an
//! abort.
//!
//! The PNG is written to `<name>.partial` beside the destination and renamed
//! over it when complete.

use super::backend::{BackendError, ImageBackend};
use super::params::{StretchParams, TargetSize};
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, Rgba32FImage,
    RgbaImage,
};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Extensions accepted as batch input, paired with the decoder they need.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the lowercase extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True when the path's extension is on the allow-list, ignoring case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    /// Ceiling on the bytes one stretch may hold at its peak. `None` leaves
    /// the decision to the allocator.
    memory_limit: Option<usize>,
}

impl RustBackend {
    pub fn new() -> Self {
        Self { memory_limit: None }
    }

    /// Reserve the RGBA8 output buffer, then confirm the `f32` resampling
    /// buffers fit beside it.
    ///
    /// Everything after this point either writes into the returned buffer
    /// or allocates no more than was just proven available.
    fn reserve_buffers(
        &self,
        source: (u32, u32),
        size: TargetSize,
    ) -> Result<Vec<u8>, BackendError> {
        let err = || BackendError::Allocation {
            width: size.width(),
            height: size.height(),
        };
        let (working, output) = stretch_footprint(source, size).ok_or_else(err)?;
        if self
            .memory_limit
            .is_some_and(|limit| working.saturating_add(output) > limit)
        {
            return Err(err());
        }

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(output).map_err(|_| err())?;
        let mut scratch: Vec<u8> = Vec::new();
        scratch.try_reserve_exact(working).map_err(|_| err())?;
        Ok(pixels)
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes per pixel of the `f32` RGBA resampling buffers.
const WORKING_BYTES_PER_PIXEL: usize = 16;
/// Bytes per pixel of the RGBA8 output.
const OUTPUT_BYTES_PER_PIXEL: usize = 4;

fn pixel_count(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

/// Peak bytes of a stretch from `source` dimensions to `size`, as
/// `(working, output)`.
///
/// `working` covers the `f32` copy of the source, the single-axis
/// intermediate Lanczos pass and the `f32` result, all alive together.
/// `output` is the RGBA8 buffer the result is quantized into. `None` when
/// the count overflows `usize`.
fn stretch_footprint(source: (u32, u32), size: TargetSize) -> Option<(usize, usize)> {
    let (src_w, src_h) = source;
    let (dst_w, dst_h) = (size.width(), size.height());
    let target = pixel_count(dst_w, dst_h)?;
    let intermediate = pixel_count(dst_w, src_h)?.max(pixel_count(src_w, dst_h)?);
    let working = pixel_count(src_w, src_h)?
        .checked_add(intermediate)?
        .checked_add(target)?
        .checked_mul(WORKING_BYTES_PER_PIXEL)?;
    let output = target.checked_mul(OUTPUT_BYTES_PER_PIXEL)?;
    Some((working, output))
}

/// Load and decode the first frame of an image.
///
/// The container is sniffed from the file's magic bytes, falling back to the
/// extension, so a PNG saved as `.jpg` still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn premultiply(img: &mut Rgba32FImage) {
    for px in img.pixels_mut() {
        let a = px[3];
        px[0] *= a;
        px[1] *= a;
        px[2] *= a;
    }
}

fn unpremultiply(img: &mut Rgba32FImage) {
    for px in img.pixels_mut() {
        let a = px[3].clamp(0.0, 1.0);
        px[3] = a;
        if a <= f32::EPSILON {
            px[0] = 0.0;
            px[1] = 0.0;
            px[2] = 0.0;
        } else {
            for c in px.0.iter_mut().take(3) {
                *c = (*c / a).clamp(0.0, 1.0);
            }
        }
    }
}

/// Resample to exactly `size`, discarding the source aspect ratio, and
/// quantize into `pixels`.
///
/// `pixels` must already hold capacity for the whole RGBA8 result. Opaque
/// sources go through the same premultiplied path, where alpha 1.0 leaves
/// color untouched.
fn stretch_image(img: DynamicImage, size: TargetSize, mut pixels: Vec<u8>) -> Option<RgbaImage> {
    let (width, height) = (size.width(), size.height());
    let mut premul = img.into_rgba32f();
    premultiply(&mut premul);
    let mut resized = imageops::resize(&premul, width, height, FilterType::Lanczos3);
    drop(premul);
    unpremultiply(&mut resized);

    pixels.clear();
    pixels.extend(
        resized
            .as_raw()
            .iter()
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8),
    );
    RgbaImage::from_raw(width, height, pixels)
}

/// Sibling path the PNG is written to before it replaces `path`.
///
/// Keeps the full file name so `a.png` and `a.jpg` never share one. The
/// `.partial` extension is not on the input allow-list.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_png(img: &RgbaImage, path: &Path) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    writer.flush()?;
    Ok(())
}

/// Encode as PNG and move it over `path` once complete.
///
/// An existing file at `path` is replaced only by a fully written PNG. On
/// failure the partial file is removed and `path` is left as it was.
fn save_png(img: &RgbaImage, path: &Path) -> Result<(), BackendError> {
    let partial = partial_path(path);
    let written = write_png(img, &partial)
        .and_then(|()| std::fs::rename(&partial, path).map_err(BackendError::from));
    if written.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    written
}

impl ImageBackend for RustBackend {
    fn stretch(&self, params: &StretchParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        debug!(
            source = %params.source.display(),
            from = %format!("{}x{}", img.width(), img.height()),
            to = %params.size,
            "decoded"
        );
        let pixels = self.reserve_buffers((img.width(), img.height()), params.size)?;
        let resized =
            stretch_image(img, params.size, pixels).ok_or(BackendError::Allocation {
                width: params.size.width(),
                height: params.size.height(),
            })?;
        save_png(&resized, &params.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{dir_names, png_dimensions, write_jpeg, write_png};
    use image::{ColorType, Rgba};
    use tempfile::TempDir;

    fn params(source: &Path, output: &Path, w: u32, h: u32) -> StretchParams {
        StretchParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            size: TargetSize::new(w, h).unwrap(),
        }
    }

    #[test]
    fn supported_extensions_match_allow_list() {
        let exts = supported_input_extensions();
        assert_eq!(exts, &["png", "jpg", "jpeg", "tiff", "bmp"]);
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_supported_image(Path::new("/in/a.PNG")));
        assert!(is_supported_image(Path::new("/in/b.JpEg")));
        assert!(is_supported_image(Path::new("scan.tiff")));
        assert!(!is_supported_image(Path::new("scan.tif")));
        assert!(!is_supported_image(Path::new("anim.gif")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("png")));
    }

    #[test]
    fn stretch_png_to_exact_size() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        let output = tmp.path().join("out.png");
        write_png(&source, 100, 100);

        RustBackend::new()
            .stretch(&params(&source, &output, 300, 150))
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (300, 150));
    }

    #[test]
    fn stretch_portrait_jpeg_to_landscape_png() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("b.jpg");
        let output = tmp.path().join("b-out.jpg");
        write_jpeg(&source, 50, 200);

        RustBackend::new()
            .stretch(&params(&source, &output, 300, 150))
            .unwrap();

        // Name keeps the .jpg extension, content is PNG
        let reader = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Png));
        let img = reader.decode().unwrap();
        assert_eq!((img.width(), img.height()), (300, 150));
        assert_eq!(img.color(), ColorType::Rgba8);
    }

    #[test]
    fn stretch_decodes_mislabelled_file() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("really-a-png.jpg");
        let output = tmp.path().join("out.png");
        write_png(&source, 20, 10);

        RustBackend::new()
            .stretch(&params(&source, &output, 7, 9))
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (7, 9));
    }

    #[test]
    fn stretch_sixteen_bit_source_writes_rgba8() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("deep.png");
        let output = tmp.path().join("out.png");
        let img = image::ImageBuffer::<image::Rgb<u16>, _>::from_fn(16, 16, |x, y| {
            image::Rgb([(x * 4000) as u16, (y * 4000) as u16, 30000])
        });
        img.save(&source).unwrap();

        RustBackend::new()
            .stretch(&params(&source, &output, 32, 8))
            .unwrap();

        let out = image::open(&output).unwrap();
        assert_eq!(out.color(), ColorType::Rgba8);
        assert_eq!((out.width(), out.height()), (32, 8));
    }

    #[test]
    fn transparent_pixels_do_not_bleed_color() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        let output = tmp.path().join("out.png");
        // First quarter: fully transparent red. The rest: opaque blue.
        let img = RgbaImage::from_fn(16, 1, |x, _| {
            if x < 4 {
                Rgba([255, 0, 0, 0])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        img.save(&source).unwrap();

        RustBackend::new()
            .stretch(&params(&source, &output, 32, 1))
            .unwrap();

        let out = image::open(&output).unwrap().into_rgba8();
        for px in out.pixels() {
            if px[3] > 0 {
                assert_eq!(px[0], 0, "red leaked into visible pixel {px:?}");
            }
        }
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(31, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn stretch_overwrites_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.bmp");
        let output = tmp.path().join("a-out.bmp");
        image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]))
            .save_with_format(&source, ImageFormat::Bmp)
            .unwrap();
        std::fs::write(&output, b"stale contents").unwrap();

        RustBackend::new()
            .stretch(&params(&source, &output, 4, 4))
            .unwrap();

        assert_eq!(png_dimensions(&output), (4, 4));
    }

    #[test]
    fn corrupt_source_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("broken.png");
        std::fs::write(&source, b"definitely not a png").unwrap();

        let result =
            RustBackend::new().stretch(&params(&source, &tmp.path().join("o.png"), 10, 10));

        assert!(matches!(result, Err(BackendError::Decode { .. })));
    }

    #[test]
    fn missing_source_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = RustBackend::new().stretch(&params(
            &tmp.path().join("nope.png"),
            &tmp.path().join("o.png"),
            10,
            10,
        ));

        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        write_png(&source, 10, 10);

        let output = tmp.path().join("missing-dir").join("a.png");
        let result = RustBackend::new().stretch(&params(&source, &output, 5, 5));

        assert!(matches!(result, Err(BackendError::Io(_))));
        assert!(!output.exists());
    }

    // =========================================================================
    // TIFF input
    // =========================================================================

    #[test]
    fn stretch_tiff_to_exact_size() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("scan.tiff");
        let output = tmp.path().join("scan-out.tiff");
        image::RgbImage::from_fn(30, 60, |x, y| image::Rgb([x as u8 * 8, y as u8 * 4, 90]))
            .save_with_format(&source, ImageFormat::Tiff)
            .unwrap();

        RustBackend::new()
            .stretch(&params(&source, &output, 45, 15))
            .unwrap();

        assert_eq!(png_dimensions(&output), (45, 15));
    }

    // =========================================================================
    // Memory footprint
    // =========================================================================

    fn limited(bytes: usize) -> RustBackend {
        RustBackend {
            memory_limit: Some(bytes),
        }
    }

    fn write_rgba_pixel(path: &Path) {
        RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 128]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn footprint_counts_every_live_buffer() {
        // 1x1 -> 100x100: source 1 + intermediate 100 + target 10_000 at 16 B,
        // plus the 10_000 px RGBA8 output at 4 B.
        let size = TargetSize::new(100, 100).unwrap();
        assert_eq!(stretch_footprint((1, 1), size), Some((161_616, 40_000)));

        let size = TargetSize::new(14_000, 14_000).unwrap();
        let (working, output) = stretch_footprint((1, 1), size).unwrap();
        assert_eq!(output, 784_000_000);
        assert!(working + output > 3_900_000_000);
    }

    #[test]
    fn footprint_overflow_is_none() {
        let size = TargetSize::new(u32::MAX, u32::MAX).unwrap();
        assert_eq!(stretch_footprint((u32::MAX, u32::MAX), size), None);
    }

    #[test]
    fn stretch_within_memory_limit_succeeds() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("dot.png");
        let output = tmp.path().join("out.png");
        write_rgba_pixel(&source);

        limited(201_616)
            .stretch(&params(&source, &output, 100, 100))
            .unwrap();

        assert_eq!(png_dimensions(&output), (100, 100));
    }

    #[test]
    fn stretch_one_byte_over_memory_limit_is_allocation_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("dot.png");
        let output = tmp.path().join("out.png");
        write_rgba_pixel(&source);

        let result = limited(201_615).stretch(&params(&source, &output, 100, 100));

        assert!(matches!(
            result,
            Err(BackendError::Allocation {
                width: 100,
                height: 100
            })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn huge_alpha_target_is_allocation_error_not_panic() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("dot.png");
        let output = tmp.path().join("out.png");
        write_rgba_pixel(&source);

        // Room for the f32 buffers but not for the RGBA8 output beside them.
        let result = limited(3_700_000_000).stretch(&params(&source, &output, 14_000, 14_000));

        assert!(matches!(result, Err(BackendError::Allocation { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn unaddressable_target_is_allocation_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("dot.png");
        write_rgba_pixel(&source);

        let result = RustBackend::new().stretch(&params(
            &source,
            &tmp.path().join("out.png"),
            u32::MAX,
            u32::MAX,
        ));

        assert!(matches!(result, Err(BackendError::Allocation { .. })));
    }

    // =========================================================================
    // Replacing the destination
    // =========================================================================

    #[test]
    fn partial_path_keeps_full_file_name() {
        assert_eq!(
            partial_path(Path::new("/out/a.png")),
            Path::new("/out/a.png.partial")
        );
        assert_eq!(
            partial_path(Path::new("/out/a.jpg")),
            Path::new("/out/a.jpg.partial")
        );
        assert!(!is_supported_image(&partial_path(Path::new("a.png"))));
    }

    #[test]
    fn successful_stretch_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        write_png(&source, 10, 10);

        RustBackend::new()
            .stretch(&params(&source, &tmp.path().join("b.png"), 5, 5))
            .unwrap();

        assert_eq!(dir_names(tmp.path()), vec!["a.png", "b.png"]);
    }

    #[test]
    fn failed_replace_keeps_destination_and_removes_partial() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        write_png(&source, 10, 10);
        // A non-empty directory cannot be replaced by a file.
        let output = tmp.path().join("taken.png");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(output.join("keep.txt"), "kept").unwrap();

        let result = RustBackend::new().stretch(&params(&source, &output, 5, 5));

        assert!(matches!(result, Err(BackendError::Io(_))));
        assert_eq!(dir_names(tmp.path()), vec!["a.png", "taken.png"]);
        assert_eq!(std::fs::read_to_string(output.join("keep.txt")).unwrap(), "kept");
    }
}
