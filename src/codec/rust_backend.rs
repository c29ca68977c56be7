//! Production codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::load_from_memory_with_format` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (baseline) |
//! | Encode → progressive JPEG | `mozjpeg::Compress` (default `mozjpeg` feature) |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, adaptive filtering |
//!
//! Palette PNGs come out of the decoder already expanded to RGB(A).
//!
//! The JPEG decoder pads a cut-off scan with gray instead of failing, so a
//! JPEG payload must end in an EOI marker before it is handed over.

use super::Codec;
use super::backend::{BackendError, CodecBackend};
use super::params::{EncodeOptions, PngEffort};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage};

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// JPEG has no alpha and the encoder only takes 8-bit gray or RGB.
fn flatten_for_jpeg(pixels: &DynamicImage) -> DynamicImage {
    if pixels.color().has_color() {
        DynamicImage::ImageRgb8(pixels.to_rgb8())
    } else {
        DynamicImage::ImageLuma8(pixels.to_luma8())
    }
}

fn encode_jpeg(pixels: &DynamicImage, options: &EncodeOptions) -> Result<Vec<u8>, BackendError> {
    if options.progressive {
        return encode_progressive_jpeg(pixels, options);
    }
    encode_baseline_jpeg(pixels, options)
}

fn encode_baseline_jpeg(
    pixels: &DynamicImage,
    options: &EncodeOptions,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, options.quality.jpeg());
    flatten_for_jpeg(pixels).write_with_encoder(encoder)?;
    Ok(buf)
}

#[cfg(feature = "mozjpeg")]
fn encode_progressive_jpeg(
    pixels: &DynamicImage,
    options: &EncodeOptions,
) -> Result<Vec<u8>, BackendError> {
    let rgb = pixels.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(f32::from(options.quality.jpeg()));
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new())?;
    comp.write_scanlines(rgb.as_raw())?;
    Ok(comp.finish()?)
}

#[cfg(not(feature = "mozjpeg"))]
fn encode_progressive_jpeg(
    _pixels: &DynamicImage,
    _options: &EncodeOptions,
) -> Result<Vec<u8>, BackendError> {
    Err(BackendError::ProcessingFailed(
        "progressive JPEG requires the `mozjpeg` feature".into(),
    ))
}

/// Whether a JPEG payload ends in EOI (`FF D9`), ignoring trailing fill.
fn has_jpeg_eoi(bytes: &[u8]) -> bool {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0x00 && b != 0xFF)
        .map_or(0, |i| i + 1);
    bytes[..end].ends_with(&[0xFF, 0xD9])
}

fn encode_png(pixels: &DynamicImage, options: &EncodeOptions) -> Result<Vec<u8>, BackendError> {
    let compression = match options.quality.png_effort() {
        PngEffort::Fast => CompressionType::Fast,
        PngEffort::Default => CompressionType::Default,
        PngEffort::Best => CompressionType::Best,
    };
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, compression, FilterType::Adaptive);
    // PNG has no float samples
    if matches!(pixels.color(), ColorType::Rgb32F | ColorType::Rgba32F) {
        DynamicImage::ImageRgba16(pixels.to_rgba16()).write_with_encoder(encoder)?;
    } else {
        pixels.write_with_encoder(encoder)?;
    }
    Ok(buf)
}

impl CodecBackend for RustBackend {
    fn decode(&self, bytes: &[u8], codec: Codec) -> Result<DynamicImage, BackendError> {
        if codec == Codec::Jpeg && !has_jpeg_eoi(bytes) {
            return Err(BackendError::ProcessingFailed(
                "truncated JPEG: missing end-of-image marker".into(),
            ));
        }
        Ok(image::load_from_memory_with_format(
            bytes,
            codec.image_format(),
        )?)
    }

    fn encode(
        &self,
        pixels: &DynamicImage,
        codec: Codec,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, BackendError> {
        match codec {
            Codec::Jpeg => encode_jpeg(pixels, options),
            Codec::Png => encode_png(pixels, options),
            other => Err(BackendError::ProcessingFailed(format!(
                "Unsupported output format: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Quality;
    use crate::img::Image;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        }))
    }

    fn options(quality: u8, progressive: bool) -> EncodeOptions {
        EncodeOptions {
            quality: Quality::new(quality),
            progressive,
        }
    }

    fn roundtrip(pixels: &DynamicImage, codec: Codec, opts: &EncodeOptions) -> DynamicImage {
        let backend = RustBackend::new();
        let bytes = backend.encode(pixels, codec, opts).unwrap();
        assert_eq!(Codec::sniff(&bytes), Some(codec));
        backend.decode(&bytes, codec).unwrap()
    }

    #[test]
    fn jpeg_roundtrip_keeps_dimensions_and_looks_alike() {
        let source = gradient_rgb(64, 48);
        for quality in [0, 50, 100] {
            for progressive in [false, true] {
                let decoded = roundtrip(&source, Codec::Jpeg, &options(quality, progressive));
                assert_eq!((decoded.width(), decoded.height()), (64, 48));
                assert!(
                    Image::from(decoded).is_similar(&Image::from(source.clone())),
                    "quality {quality}, progressive {progressive}"
                );
            }
        }
    }

    #[test]
    fn jpeg_drops_alpha() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 40])));
        let decoded = roundtrip(&source, Codec::Jpeg, &options(90, false));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn jpeg_keeps_grayscale() {
        let source = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([200])));
        let decoded = roundtrip(&source, Codec::Jpeg, &options(90, false));
        assert_eq!(decoded.color(), ColorType::L8);
    }

    #[test]
    fn higher_jpeg_quality_is_larger() {
        let backend = RustBackend::new();
        let source = gradient_rgb(128, 128);
        let low = backend.encode(&source, Codec::Jpeg, &options(0, false)).unwrap();
        let high = backend
            .encode(&source, Codec::Jpeg, &options(100, false))
            .unwrap();
        assert!(high.len() > low.len());
    }

    #[test]
    fn png_is_lossless_at_every_quality() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_fn(32, 32, |x, y| {
            Rgba([x as u8 * 8, y as u8 * 8, 77, (x + y) as u8 * 4])
        }));
        for quality in [0, 50, 100] {
            let decoded = roundtrip(&source, Codec::Png, &options(quality, false));
            assert_eq!(decoded, source, "quality {quality}");
        }
    }

    #[test]
    fn png_ignores_progressive() {
        let backend = RustBackend::new();
        let source = gradient_rgb(16, 16);
        let plain = backend.encode(&source, Codec::Png, &options(50, false)).unwrap();
        let progressive = backend.encode(&source, Codec::Png, &options(50, true)).unwrap();
        assert_eq!(plain, progressive);
    }

    #[test]
    fn png_converts_float_samples() {
        let source = DynamicImage::ImageRgb32F(image::Rgb32FImage::from_pixel(
            4,
            4,
            Rgb([0.5, 0.25, 1.0]),
        ));
        let decoded = roundtrip(&source, Codec::Png, &options(50, false));
        assert_eq!(decoded.color(), ColorType::Rgba16);
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.decode(b"not a png", Codec::Png).is_err());
    }

    #[test]
    fn decode_truncated_jpeg_errors() {
        let backend = RustBackend::new();
        let bytes = backend
            .encode(&gradient_rgb(32, 32), Codec::Jpeg, &options(80, false))
            .unwrap();
        assert!(backend.decode(&bytes[..20], Codec::Jpeg).is_err());
    }

    #[test]
    fn decode_jpeg_cut_mid_scan_errors() {
        let backend = RustBackend::new();
        let bytes = backend
            .encode(&gradient_rgb(256, 256), Codec::Jpeg, &options(90, false))
            .unwrap();
        let err = backend
            .decode(&bytes[..bytes.len() / 2], Codec::Jpeg)
            .unwrap_err();
        assert!(err.to_string().contains("truncated JPEG"), "{err}");
    }

    #[test]
    fn decode_jpeg_tolerates_trailing_fill() {
        let backend = RustBackend::new();
        let mut bytes = backend
            .encode(&gradient_rgb(16, 16), Codec::Jpeg, &options(90, false))
            .unwrap();
        bytes.extend_from_slice(&[0x00, 0x00, 0xFF]);
        let decoded = backend.decode(&bytes, Codec::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn eoi_check() {
        assert!(has_jpeg_eoi(&[0xFF, 0xD8, 0x01, 0xFF, 0xD9]));
        assert!(has_jpeg_eoi(&[0xFF, 0xD8, 0xFF, 0xD9, 0x00, 0xFF]));
        assert!(!has_jpeg_eoi(&[0xFF, 0xD8, 0x12, 0x34]));
        assert!(!has_jpeg_eoi(&[0xFF, 0xD8, 0x12, 0xFF, 0x00]));
        assert!(!has_jpeg_eoi(&[]));
    }

    /// SOF2 marks a progressive frame, SOF0 a baseline one.
    fn has_marker(bytes: &[u8], marker: u8) -> bool {
        bytes.windows(2).any(|w| w == [0xFF, marker])
    }

    #[cfg(feature = "mozjpeg")]
    #[test]
    fn progressive_jpeg_uses_progressive_frames() {
        let backend = RustBackend::new();
        let source = gradient_rgb(64, 48);
        let progressive = backend
            .encode(&source, Codec::Jpeg, &options(80, true))
            .unwrap();
        assert!(has_marker(&progressive, 0xC2));
        assert!(!has_marker(&progressive, 0xC0));

        let baseline = backend
            .encode(&source, Codec::Jpeg, &options(80, false))
            .unwrap();
        assert!(has_marker(&baseline, 0xC0));
        assert!(!has_marker(&baseline, 0xC2));
    }

    #[cfg(not(feature = "mozjpeg"))]
    #[test]
    fn progressive_jpeg_without_mozjpeg_errors() {
        let backend = RustBackend::new();
        let result = backend.encode(&gradient_rgb(8, 8), Codec::Jpeg, &options(80, true));
        assert!(result.is_err());
    }

    #[test]
    fn gif_encode_errors() {
        let backend = RustBackend::new();
        let result = backend.encode(&gradient_rgb(4, 4), Codec::Gif, &options(50, false));
        assert!(result.is_err());
    }
}
