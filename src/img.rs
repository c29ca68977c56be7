//! The [`Image`] value object.
//!
//! An `Image` is an opaque handle to a decoded pixel buffer. It is either
//! *empty* (no buffer, every dimension zero) or *valid* (non-zero width and
//! height). The buffer is shared and immutable, so cloning is cheap and a
//! write operation can hold the image for its whole duration without the
//! caller being able to mutate it underneath.

use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

/// Mean per-channel difference (0.0–1.0) under which two images count as
/// perceptually similar. Loose enough for JPEG at the lowest quality setting.
pub const SIMILARITY_TOLERANCE: f64 = 0.12;

#[derive(Clone, Default, PartialEq)]
pub struct Image {
    pixels: Option<Arc<DynamicImage>>,
}

impl Image {
    /// An empty image. Write operations reject it with
    /// [`Error::EmptyImage`](crate::Error::EmptyImage).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dynamic(pixels: DynamicImage) -> Self {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Self::new();
        }
        Self {
            pixels: Some(Arc::new(pixels)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_none()
    }

    pub fn width(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.width())
    }

    pub fn height(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.height())
    }

    /// Number of channels per pixel (1 gray, 2 gray+alpha, 3 RGB, 4 RGBA).
    pub fn channels(&self) -> u8 {
        self.pixels.as_ref().map_or(0, |p| p.color().channel_count())
    }

    /// Bits per channel.
    pub fn depth(&self) -> u8 {
        self.pixels.as_ref().map_or(0, |p| {
            let color = p.color();
            (color.bits_per_pixel() / u16::from(color.channel_count())) as u8
        })
    }

    pub fn pixels(&self) -> Option<&DynamicImage> {
        self.pixels.as_deref()
    }

    /// Take the pixel buffer out, cloning only if the buffer is still shared.
    pub fn into_dynamic(self) -> Option<DynamicImage> {
        self.pixels.map(Arc::unwrap_or_clone)
    }

    /// Mean absolute difference between the two images' RGBA samples,
    /// normalized to 0.0–1.0.
    ///
    /// Returns `None` when either image is empty or the dimensions differ.
    pub fn difference(&self, other: &Image) -> Option<f64> {
        let (a, b) = (self.pixels()?, other.pixels()?);
        if a.width() != b.width() || a.height() != b.height() {
            return None;
        }
        let (a, b) = (a.to_rgba8(), b.to_rgba8());
        let total: u64 = a
            .as_raw()
            .iter()
            .zip(b.as_raw())
            .map(|(x, y)| u64::from(x.abs_diff(*y)))
            .sum();
        let samples = a.as_raw().len() as f64;
        Some(total as f64 / samples / 255.0)
    }

    /// Whether the images look the same: same dimensions and a
    /// [`difference`](Self::difference) within [`SIMILARITY_TOLERANCE`].
    pub fn is_similar(&self, other: &Image) -> bool {
        self.difference(other)
            .is_some_and(|d| d <= SIMILARITY_TOLERANCE)
    }
}

impl From<DynamicImage> for Image {
    fn from(pixels: DynamicImage) -> Self {
        Self::from_dynamic(pixels)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Image(empty)");
        }
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("channels", &self.channels())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> Image {
        Image::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_fn(
            width,
            height,
            |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]),
        )))
    }

    #[test]
    fn new_image_is_empty() {
        let image = Image::new();
        assert!(image.is_empty());
        assert_eq!((image.width(), image.height()), (0, 0));
        assert_eq!(image.channels(), 0);
        assert_eq!(image.depth(), 0);
    }

    #[test]
    fn zero_sized_buffer_is_empty() {
        let image = Image::from_dynamic(DynamicImage::new_rgb8(0, 10));
        assert!(image.is_empty());
    }

    #[test]
    fn metadata_of_rgb_image() {
        let image = gradient(40, 30);
        assert!(!image.is_empty());
        assert_eq!((image.width(), image.height()), (40, 30));
        assert_eq!(image.channels(), 3);
        assert_eq!(image.depth(), 8);
    }

    #[test]
    fn metadata_of_rgba16_image() {
        let image = Image::from_dynamic(DynamicImage::new_rgba16(4, 4));
        assert_eq!(image.channels(), 4);
        assert_eq!(image.depth(), 16);
    }

    #[test]
    fn identical_images_have_zero_difference() {
        let a = gradient(16, 16);
        let b = gradient(16, 16);
        assert_eq!(a.difference(&b), Some(0.0));
        assert!(a.is_similar(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn different_dimensions_are_not_similar() {
        assert_eq!(gradient(16, 16).difference(&gradient(16, 8)), None);
        assert!(!gradient(16, 16).is_similar(&gradient(8, 16)));
    }

    #[test]
    fn empty_images_are_never_similar() {
        assert!(!Image::new().is_similar(&Image::new()));
    }

    #[test]
    fn inverted_image_is_not_similar() {
        let black = Image::from_dynamic(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            Rgba([0, 0, 0, 255]),
        )));
        let white = Image::from_dynamic(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            Rgba([255, 255, 255, 255]),
        )));
        assert!(!black.is_similar(&white));
    }

    #[test]
    fn debug_does_not_dump_pixels() {
        assert_eq!(format!("{:?}", Image::new()), "Image(empty)");
        assert_eq!(
            format!("{:?}", gradient(2, 3)),
            "Image { width: 2, height: 3, channels: 3, depth: 8 }"
        );
    }
}
