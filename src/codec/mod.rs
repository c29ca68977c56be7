//! Codec selection and dispatch.
//!
//! | Codec key | Extensions | Decode | Encode |
//! |---|---|---|---|
//! | `jpg` | `.jpg`, `.jpeg` | `image` crate | `image` crate (baseline), `mozjpeg` (progressive, default feature) |
//! | `png` | `.png` | `image` crate | `image` crate, deflate effort from quality |
//! | `gif` | `.gif` | unsupported | unsupported |
//!
//! The module is split into:
//! - **Parameters**: [`Quality`] and [`EncodeOptions`]
//! - **Backend**: [`CodecBackend`] trait + [`RustBackend`]
//! - **Dispatch**: [`Codec`] lookup tables and the [`decode`]/[`encode`]
//!   entry points that guard against unsupported codecs

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, CodecBackend};
pub use params::{EncodeDefaults, EncodeOptions, PngEffort, Quality};
pub use rust_backend::RustBackend;

use crate::error::{Error, Result};
use crate::img::Image;
use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Normalized format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Jpeg,
    Png,
    Gif,
}

/// Every extension we recognize as an image, supported or not.
const EXTENSIONS: &[(&str, Codec)] = &[
    ("jpg", Codec::Jpeg),
    ("jpeg", Codec::Jpeg),
    ("png", Codec::Png),
    ("gif", Codec::Gif),
];

/// Recognized codecs with no working implementation behind them.
const UNSUPPORTED: &[Codec] = &[Codec::Gif];

impl Codec {
    /// Case-insensitive lookup of a bare extension (`"JPG"`, `"png"`).
    pub fn from_extension(ext: &str) -> Option<Codec> {
        EXTENSIONS
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, codec)| *codec)
    }

    /// Codec for the suffix after the last `.` of the file name.
    pub fn from_path(path: &Path) -> Option<Codec> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Codec::from_extension)
    }

    /// Identify the codec from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Codec> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(Codec::Jpeg),
            ImageFormat::Png => Some(Codec::Png),
            ImageFormat::Gif => Some(Codec::Gif),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Codec::Jpeg => "jpg",
            Codec::Png => "png",
            Codec::Gif => "gif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Codec::Jpeg => ImageFormat::Jpeg,
            Codec::Png => ImageFormat::Png,
            Codec::Gif => ImageFormat::Gif,
        }
    }

    pub fn is_supported(self) -> bool {
        !UNSUPPORTED.contains(&self)
    }

    pub(crate) fn ensure_supported(self) -> Result<Codec> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(Error::UnsupportedFormat(self.key().to_string()))
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Codec::from_extension(s.trim_start_matches('.'))
            .ok_or_else(|| Error::InvalidArgument(format!("invalid format: {s}")))
    }
}

/// Extensions of the codecs that actually decode, for directory scans.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSIONS
        .iter()
        .filter(|(_, codec)| codec.is_supported())
        .map(|(ext, _)| *ext)
}

/// Decode `bytes` as `codec`.
pub fn decode(backend: &dyn CodecBackend, bytes: &[u8], codec: Codec) -> Result<Image> {
    let codec = codec.ensure_supported()?;
    let pixels = backend
        .decode(bytes, codec)
        .map_err(|e| Error::Decode(e.to_string()))?;
    let image = Image::from_dynamic(pixels);
    if image.is_empty() {
        return Err(Error::Decode("image has no pixels".into()));
    }
    Ok(image)
}

/// Encode a non-empty `image` as `codec`.
pub fn encode(
    backend: &dyn CodecBackend,
    image: &Image,
    codec: Codec,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    let codec = codec.ensure_supported()?;
    let pixels = image.pixels().ok_or(Error::EmptyImage)?;
    backend
        .encode(pixels, codec, options)
        .map_err(|e| Error::Encode(e.to_string()))
}
