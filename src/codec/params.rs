//! Encode parameters handed from the dispatcher to a backend.
//!
//! - [`Quality`]: 0–100, where 100 means least compression / highest fidelity.
//! - [`EncodeOptions`]: quality plus the JPEG progressive flag.
//! - [`PngEffort`]: deflate effort derived from quality for the lossless PNG codec.
//! - [`EncodeDefaults`]: per-codec quality when an operation leaves it out.

use super::Codec;
use crate::error::{Error, Result};
use std::fmt;

/// Encoding quality on the closed interval 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Quality = Quality(0);
    pub const MAX: Quality = Quality(100);

    /// Clamps to 100.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Strict constructor used at the API edge: anything outside 0–100 is an
    /// [`Error::InvalidArgument`].
    pub fn try_new(value: i64) -> Result<Self> {
        match u8::try_from(value) {
            Ok(v) if v <= 100 => Ok(Self(v)),
            _ => Err(Error::InvalidArgument(format!("invalid quality: {value}"))),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Quality on the JPEG encoder's 1–100 scale. The encoder has no level 0.
    pub fn jpeg(self) -> u8 {
        self.0.max(1)
    }

    pub fn png_effort(self) -> PngEffort {
        match (100 - u32::from(self.0)) * 9 / 100 {
            0..=2 => PngEffort::Fast,
            3..=6 => PngEffort::Default,
            _ => PngEffort::Best,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deflate effort for PNG output. Lower quality trades CPU time for size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngEffort {
    Fast,
    Default,
    Best,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub quality: Quality,
    /// Multi-scan JPEG output. Ignored by every other codec.
    pub progressive: bool,
}

/// Quality used when an operation does not specify one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeDefaults {
    pub jpeg: Quality,
    pub png: Quality,
}

impl EncodeDefaults {
    pub fn quality_for(&self, codec: Codec) -> Quality {
        match codec {
            Codec::Png => self.png,
            Codec::Jpeg | Codec::Gif => self.jpeg,
        }
    }
}

impl Default for EncodeDefaults {
    fn default() -> Self {
        Self {
            jpeg: Quality(95),
            png: Quality(60),
        }
    }
}
