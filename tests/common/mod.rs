//! Shared fixtures for the integration tests.
//!
//! Fixtures are synthesized into a fresh temp directory per test so the
//! suite needs no binary assets checked in.

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use ribs::{Image, Next, Operand, Params, Source};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Fixtures {
    pub dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, image: DynamicImage) -> PathBuf {
        let path = self.path(name);
        image.save(&path).unwrap();
        path
    }

    /// 64x48 RGB gradient saved as baseline JPEG.
    pub fn jpeg(&self) -> PathBuf {
        self.write("fixture.jpg", DynamicImage::ImageRgb8(gradient()))
    }

    /// 8-bit grayscale PNG.
    pub fn png8(&self) -> PathBuf {
        let img = GrayImage::from_fn(40, 30, |x, y| Luma([(x * 4 + y * 2) as u8]));
        self.write("fixture8.png", DynamicImage::ImageLuma8(img))
    }

    /// 24-bit RGB PNG.
    pub fn png24(&self) -> PathBuf {
        self.write("fixture24.png", DynamicImage::ImageRgb8(gradient()))
    }

    /// 24-bit RGB PNG with an alpha channel.
    pub fn png24_alpha(&self) -> PathBuf {
        let img = RgbaImage::from_fn(32, 32, |x, y| {
            Rgba([(x * 8) as u8, (y * 8) as u8, 90, ((x + y) * 4) as u8])
        });
        self.write("fixture24a.png", DynamicImage::ImageRgba8(img))
    }
}

pub fn gradient() -> RgbImage {
    RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 2) as u8, (y * 3) as u8, 120]))
}

pub fn open_blocking(source: impl Into<Source>) -> ribs::Result<Image> {
    let (next, rx) = Next::channel();
    ribs::from(source, Some(next)).unwrap();
    rx.recv().unwrap()
}

pub fn save_blocking(params: impl Into<Params>, image: impl Into<Operand>) -> ribs::Result<Image> {
    let (next, rx) = Next::channel();
    ribs::save(params, None, image, Some(next)).unwrap();
    rx.recv().unwrap()
}

pub fn to_blocking(params: impl Into<Params>, image: impl Into<Operand>) -> ribs::Result<Image> {
    let (next, rx) = Next::channel();
    ribs::to(params, image, Some(next)).unwrap();
    rx.recv().unwrap()
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}
