//! Codec backend trait.
//!
//! The [`CodecBackend`] trait defines the two operations every backend must
//! support: decode bytes into pixels and encode pixels into bytes. Codec
//! support checks (gif) happen in the dispatcher before a backend is called,
//! so backends only ever see `jpg` and `png`.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::Codec;
use super::params::EncodeOptions;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl From<image::ImageError> for BackendError {
    fn from(e: image::ImageError) -> Self {
        BackendError::ProcessingFailed(e.to_string())
    }
}

/// Trait for codec backends.
///
/// Backends run on worker threads, hence `Send + Sync`.
pub trait CodecBackend: Send + Sync {
    /// Decode a complete encoded payload.
    fn decode(&self, bytes: &[u8], codec: Codec) -> Result<DynamicImage, BackendError>;

    /// Encode pixels into a complete payload.
    fn encode(
        &self,
        pixels: &DynamicImage,
        codec: Codec,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without doing pixel work.
    ///
    /// Decodes yield a 1x1 RGB image; encodes yield a fixed marker payload.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        pub failure: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode {
            codec: Codec,
            len: usize,
        },
        Encode {
            codec: Codec,
            width: u32,
            height: u32,
            quality: u8,
            progressive: bool,
        },
    }

    pub const MOCK_PAYLOAD: &[u8] = b"mock-encoded";

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(reason: &str) -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                failure: Some(reason.to_string()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn outcome(&self) -> Result<(), BackendError> {
            match &self.failure {
                Some(reason) => Err(BackendError::ProcessingFailed(reason.clone())),
                None => Ok(()),
            }
        }
    }

    impl CodecBackend for MockBackend {
        fn decode(&self, bytes: &[u8], codec: Codec) -> Result<DynamicImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Decode {
                codec,
                len: bytes.len(),
            });
            self.outcome()?;
            Ok(DynamicImage::new_rgb8(1, 1))
        }

        fn encode(
            &self,
            pixels: &DynamicImage,
            codec: Codec,
            options: &EncodeOptions,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                codec,
                width: pixels.width(),
                height: pixels.height(),
                quality: options.quality.value(),
                progressive: options.progressive,
            });
            self.outcome()?;
            Ok(MOCK_PAYLOAD.to_vec())
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::new();
        let pixels = backend.decode(b"abc", Codec::Png).unwrap();
        assert_eq!((pixels.width(), pixels.height()), (1, 1));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Decode {
                codec: Codec::Png,
                len: 3
            }]
        );
    }

    #[test]
    fn failing_mock_still_records() {
        let backend = MockBackend::failing("boom");
        let pixels = DynamicImage::new_rgb8(2, 2);
        let options = EncodeOptions {
            quality: crate::codec::Quality::new(10),
            progressive: false,
        };
        let err = backend.encode(&pixels, Codec::Jpeg, &options).unwrap_err();
        assert_eq!(err.to_string(), "Processing failed: boom");
        assert_eq!(backend.get_operations().len(), 1);
    }
}
