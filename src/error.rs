//! Error taxonomy shared by every operation.
//!
//! Messages are stable and meant to be matched on: callers (and the test
//! suite) compare `err.to_string()` against strings such as
//! `"invalid filename: /dev/null"` or `"empty image"`. Use [`Error::kind`]
//! when only the category matters.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Wrong argument shape or type, including a missing callback.
    #[error("invalid type: {name} should be {expected}")]
    InvalidType { name: String, expected: String },
    /// Well-typed but semantically invalid, e.g. an unrecognized extension.
    #[error("{0}")]
    InvalidArgument(String),
    #[error("empty image")]
    EmptyImage,
    /// Recognized codec key without a working codec behind it (gif).
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("can't decode: {0}")]
    Decode(String),
    #[error("can't encode: {0}")]
    Encode(String),
}

/// Coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidType,
    InvalidArgument,
    EmptyImage,
    UnsupportedFormat,
    Decode,
    Encode,
}

impl Error {
    pub(crate) fn invalid_type(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidType {
            name: name.into(),
            expected: expected.into(),
        }
    }

    pub(crate) fn invalid_filename(filename: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("invalid filename: {filename}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidType { .. } => ErrorKind::InvalidType,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::EmptyImage => ErrorKind::EmptyImage,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Encode(_) => ErrorKind::Encode,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_type_message() {
        let err = Error::invalid_type("image", "an instance of Image");
        assert_eq!(
            err.to_string(),
            "invalid type: image should be an instance of Image"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn invalid_filename_message() {
        let err = Error::invalid_filename("/dev/null");
        assert_eq!(err.to_string(), "invalid filename: /dev/null");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn empty_image_message() {
        assert_eq!(Error::EmptyImage.to_string(), "empty image");
    }
}
