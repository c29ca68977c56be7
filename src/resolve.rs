//! Destination and source resolution.
//!
//! Turns a normalized target into a descriptor that knows which codec
//! applies. Resolution is pure inspection: files are created, and streams
//! written, only when the dispatcher hands the encoded payload over through
//! [`Destination::write_all`].

use crate::codec::{Codec, Quality};
use crate::error::{Error, Result};
use crate::params::{OperationParams, Target};
use crate::stream::{Sink, Source};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolved write target.
pub enum Destination {
    Path(PathBuf),
    Stream(Box<dyn Sink>),
}

impl Destination {
    /// File name the payload ends up under, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Destination::Path(path) => Some(path),
            Destination::Stream(sink) => sink.path(),
        }
    }

    /// Write the complete payload and release the target.
    ///
    /// A file this write created is removed again if the write fails, so a
    /// failed operation never leaves a truncated image behind. A file that
    /// already existed is never removed. Caller streams are flushed, then
    /// dropped.
    pub(crate) fn write_all(self, bytes: &[u8]) -> Result<()> {
        match self {
            Destination::Path(path) => {
                let existed = path.exists();
                std::fs::write(&path, bytes).map_err(|e| {
                    if !existed && path.is_file() {
                        if let Err(cleanup) = std::fs::remove_file(&path) {
                            tracing::warn!(
                                path = %path.display(),
                                error = %cleanup,
                                "failed to remove partial output"
                            );
                        }
                    }
                    Error::Encode(format!("failed to write {}: {e}", path.display()))
                })
            }
            Destination::Stream(mut sink) => sink
                .write_all(bytes)
                .and_then(|()| sink.flush())
                .map_err(|e| Error::Encode(format!("failed to write stream: {e}"))),
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Destination::Stream(sink) => f.debug_tuple("Stream").field(&sink.path()).finish(),
        }
    }
}

/// Everything the dispatcher needs for a write.
#[derive(Debug)]
pub struct WritePlan {
    pub destination: Destination,
    pub codec: Codec,
    pub quality: Option<Quality>,
    pub progressive: bool,
}

/// Resolve the codec for a write target.
///
/// - Path: the extension decides; a format hint must agree with it.
/// - Stream: an explicit hint (options record, then the stream's own) wins,
///   else the stream's bound file name.
pub(crate) fn resolve_write(params: OperationParams) -> Result<WritePlan> {
    let OperationParams {
        target,
        quality,
        progressive,
        format,
    } = params;

    let (destination, codec) = match target {
        Target::Path(path) => {
            let codec =
                Codec::from_path(&path).ok_or_else(|| Error::invalid_filename(path.display()))?;
            if let Some(hint) = format.filter(|hint| *hint != codec) {
                return Err(Error::InvalidArgument(format!(
                    "format {hint} does not match filename: {}",
                    path.display()
                )));
            }
            (Destination::Path(path), codec)
        }
        Target::Stream(sink) => {
            let codec = match format.or_else(|| sink.format()) {
                Some(codec) => codec,
                None => match sink.path() {
                    Some(path) => Codec::from_path(path)
                        .ok_or_else(|| Error::invalid_filename(path.display()))?,
                    None => {
                        return Err(Error::InvalidArgument(
                            "invalid stream: no file name or format to infer the codec from"
                                .into(),
                        ));
                    }
                },
            };
            (Destination::Stream(sink), codec)
        }
    };

    Ok(WritePlan {
        destination,
        codec,
        quality,
        progressive,
    })
}

/// Everything the dispatcher needs for a read.
#[derive(Debug)]
pub struct ReadPlan {
    pub source: Source,
    /// Codec declared by the extension or a hint. The payload's magic bytes
    /// take precedence once read.
    pub codec: Option<Codec>,
}

impl ReadPlan {
    pub(crate) fn read_bytes(self) -> Result<(Vec<u8>, Option<Codec>)> {
        let origin = match &self.source {
            Source::Path(path) => path.display().to_string(),
            Source::Buffer(_) => "buffer".to_string(),
            Source::Stream(_) => "stream".to_string(),
        };
        let bytes = self
            .source
            .read_all()
            .map_err(|e| Error::Decode(format!("failed to read {origin}: {e}")))?;
        Ok((bytes, self.codec))
    }
}

pub(crate) fn resolve_read(source: Source, hint: Option<Codec>) -> Result<ReadPlan> {
    let codec = match &source {
        Source::Path(path) => {
            Some(Codec::from_path(path).ok_or_else(|| Error::invalid_filename(path.display()))?)
        }
        Source::Buffer(_) | Source::Stream(_) => hint,
    };
    Ok(ReadPlan { source, codec })
}
