//! Byte origins and destinations.
//!
//! Writes go to anything implementing [`Sink`]: a `Write` that may also know
//! the file name it is bound to and/or the format it expects. The name is
//! what lets `to(WriteStream::create("out.png")?, ...)` pick the PNG codec
//! exactly as `to("out.png", ...)` would. A sink with neither (a socket, a
//! pipe) needs an explicit format hint.
//!
//! Reads come from a [`Source`]: a path, an in-memory buffer, or any `Read`.

use crate::codec::Codec;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Writable destination capability.
pub trait Sink: Write + Send {
    /// The file name this sink writes to, if any.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Format the consumer expects, if declared.
    fn format(&self) -> Option<Codec> {
        None
    }
}

/// A `Write` tagged with an optional bound name and format.
pub struct WriteStream<W> {
    inner: W,
    path: Option<PathBuf>,
    format: Option<Codec>,
}

impl<W: Write + Send> WriteStream<W> {
    /// An anonymous stream. Needs [`with_format`](Self::with_format) or a
    /// `format` option before it can be written to.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            path: None,
            format: None,
        }
    }

    /// A stream bound to `path`. Nothing is opened here; the name only
    /// drives codec selection.
    pub fn named(inner: W, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: Some(path.into()),
            format: None,
        }
    }

    pub fn with_format(mut self, format: Codec) -> Self {
        self.format = Some(format);
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl WriteStream<BufWriter<File>> {
    /// Create (or truncate) `path` and bind the stream to it.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Ok(Self::named(BufWriter::new(file), path))
    }
}

impl<W: Write> Write for WriteStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Send> Sink for WriteStream<W> {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn format(&self) -> Option<Codec> {
        self.format
    }
}

impl<W> fmt::Debug for WriteStream<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteStream")
            .field("path", &self.path)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Growable in-memory sink whose contents stay reachable from clones.
///
/// The operation takes its sink by value; keep a clone to read the bytes
/// after completion.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().map(|buf| buf.clone()).unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| io::Error::other("shared buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for SharedBuffer {}

/// Where a read operation gets its bytes.
pub enum Source {
    Path(PathBuf),
    Buffer(Vec<u8>),
    Stream(Box<dyn Read + Send>),
}

impl Source {
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Source::Stream(Box::new(reader))
    }

    /// Read the whole payload.
    pub(crate) fn read_all(self) -> io::Result<Vec<u8>> {
        match self {
            Source::Path(path) => std::fs::read(path),
            Source::Buffer(bytes) => Ok(bytes),
            Source::Stream(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Source::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(path.into())
    }
}

impl From<String> for Source {
    fn from(path: String) -> Self {
        Source::Path(path.into())
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Source::Buffer(bytes)
    }
}

impl From<&[u8]> for Source {
    fn from(bytes: &[u8]) -> Self {
        Source::Buffer(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_stream_reports_path() {
        let stream = WriteStream::named(Vec::new(), "/tmp/out.png");
        assert_eq!(stream.path(), Some(Path::new("/tmp/out.png")));
        assert_eq!(stream.format(), None);
    }

    #[test]
    fn anonymous_stream_with_format() {
        let stream = WriteStream::new(Vec::new()).with_format(Codec::Jpeg);
        assert_eq!(stream.path(), None);
        assert_eq!(stream.format(), Some(Codec::Jpeg));
    }

    #[test]
    fn write_stream_forwards_bytes() {
        let mut stream = WriteStream::new(Vec::new());
        stream.write_all(b"abc").unwrap();
        assert_eq!(stream.into_inner(), b"abc");
    }

    #[test]
    fn create_binds_file_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bound.jpg");
        let mut stream = WriteStream::create(&path).unwrap();
        assert_eq!(stream.path(), Some(path.as_path()));
        stream.write_all(b"xyz").unwrap();
        stream.flush().unwrap();
        drop(stream);
        assert_eq!(std::fs::read(&path).unwrap(), b"xyz");
    }

    #[test]
    fn shared_buffer_is_visible_through_clones() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"hello").unwrap();
        assert_eq!(buffer.contents(), b"hello");
    }

    #[test]
    fn read_all_from_every_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("data.bin");
        std::fs::write(&path, b"on disk").unwrap();

        assert_eq!(Source::from(path.as_path()).read_all().unwrap(), b"on disk");
        assert_eq!(Source::from(&b"in memory"[..]).read_all().unwrap(), b"in memory");
        assert_eq!(
            Source::stream(io::Cursor::new(b"streamed".to_vec()))
                .read_all()
                .unwrap(),
            b"streamed"
        );
    }

    #[test]
    fn read_all_missing_file_errors() {
        let err = Source::from("/nonexistent/image.png").read_all().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
