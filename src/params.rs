//! Parameter normalization for write operations.
//!
//! Callers describe a destination in several shapes: a bare path string, an
//! array whose first element is the path, a stream, or an options record
//! (`{"filename": ..., "quality": ..., "progressive": ...}`). [`normalize`]
//! turns all of them into one [`OperationParams`] so later stages never
//! branch on the raw shape again.
//!
//! Loosely-typed shapes arrive as `serde_json::Value`, which lets records
//! come straight from JSON/TOML job descriptions and keeps type errors
//! reportable with the member name (`params.quality should be a number`).

use crate::codec::{Codec, Quality};
use crate::error::{Error, Result};
use crate::stream::{SharedBuffer, Sink, WriteStream};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Raw destination argument of `save`/`to`.
pub enum Params {
    /// A path string, an array or an options record.
    Value(Value),
    /// A bare stream or sink.
    Stream(Box<dyn Sink>),
    /// A stream plus an options record for quality/progressive/format.
    StreamWithOptions {
        stream: Box<dyn Sink>,
        options: Value,
    },
}

impl Params {
    pub fn stream_with_options(stream: impl Sink + 'static, options: Value) -> Self {
        Params::StreamWithOptions {
            stream: Box::new(stream),
            options,
        }
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        Params::Value(value)
    }
}

impl From<&str> for Params {
    fn from(path: &str) -> Self {
        Params::Value(Value::String(path.to_string()))
    }
}

impl From<String> for Params {
    fn from(path: String) -> Self {
        Params::Value(Value::String(path))
    }
}

impl From<&Path> for Params {
    fn from(path: &Path) -> Self {
        Params::Value(Value::String(path.to_string_lossy().into_owned()))
    }
}

impl From<PathBuf> for Params {
    fn from(path: PathBuf) -> Self {
        Params::from(path.as_path())
    }
}

impl<W: Write + Send + 'static> From<WriteStream<W>> for Params {
    fn from(stream: WriteStream<W>) -> Self {
        Params::Stream(Box::new(stream))
    }
}

impl From<SharedBuffer> for Params {
    fn from(buffer: SharedBuffer) -> Self {
        Params::Stream(Box::new(buffer))
    }
}

impl From<Box<dyn Sink>> for Params {
    fn from(sink: Box<dyn Sink>) -> Self {
        Params::Stream(sink)
    }
}

/// Normalized write target.
pub enum Target {
    Path(PathBuf),
    Stream(Box<dyn Sink>),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Target::Stream(sink) => f
                .debug_struct("Stream")
                .field("path", &sink.path())
                .field("format", &sink.format())
                .finish(),
        }
    }
}

/// Canonical parameter record.
#[derive(Debug)]
pub struct OperationParams {
    pub target: Target,
    /// `None` means the codec's configured default.
    pub quality: Option<Quality>,
    pub progressive: bool,
    /// Explicit codec hint, used when the target carries no file name.
    pub format: Option<Codec>,
}

impl OperationParams {
    fn new(target: Target) -> Self {
        Self {
            target,
            quality: None,
            progressive: false,
            format: None,
        }
    }
}

/// Per-operation accepted shapes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shape {
    /// Record member holding the path (or stream) of the destination.
    target_key: &'static str,
    /// Record member reserved for a stream, for operations that split it out.
    stream_key: Option<&'static str>,
    accepts_array: bool,
    expected: &'static str,
    target_expected: &'static str,
}

pub(crate) const SAVE: Shape = Shape {
    target_key: "filename",
    stream_key: Some("stream"),
    accepts_array: false,
    expected: "a string or an object",
    target_expected: "a string",
};

pub(crate) const TO: Shape = Shape {
    target_key: "dst",
    stream_key: None,
    accepts_array: true,
    expected: "a string, an object or an array",
    target_expected: "a string or a stream",
};

const OPTION_KEYS: &[&str] = &["quality", "progressive", "format"];

/// Coerce a raw argument into [`OperationParams`].
pub(crate) fn normalize(raw: Params, shape: &Shape) -> Result<OperationParams> {
    match raw {
        Params::Value(Value::String(path)) => Ok(OperationParams::new(Target::Path(path.into()))),
        Params::Value(Value::Array(items)) if shape.accepts_array => match items.first() {
            Some(Value::String(path)) => Ok(OperationParams::new(Target::Path(path.into()))),
            _ => Err(Error::invalid_type("params[0]", "a string")),
        },
        Params::Value(Value::Object(record)) => from_record(record, None, shape),
        Params::Value(_) => Err(Error::invalid_type("params", shape.expected)),
        Params::Stream(stream) => Ok(OperationParams::new(Target::Stream(stream))),
        Params::StreamWithOptions { stream, options } => match options {
            Value::Object(record) => from_record(record, Some(stream), shape),
            _ => Err(Error::invalid_type("params", "an object")),
        },
    }
}

fn from_record(
    record: Map<String, Value>,
    stream: Option<Box<dyn Sink>>,
    shape: &Shape,
) -> Result<OperationParams> {
    if let Some(key) = record.keys().find(|key| {
        key.as_str() != shape.target_key
            && Some(key.as_str()) != shape.stream_key
            && !OPTION_KEYS.contains(&key.as_str())
    }) {
        return Err(Error::InvalidArgument(format!("unknown option: {key}")));
    }

    let target = match stream {
        Some(stream) => {
            if let Some(key) = std::iter::once(shape.target_key)
                .chain(shape.stream_key)
                .find(|key| record.contains_key(*key))
            {
                return Err(Error::InvalidArgument(format!(
                    "ambiguous destination: params.{key} given alongside a stream"
                )));
            }
            Target::Stream(stream)
        }
        None => record_target(&record, shape)?,
    };

    let mut params = OperationParams::new(target);

    if let Some(value) = record.get("quality") {
        params.quality = Some(parse_quality(value)?);
    }
    if let Some(value) = record.get("progressive") {
        params.progressive = value
            .as_bool()
            .ok_or_else(|| Error::invalid_type("params.progressive", "a boolean"))?;
    }
    if let Some(value) = record.get("format") {
        let key = value
            .as_str()
            .ok_or_else(|| Error::invalid_type("params.format", "a string"))?;
        params.format = Some(key.parse()?);
    }

    Ok(params)
}

fn record_target(record: &Map<String, Value>, shape: &Shape) -> Result<Target> {
    // A JSON record cannot hold a live stream, so a stream member is
    // always the wrong type.
    if let Some(key) = shape.stream_key.filter(|key| record.contains_key(*key)) {
        return Err(Error::invalid_type(format!("params.{key}"), "a stream"));
    }
    match record.get(shape.target_key) {
        Some(Value::String(path)) => Ok(Target::Path(path.into())),
        _ => Err(Error::invalid_type(
            format!("params.{}", shape.target_key),
            shape.target_expected,
        )),
    }
}

fn parse_quality(value: &Value) -> Result<Quality> {
    let Value::Number(number) = value else {
        return Err(Error::invalid_type("params.quality", "a number"));
    };
    match number.as_i64() {
        Some(q) => Quality::try_new(q),
        None => Err(Error::InvalidArgument(format!("invalid quality: {number}"))),
    }
}
