//! # ribs
//!
//! Image I/O operations over paths, in-memory buffers and streams.
//!
//! ```text
//! open / from   source ─▶ resolve ─▶ read bytes ─▶ decode ─▶ next(Ok(Image))
//! save / to     params ─▶ normalize ─▶ resolve ─▶ encode ─▶ write ─▶ next(Ok(image))
//! ```
//!
//! Every operation reports through a single-shot [`Next`] callback. Codec
//! work runs on the rayon pool; the call itself returns as soon as the
//! arguments are validated.
//!
//! ```no_run
//! use ribs::{Next, from, to};
//! use serde_json::json;
//!
//! from("photo.png", Some(Next::new(|result| {
//!     let image = result.expect("decodable photo");
//!     let params = json!({ "dst": "photo.jpg", "quality": 80, "progressive": true });
//!     to(params, image, Some(Next::new(|result| {
//!         println!("saved: {:?}", result);
//!     })))
//!     .expect("callback supplied");
//! })))
//! .expect("callback supplied");
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`img`] | The [`Image`] value object: pixels, metadata, similarity |
//! | [`params`] | Normalizes raw destination arguments into [`OperationParams`] |
//! | [`resolve`] | Destination/source descriptors and codec selection |
//! | [`codec`] | Codec tables, the [`CodecBackend`] trait and the `image`-crate backend |
//! | [`operations`] | The `open`/`from`/`save`/`to` pipeline |
//! | [`stream`] | [`Sink`] capability, [`WriteStream`], [`SharedBuffer`], [`Source`] |
//! | [`config`] | `ribs.toml` loading and validation |
//! | [`batch`] | Parallel directory conversion |
//! | [`output`] | CLI output formatting |
//!
//! # Formats
//!
//! JPEG and PNG are supported in both directions. GIF is recognized by
//! extension and magic bytes but always fails with
//! [`Error::UnsupportedFormat`].

pub mod batch;
pub mod codec;
pub mod config;
pub mod error;
pub mod img;
pub mod operations;
pub mod output;
pub mod params;
pub mod resolve;
pub mod stream;

pub use codec::{Codec, CodecBackend, EncodeDefaults, Quality, RustBackend};
pub use error::{Error, ErrorKind, Result};
pub use img::Image;
pub use operations::{Hooks, Next, OpenOptions, Operand, Operations, WriteReport};
pub use params::{OperationParams, Params};
pub use stream::{SharedBuffer, Sink, Source, WriteStream};

use std::sync::LazyLock;

static DEFAULT_OPERATIONS: LazyLock<Operations> = LazyLock::new(Operations::new);

/// [`Operations::open`] with the default backend.
pub fn open(source: impl Into<Source>, options: &OpenOptions, next: Option<Next>) -> Result<()> {
    DEFAULT_OPERATIONS.open(source, options, next)
}

/// [`Operations::from`] with the default backend.
pub fn from(source: impl Into<Source>, next: Option<Next>) -> Result<()> {
    DEFAULT_OPERATIONS.from(source, next)
}

/// [`Operations::save`] with the default backend.
pub fn save(
    params: impl Into<Params>,
    hooks: Option<Hooks>,
    image: impl Into<Operand>,
    next: Option<Next>,
) -> Result<()> {
    DEFAULT_OPERATIONS.save(params, hooks, image, next)
}

/// [`Operations::to`] with the default backend.
pub fn to(params: impl Into<Params>, image: impl Into<Operand>, next: Option<Next>) -> Result<()> {
    DEFAULT_OPERATIONS.to(params, image, next)
}
