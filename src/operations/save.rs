//! Write operations: `save` and `to`.
//!
//! Both share one pipeline and differ only in the parameter shapes they
//! accept: `save` takes a path string or a `{filename | stream, ...}` record,
//! `to` additionally takes arrays and names its destination `dst`.

use super::{Next, Operand, Operations, Stage, require_next};
use crate::codec::{self, Codec, CodecBackend, EncodeDefaults, EncodeOptions};
use crate::error::{Error, Result};
use crate::img::Image;
use crate::params::{Params, SAVE, Shape, TO, normalize};
use crate::resolve::{WritePlan, resolve_write};
use std::path::{Path, PathBuf};

type ResolvedHook = Box<dyn FnOnce(Codec, Option<&Path>) + Send>;
type WrittenHook = Box<dyn FnOnce(&WriteReport) + Send>;

/// Observers attached to a `save`.
///
/// Hooks run on the worker thread and cannot change the outcome.
#[derive(Default)]
pub struct Hooks {
    on_resolved: Option<ResolvedHook>,
    on_written: Option<WrittenHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once the codec is known, before encoding.
    pub fn on_resolved(mut self, hook: impl FnOnce(Codec, Option<&Path>) + Send + 'static) -> Self {
        self.on_resolved = Some(Box::new(hook));
        self
    }

    /// Called after the payload has been written in full.
    pub fn on_written(mut self, hook: impl FnOnce(&WriteReport) + Send + 'static) -> Self {
        self.on_written = Some(Box::new(hook));
        self
    }
}

/// What a successful write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub codec: Codec,
    pub path: Option<PathBuf>,
    pub bytes: usize,
}

impl<B: CodecBackend + 'static> Operations<B> {
    /// Encode `image` to the destination described by `params`.
    ///
    /// `params` is a path string, a stream, or a record
    /// `{"filename": ..., "quality": 0-100, "progressive": bool, "format": ...}`
    /// (use [`Params::stream_with_options`] for a stream with options). On
    /// success the callback gets `image` back.
    pub fn save(
        &self,
        params: impl Into<Params>,
        hooks: Option<Hooks>,
        image: impl Into<Operand>,
        next: Option<Next>,
    ) -> Result<()> {
        self.write(params.into(), &SAVE, hooks.unwrap_or_default(), image.into(), next)
    }

    /// Like [`save`](Self::save) without hooks. Also accepts an array whose
    /// first element is the path, and names the record member `dst`.
    pub fn to(
        &self,
        params: impl Into<Params>,
        image: impl Into<Operand>,
        next: Option<Next>,
    ) -> Result<()> {
        self.write(params.into(), &TO, Hooks::default(), image.into(), next)
    }

    fn write(
        &self,
        raw: Params,
        shape: &Shape,
        hooks: Hooks,
        operand: Operand,
        next: Option<Next>,
    ) -> Result<()> {
        let next = require_next(next)?;

        let (plan, image) = match prepare(raw, shape, operand) {
            Ok(prepared) => prepared,
            Err(err) => {
                next.complete(Err(err));
                return Ok(());
            }
        };

        let backend = std::sync::Arc::clone(&self.backend);
        let defaults = self.defaults;
        rayon::spawn(move || {
            tracing::debug!(
                stage = ?Stage::Dispatching,
                codec = %plan.codec,
                destination = ?plan.destination,
                "encoding"
            );
            let result = dispatch_write(&*backend, defaults, plan, &image, hooks).map(|()| image);
            next.complete(result);
        });
        Ok(())
    }
}

/// Validating and Resolving. A bad destination is reported before an empty
/// image, so `/dev/null` always yields "invalid filename".
fn prepare(raw: Params, shape: &Shape, operand: Operand) -> Result<(WritePlan, Image)> {
    tracing::debug!(stage = ?Stage::Validating, "write");
    let params = normalize(raw, shape)?;
    let Operand::Image(image) = operand else {
        return Err(Error::invalid_type("image", "an instance of Image"));
    };

    tracing::debug!(stage = ?Stage::Resolving, target = ?params.target, "write");
    let plan = resolve_write(params)?;
    if image.is_empty() {
        return Err(Error::EmptyImage);
    }
    Ok((plan, image))
}

fn dispatch_write(
    backend: &dyn CodecBackend,
    defaults: EncodeDefaults,
    plan: WritePlan,
    image: &Image,
    hooks: Hooks,
) -> Result<()> {
    let WritePlan {
        destination,
        codec,
        quality,
        progressive,
    } = plan;

    if let Some(hook) = hooks.on_resolved {
        hook(codec, destination.path());
    }

    let options = EncodeOptions {
        quality: quality.unwrap_or_else(|| defaults.quality_for(codec)),
        progressive,
    };
    let bytes = codec::encode(backend, image, codec, &options)?;

    let path = destination.path().map(Path::to_path_buf);
    destination.write_all(&bytes)?;

    if let Some(hook) = hooks.on_written {
        hook(&WriteReport {
            codec,
            path,
            bytes: bytes.len(),
        });
    }
    Ok(())
}
