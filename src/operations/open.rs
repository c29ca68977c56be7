//! Read operations: `open` and `from`.

use super::{Next, Operations, Stage, require_next};
use crate::codec::{self, Codec, CodecBackend};
use crate::error::{Error, Result};
use crate::img::Image;
use crate::resolve::{ReadPlan, resolve_read};
use crate::stream::Source;

/// Options of [`Operations::open`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Codec to assume when the payload's magic bytes are not conclusive.
    /// Only consulted for buffers and streams; paths use their extension.
    pub format: Option<Codec>,
}

impl<B: CodecBackend + 'static> Operations<B> {
    /// Decode `source` into a new [`Image`].
    ///
    /// `source` may be a path (its extension must name a known codec), an
    /// in-memory buffer or a readable stream.
    pub fn open(
        &self,
        source: impl Into<Source>,
        options: &OpenOptions,
        next: Option<Next>,
    ) -> Result<()> {
        let next = require_next(next)?;
        let source = source.into();
        tracing::debug!(stage = ?Stage::Resolving, source = ?source, "open");

        let plan = match resolve_read(source, options.format) {
            Ok(plan) => plan,
            Err(err) => {
                next.complete(Err(err));
                return Ok(());
            }
        };

        let backend = std::sync::Arc::clone(&self.backend);
        rayon::spawn(move || {
            tracing::debug!(stage = ?Stage::Dispatching, codec = ?plan.codec, "decoding");
            next.complete(dispatch_read(&*backend, plan));
        });
        Ok(())
    }

    /// [`open`](Self::open) with default options.
    pub fn from(&self, source: impl Into<Source>, next: Option<Next>) -> Result<()> {
        self.open(source, &OpenOptions::default(), next)
    }
}

fn dispatch_read(backend: &dyn CodecBackend, plan: ReadPlan) -> Result<Image> {
    // A declared gif fails before any I/O.
    if let Some(declared) = plan.codec {
        declared.ensure_supported()?;
    }
    let (bytes, declared) = plan.read_bytes()?;
    let codec = Codec::sniff(&bytes)
        .or(declared)
        .ok_or_else(|| Error::Decode("unknown image format".into()))?;
    codec::decode(backend, &bytes, codec)
}
