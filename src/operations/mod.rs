//! The four I/O operations and their shared pipeline.
//!
//! Every call walks the same states:
//!
//! ```text
//! Validating → Resolving → Dispatching → Completed
//! ```
//!
//! Validation and resolution run on the caller's thread and short-circuit to
//! `Completed` on the first error. Dispatching (file/stream I/O and the
//! codec) runs on the rayon pool, so the caller never blocks. `Completed`
//! hands the outcome to the operation's [`Next`] exactly once: `Next` wraps
//! an `FnOnce` and is consumed by the call.
//!
//! The only error returned synchronously is a missing `Next`; everything
//! else reaches the callback.
//!
//! | Operation | Direction | Module |
//! |---|---|---|
//! | [`Operations::open`], [`Operations::from`] | read | [`open`] |
//! | [`Operations::save`], [`Operations::to`] | write | [`save`] |

pub mod open;
pub mod save;

pub use open::OpenOptions;
pub use save::{Hooks, WriteReport};

use crate::codec::{CodecBackend, EncodeDefaults, RustBackend};
use crate::error::{Error, Result};
use crate::img::Image;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, mpsc};

/// Pipeline state, reported on every `tracing` event of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Resolving,
    Dispatching,
    Completed,
}

type Callback = Box<dyn FnOnce(Result<Image>) + Send + 'static>;

/// Single-shot completion callback of an operation.
pub struct Next(Callback);

impl Next {
    pub fn new(callback: impl FnOnce(Result<Image>) + Send + 'static) -> Self {
        Self(Box::new(callback))
    }

    /// A `Next` that forwards the outcome into a channel, for callers that
    /// would rather block on `recv()` than nest callbacks.
    ///
    /// Do not block on the receiver from inside a rayon worker: the
    /// operation itself needs a worker to complete.
    pub fn channel() -> (Self, mpsc::Receiver<Result<Image>>) {
        let (tx, rx) = mpsc::channel();
        let next = Self::new(move |result| {
            // receiver gone means nobody is waiting
            let _ = tx.send(result);
        });
        (next, rx)
    }

    fn complete(self, result: Result<Image>) {
        if let Err(err) = &result {
            tracing::debug!(stage = ?Stage::Completed, error = %err, "operation failed");
        } else {
            tracing::debug!(stage = ?Stage::Completed, "operation succeeded");
        }
        (self.0)(result)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// The image argument of a write operation.
///
/// Write operations accept whatever an upstream step produced, which is not
/// always an image (a job description may carry a plain value in that
/// slot). Anything but [`Operand::Image`] fails validation.
#[derive(Debug, Clone)]
pub enum Operand {
    Image(Image),
    Value(Value),
}

impl From<Image> for Operand {
    fn from(image: Image) -> Self {
        Operand::Image(image)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

fn require_next(next: Option<Next>) -> Result<Next> {
    next.ok_or_else(|| Error::invalid_type("next", "a function"))
}

/// Entry point bundling a codec backend with encode defaults.
///
/// Cloning is cheap; clones share the backend. The free functions
/// [`open`](crate::open), [`from`](crate::from), [`save`](crate::save) and
/// [`to`](crate::to) use a process-wide instance with a [`RustBackend`] and
/// stock defaults.
pub struct Operations<B = RustBackend> {
    backend: Arc<B>,
    defaults: EncodeDefaults,
}

impl Operations<RustBackend> {
    pub fn new() -> Self {
        Self::with_backend(RustBackend::new(), EncodeDefaults::default())
    }
}

impl Default for Operations<RustBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for Operations<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            defaults: self.defaults,
        }
    }
}

impl<B: CodecBackend + 'static> Operations<B> {
    pub fn with_backend(backend: B, defaults: EncodeDefaults) -> Self {
        Self {
            backend: Arc::new(backend),
            defaults,
        }
    }

    pub fn defaults(&self) -> EncodeDefaults {
        self.defaults
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
