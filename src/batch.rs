//! Directory conversion.
//!
//! Walks a source tree, decodes every JPEG/PNG it finds and re-encodes it
//! into a mirrored tree under the destination root, with the extension
//! swapped for the target codec:
//!
//! ```text
//! photos/                    out/
//! ├── a.png          ──▶     ├── a.jpg
//! └── trip/                  └── trip/
//!     └── b.jpeg     ──▶         └── b.jpg
//! ```
//!
//! Each file is an independent `from` → `to` chain on the rayon pool; the
//! calling thread only collects outcomes. A failing file is logged and
//! reported, it never aborts the rest of the batch.
//!
//! Sources that land on the same destination (`a.png` and `a.jpg` converted
//! to PNG) are not both written: the first in file-name order wins and the
//! rest are reported as collisions.

use crate::codec::{Codec, CodecBackend, Quality};
use crate::operations::{Next, Operations};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error(transparent)]
    Image(#[from] crate::Error),
}

/// Target codec and encode settings applied to every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub format: Codec,
    /// `None` uses the [`Operations`] defaults for `format`.
    pub quality: Option<Quality>,
    pub progressive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub converted: Vec<Converted>,
    /// Source path and the reason it was not converted.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Every decodable image under `root`, in file-name order.
pub fn find_sources(root: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !root.is_dir() {
        return Err(BatchError::SourceNotFound(root.to_path_buf()));
    }
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if Codec::from_path(entry.path()).is_some_and(Codec::is_supported) {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}

/// Where `source` lands under `dst_root`.
pub fn destination_for(src_root: &Path, dst_root: &Path, source: &Path, codec: Codec) -> PathBuf {
    let relative = source.strip_prefix(src_root).unwrap_or(source);
    dst_root.join(relative).with_extension(codec.key())
}

/// Convert every image under `src_root` into `dst_root`.
///
/// Only setup problems (missing source directory, unreadable tree,
/// unsupported target codec) are returned as `Err`; per-file failures end
/// up in [`BatchReport::failed`].
pub fn convert_dir<B: CodecBackend + 'static>(
    ops: &Operations<B>,
    src_root: &Path,
    dst_root: &Path,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    options.format.ensure_supported()?;
    let sources = find_sources(src_root)?;
    tracing::info!(
        count = sources.len(),
        src = %src_root.display(),
        dst = %dst_root.display(),
        format = %options.format,
        "batch conversion"
    );

    let mut report = BatchReport::default();
    let (tx, rx) = mpsc::channel();
    let mut pending = 0usize;
    let mut claimed = HashSet::new();

    for source in sources {
        let destination = destination_for(src_root, dst_root, &source, options.format);
        if !claimed.insert(destination.clone()) {
            tracing::warn!(
                src = %source.display(),
                dst = %destination.display(),
                "destination collision"
            );
            report.failed.push((
                source,
                format!(
                    "destination collision: {} is written from another source",
                    destination.display()
                ),
            ));
            continue;
        }
        if let Some(parent) = destination.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                report.failed.push((source, e.to_string()));
                continue;
            }
        }
        let params = match write_params(&destination, options) {
            Ok(params) => params,
            Err(reason) => {
                report.failed.push((source, reason));
                continue;
            }
        };
        spawn_conversion(ops, source, destination, params, tx.clone());
        pending += 1;
    }
    drop(tx);

    for (source, destination, result) in rx.iter().take(pending) {
        match result {
            Ok(()) => {
                tracing::debug!(src = %source.display(), dst = %destination.display(), "converted");
                report.converted.push(Converted {
                    source,
                    destination,
                });
            }
            Err(err) => {
                tracing::warn!(src = %source.display(), error = %err, "conversion failed");
                report.failed.push((source, err.to_string()));
            }
        }
    }

    report.converted.sort_by(|a, b| a.source.cmp(&b.source));
    report.failed.sort();
    Ok(report)
}

type Outcome = (PathBuf, PathBuf, crate::error::Result<()>);

fn write_params(destination: &Path, options: &BatchOptions) -> Result<Value, String> {
    let dst = destination
        .to_str()
        .ok_or_else(|| format!("non UTF-8 destination: {}", destination.display()))?;
    let mut params = Map::new();
    params.insert("dst".into(), Value::from(dst));
    if let Some(quality) = options.quality {
        params.insert("quality".into(), Value::from(quality.value()));
    }
    params.insert("progressive".into(), Value::from(options.progressive));
    Ok(Value::Object(params))
}

/// Chain `from(source)` into `to(params)` without blocking any worker.
fn spawn_conversion<B: CodecBackend + 'static>(
    ops: &Operations<B>,
    source: PathBuf,
    destination: PathBuf,
    params: Value,
    tx: mpsc::Sender<Outcome>,
) {
    let writer = ops.clone();
    let (origin, target) = (source.clone(), destination.clone());
    let fallback = tx.clone();
    let read_done = Next::new(move |decoded| {
        let image = match decoded {
            Ok(image) => image,
            Err(err) => {
                let _ = tx.send((source, destination, Err(err)));
                return;
            }
        };
        let reply = tx.clone();
        let (src, dst) = (source.clone(), destination.clone());
        let write_done = Next::new(move |written| {
            let _ = reply.send((src, dst, written.map(|_| ())));
        });
        if let Err(err) = writer.to(params, image, Some(write_done)) {
            let _ = tx.send((source, destination, Err(err)));
        }
    });
    if let Err(err) = ops.from(origin.clone(), Some(read_done)) {
        let _ = fallback.send((origin, target, Err(err)));
    }
}
