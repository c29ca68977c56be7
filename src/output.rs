//! CLI output formatting.
//!
//! Each command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout. Format functions are pure.
//!
//! ## Info
//!
//! ```text
//! photo.png
//!     Format: png
//!     Dimensions: 640x480
//!     Channels: 4 (8-bit)
//! ```
//!
//! ## Convert
//!
//! ```text
//! photo.png → photo.jpg (jpg, 48213 bytes)
//! ```
//!
//! ## Batch
//!
//! ```text
//! a.png → a.jpg
//! trip/b.jpeg → trip/b.jpg
//! FAILED trip/broken.jpg: can't decode: ...
//! Converted 2 images, 1 failed
//! ```

use crate::batch::BatchReport;
use crate::codec::Codec;
use crate::error::Error;
use crate::img::Image;
use crate::operations::WriteReport;
use std::path::Path;

/// Path relative to `root` when possible, for compact listings.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// info
// ============================================================================

pub fn format_info(path: &Path, codec: Option<Codec>, image: &Image) -> Vec<String> {
    let format = codec.map_or("unknown", Codec::key);
    vec![
        path.display().to_string(),
        format!("    Format: {format}"),
        format!("    Dimensions: {}x{}", image.width(), image.height()),
        format!(
            "    Channels: {} ({}-bit)",
            image.channels(),
            image.depth()
        ),
    ]
}

pub fn format_info_error(path: &Path, err: &Error) -> Vec<String> {
    vec![path.display().to_string(), format!("    Error: {err}")]
}

pub fn print_info(path: &Path, codec: Option<Codec>, image: &Image) {
    for line in format_info(path, codec, image) {
        println!("{}", line);
    }
}

// ============================================================================
// convert
// ============================================================================

pub fn format_convert(source: &Path, report: &WriteReport) -> String {
    let destination = report
        .path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stream>".to_string());
    format!(
        "{} \u{2192} {} ({}, {} bytes)",
        source.display(),
        destination,
        report.codec,
        report.bytes
    )
}

pub fn print_convert(source: &Path, report: &WriteReport) {
    println!("{}", format_convert(source, report));
}

// ============================================================================
// batch
// ============================================================================

pub fn format_batch_report(report: &BatchReport, src_root: &Path, dst_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for converted in &report.converted {
        lines.push(format!(
            "{} \u{2192} {}",
            relative(&converted.source, src_root),
            relative(&converted.destination, dst_root)
        ));
    }
    for (source, reason) in &report.failed {
        lines.push(format!("FAILED {}: {}", relative(source, src_root), reason));
    }
    let summary = match report.failed.len() {
        0 => format!("Converted {}", plural(report.converted.len(), "image")),
        failed => format!(
            "Converted {}, {} failed",
            plural(report.converted.len(), "image"),
            failed
        ),
    };
    lines.push(summary);
    lines
}

pub fn print_batch_report(report: &BatchReport, src_root: &Path, dst_root: &Path) {
    for line in format_batch_report(report, src_root, dst_root) {
        println!("{}", line);
    }
}
