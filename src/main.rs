use clap::{Parser, Subcommand};
use ribs::batch::{self, BatchOptions};
use ribs::{Codec, Hooks, Next, Operations, Quality, RustBackend, config, output};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "ribs")]
#[command(about = "Convert and inspect JPEG and PNG images")]
#[command(long_about = "\
Convert and inspect JPEG and PNG images

The output codec follows the destination extension (.jpg, .jpeg, .png).
GIF is recognized but not supported.

Defaults for quality and progressive JPEG come from ribs.toml when present.
Run 'ribs gen-config' to print a documented ribs.toml.

Set RUST_LOG=ribs=debug to trace each pipeline stage on stderr.")]
#[command(version)]
struct Cli {
    /// Configuration file (optional)
    #[arg(long, default_value = "ribs.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Encode flags shared by `convert` and `batch`.
#[derive(clap::Args, Clone)]
struct EncodeArgs {
    /// Encoding quality, 0-100 (defaults per codec from config)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Write progressive JPEG
    #[arg(long)]
    progressive: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Decode SRC and re-encode it as DST
    Convert {
        src: PathBuf,
        dst: PathBuf,
        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Print format, dimensions and channels of each image
    Info {
        #[arg(required = true)]
        src: Vec<PathBuf>,
    },
    /// Convert every image under SRC_DIR into a mirrored tree under DST_DIR
    Batch {
        src_dir: PathBuf,
        dst_dir: PathBuf,
        /// Target codec
        #[arg(long, value_parser = parse_target_codec)]
        format: Codec,
        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Print a stock ribs.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
        command => run(command, &cli.config),
    }
}

fn run(command: Command, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    init_thread_pool(&config.processing);
    let ops = Operations::with_backend(RustBackend::new(), config.encode_defaults());

    match command {
        Command::Convert { src, dst, encode } => {
            let progressive = encode.progressive || config.jpeg.progressive;
            convert(&ops, &src, &dst, encode.quality, progressive)?;
        }
        Command::Info { src } => {
            let mut failed = 0;
            for path in &src {
                match decode(&ops, path) {
                    Ok(image) => output::print_info(path, Codec::from_path(path), &image),
                    Err(err) => {
                        failed += 1;
                        for line in output::format_info_error(path, &err) {
                            println!("{}", line);
                        }
                    }
                }
            }
            if failed > 0 {
                return Err(format!("{failed} of {} images could not be read", src.len()).into());
            }
        }
        Command::Batch {
            src_dir,
            dst_dir,
            format,
            encode,
        } => {
            let options = BatchOptions {
                format,
                quality: encode.quality.map(Quality::new),
                progressive: encode.progressive || config.jpeg.progressive,
            };
            let report = batch::convert_dir(&ops, &src_dir, &dst_dir, &options)?;
            output::print_batch_report(&report, &src_dir, &dst_dir);
            if !report.is_success() {
                return Err(format!("{} images failed to convert", report.failed.len()).into());
            }
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn parse_target_codec(s: &str) -> Result<Codec, String> {
    let codec: Codec = s.parse().map_err(|e: ribs::Error| e.to_string())?;
    if codec.is_supported() {
        Ok(codec)
    } else {
        Err(format!("unsupported format: {codec}"))
    }
}

/// Blocking `from` for the main thread.
fn decode(ops: &Operations, path: &Path) -> ribs::Result<ribs::Image> {
    let (next, rx) = Next::channel();
    ops.from(path, Some(next))?;
    rx.recv()
        .map_err(|_| ribs::Error::Decode("worker dropped the result".into()))?
}

fn convert(
    ops: &Operations,
    src: &Path,
    dst: &Path,
    quality: Option<u8>,
    progressive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = decode(ops, src)?;

    let filename = dst.to_str().ok_or("destination path is not valid UTF-8")?;
    let mut params = json!({ "filename": filename, "progressive": progressive });
    if let Some(quality) = quality {
        params["quality"] = json!(quality);
    }

    let (report_tx, report_rx) = mpsc::channel();
    let hooks = Hooks::new().on_written(move |report| {
        let _ = report_tx.send(report.clone());
    });
    let (next, rx) = Next::channel();
    ops.save(params, Some(hooks), image, Some(next))?;
    rx.recv()??;

    if let Ok(report) = report_rx.recv() {
        output::print_convert(src, &report);
    }
    Ok(())
}
