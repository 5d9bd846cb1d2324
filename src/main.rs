use clap::{Parser, Subcommand};
use gif_derive::config::{self, EditorConfig};
use gif_derive::editor::{EditOptions, Editor};
use gif_derive::imaging::{CropRequest, RustBackend};
use gif_derive::output::{self, ProbeSummary};
use gif_derive::store::{FileStore, HeaderedWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Target box shared by `resize` and `stream`.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    /// Maximum width in pixels (omit or 0 for no limit)
    #[arg(long)]
    width: Option<u32>,

    /// Maximum height in pixels (omit or 0 for no limit)
    #[arg(long)]
    height: Option<u32>,

    /// Fill the box exactly, cropping the overflow from the center
    #[arg(long)]
    crop: bool,
}

impl SizeArgs {
    fn is_empty(&self) -> bool {
        self.width.unwrap_or(0) == 0 && self.height.unwrap_or(0) == 0
    }
}

#[derive(Parser)]
#[command(name = "gif-derive")]
#[command(about = "Resize and crop animated GIFs frame by frame")]
#[command(long_about = "\
Resize and crop animated GIFs frame by frame

Every frame is cropped and scaled with the same geometry and its delay is
kept, so derivatives animate exactly like the source. Single-frame images
(including still PNG, JPEG and WebP) are resized as stills.

Derivatives are written next to the source as {stem}-{width}x{height}.{ext}
unless -o is given. Sizes are never scaled up.

Logging goes to stderr; set RUST_LOG (e.g. RUST_LOG=gif_derive=debug) for
per-frame detail.

Run 'gif-derive gen-config' to generate a documented gif-derive.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./gif-derive.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show size, type and frame count of an image
    Probe { file: PathBuf },
    /// Resize to fit (or fill, with --crop) a box and save
    Resize {
        file: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
        /// Output file (default: generated next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cut a region out, optionally scaling it, and save
    Crop {
        file: PathBuf,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        /// Scale the region to this width
        #[arg(long)]
        dst_width: Option<u32>,
        /// Scale the region to this height
        #[arg(long)]
        dst_height: Option<u32>,
        /// Treat width/height as the region's bottom-right corner
        #[arg(long)]
        absolute: bool,
        /// Output file (default: generated next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate every configured size from one source
    MultiResize {
        file: PathBuf,
        /// Print the result mapping as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a Content-Type header and the encoded image to stdout
    Stream {
        file: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Print a stock gif-derive.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    init_thread_pool(&config.processing);
    let options = EditOptions::from_config(&config);
    let backend = RustBackend::new();
    let store = FileStore::new();

    match cli.command {
        Command::Probe { file } => {
            let editor = Editor::load(&backend, &store, options, &file)?;
            let frames = editor.frame_count()?;
            output::print_probe(&ProbeSummary {
                file: editor.file(),
                dimensions: editor.size(),
                mime_type: editor.mime_type(),
                kind: editor.kind(),
                frames,
            });
        }
        Command::Resize {
            file,
            size,
            output: out,
        } => {
            let mut editor = Editor::load(&backend, &store, options, &file)?;
            editor.resize(size.width, size.height, size.crop)?;
            let saved = editor.save(out.as_deref(), None)?;
            output::print_saved(&saved);
        }
        Command::Crop {
            file,
            x,
            y,
            width,
            height,
            dst_width,
            dst_height,
            absolute,
            output: out,
        } => {
            let mut editor = Editor::load(&backend, &store, options, &file)?;
            editor.crop(&CropRequest {
                src_x: x,
                src_y: y,
                src_w: width,
                src_h: height,
                dst_w: dst_width,
                dst_h: dst_height,
                absolute,
            })?;
            let saved = editor.save(out.as_deref(), None)?;
            output::print_saved(&saved);
        }
        Command::MultiResize { file, json } => {
            let editor = Editor::load(&backend, &store, options, &file)?;
            let specs = config.target_sizes();
            let results = editor.multi_resize(&specs);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                let requested: Vec<String> = specs.into_iter().map(|s| s.name).collect();
                output::print_batch(&file, &requested, &results);
            }
        }
        Command::Stream { file, size } => {
            let mut editor = Editor::load(&backend, &store, options, &file)?;
            if !size.is_empty() {
                editor.resize(size.width, size.height, size.crop)?;
            }
            let stdout = std::io::stdout();
            let mut channel = HeaderedWriter::new(stdout.lock());
            editor.stream(None, &mut channel)?;
        }
        // Printed before config loading
        Command::GenConfig => {}
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Explicit `--config` file, or `gif-derive.toml` in the working directory.
fn load_config(path: Option<&Path>) -> Result<EditorConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
