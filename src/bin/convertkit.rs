//! CLI binary for convertkit.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, writes the result and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use convertkit::{
    convert_files, write_output, Cardinality, ConversionConfig, ConversionProgressCallback,
    ConversionReport, ConvertError, FailureKind, Operation, PageSize, ProgressCallback,
    WordBackend,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders a progress bar over the request's inputs and one log line per
/// finished input.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Name and start time of inputs in flight, by index.
    in_flight: Mutex<HashMap<usize, (String, Instant)>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            in_flight: Mutex::new(HashMap::new()),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, operation: Operation, total_inputs: usize) {
        self.bar.set_length(total_inputs as u64);
        self.bar.set_prefix(operation.name());
    }

    fn on_input_start(&self, index: usize, _total: usize, name: &str) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.insert(index, (name.to_string(), Instant::now()));
        }
        self.bar.set_message(name.to_string());
    }

    fn on_input_complete(&self, index: usize, total: usize) {
        let finished = self
            .in_flight
            .lock()
            .ok()
            .and_then(|mut in_flight| in_flight.remove(&index));
        if let Some((name, started)) = finished {
            self.bar.println(format!(
                "  {} {:>3}/{:<3} {}  {}",
                green("✓"),
                index + 1,
                total,
                name,
                dim(&format!("{:.1}s", started.elapsed().as_secs_f64())),
            ));
        }
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _operation: Operation, _output_len: usize) {
        self.bar.finish_and_clear();
    }

    fn on_conversion_error(&self, _operation: Operation, _error: String) {
        self.bar.abandon();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Multi-resolution icon (16, 32, 48, 64, 128 px)
  convertkit image-to-icon logo.png

  # Merge PDFs in the given order
  convertkit merge-pdfs cover.pdf body.pdf appendix.pdf -o book.pdf

  # One A4 page per photo, half-inch margins
  convertkit images-to-pdf --page-size a4 --margin 36 *.jpg

  # Word document without LibreOffice (text only, pdfium)
  convertkit pdf-to-word --word-backend text report.pdf

  # Presentation to PDF, custom LibreOffice location
  convertkit slides-to-pdf --soffice /opt/libreoffice/program/soffice deck.pptx

  # Soundtrack of a video at 128 kbit/s, JSON summary on stdout
  convertkit video-to-audio --audio-bitrate 128 --json talk.mp4

  # Show every operation and the extensions it accepts
  convertkit --list

EXIT CODES:
  0  success
  1  internal error
  2  the input cannot be converted (corrupt, unsupported, rejected by the tool)
  3  environment problem (missing tool or library, timeout, disk) - retry after fixing

EXTERNAL TOOLS:
  pdf-to-word     LibreOffice (soffice)   CONVERTKIT_SOFFICE or PATH
                  pdfium (text fallback)  PDFIUM_LIB_PATH or system library path
  slides-to-pdf   LibreOffice (soffice)   CONVERTKIT_SOFFICE or PATH
  video-to-audio  ffmpeg                  CONVERTKIT_FFMPEG or PATH

ENVIRONMENT VARIABLES:
  RUST_LOG                Override log filter (e.g. convertkit=debug)
  CONVERTKIT_*            Fallback for most flags, see --help for each
"#;

/// Convert files between document, image and media formats.
#[derive(Parser, Debug)]
#[command(
    name = "convertkit",
    version,
    about = "Convert files between document, image and media formats",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Operation to run (see --list).
    #[arg(required_unless_present = "list")]
    operation: Option<Operation>,

    /// Input files, in order.
    #[arg(required_unless_present = "list")]
    inputs: Vec<PathBuf>,

    /// Output file or directory. Default: suggested filename in the
    /// current directory.
    #[arg(short, long, env = "CONVERTKIT_OUTPUT")]
    output: Option<PathBuf>,

    /// Print a JSON report on stdout.
    #[arg(long, env = "CONVERTKIT_JSON")]
    json: bool,

    /// Page size for images-to-pdf.
    #[arg(long, env = "CONVERTKIT_PAGE_SIZE", value_enum, default_value = "letter")]
    page_size: PageSizeArg,

    /// Page margin for images-to-pdf, in points (72 = one inch).
    #[arg(long, env = "CONVERTKIT_MARGIN", default_value_t = 72.0)]
    margin: f32,

    /// Icon sizes for image-to-icon, comma separated (1-256).
    #[arg(long, env = "CONVERTKIT_ICON_SIZES", value_delimiter = ',')]
    icon_sizes: Option<Vec<u32>>,

    /// pdf-to-word engine: auto (LibreOffice if installed, else text), office or text.
    #[arg(long, env = "CONVERTKIT_WORD_BACKEND", value_enum, default_value = "auto")]
    word_backend: WordBackendArg,

    /// MP3 bitrate for video-to-audio, kbit/s (32-320).
    #[arg(long, env = "CONVERTKIT_AUDIO_BITRATE", default_value_t = 192,
          value_parser = clap::value_parser!(u32).range(32..=320))]
    audio_bitrate: u32,

    /// External tool timeout in seconds; 0 disables it.
    #[arg(long, env = "CONVERTKIT_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Path to soffice / libreoffice.
    #[arg(long, env = "CONVERTKIT_SOFFICE")]
    soffice: Option<PathBuf>,

    /// Path to ffmpeg.
    #[arg(long, env = "CONVERTKIT_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// pdfium shared library, or the directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Parent directory for temporary workspaces.
    #[arg(long, env = "CONVERTKIT_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "CONVERTKIT_NO_PROGRESS")]
    no_progress: bool,

    /// List operations and exit.
    #[arg(long)]
    list: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CONVERTKIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CONVERTKIT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    Letter,
    A4,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::A4 => PageSize::A4,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum WordBackendArg {
    Auto,
    Office,
    Text,
}

impl From<WordBackendArg> for WordBackend {
    fn from(v: WordBackendArg) -> Self {
        match v {
            WordBackendArg::Auto => WordBackend::Auto,
            WordBackendArg::Office => WordBackend::Office,
            WordBackendArg::Text => WordBackend::Text,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose mode shows everything.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    if cli.list {
        print_operations();
        return Ok(());
    }
    let operation = cli
        .operation
        .context("an operation is required (see --list)")?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    let start = Instant::now();
    let output = convert_files(operation, &cli.inputs, &config)
        .await
        .with_context(|| format!("{operation} failed"))?;
    let duration_ms = start.elapsed().as_millis() as u64;

    let destination = resolve_destination(cli.output.as_deref(), &output.filename);
    write_output(&output, &destination)
        .await
        .context("Failed to save the converted file")?;

    if cli.json {
        let inputs = cli
            .inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let report = ConversionReport::new(operation, inputs, &output, duration_ms);
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {} bytes  {}ms  →  {}",
            green("✔"),
            operation,
            output.bytes.len(),
            duration_ms,
            bold(&destination.display().to_string()),
        );
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .page_size(cli.page_size.into())
        .margin_pt(cli.margin)
        .word_backend(cli.word_backend.into())
        .audio_bitrate_kbps(cli.audio_bitrate)
        .process_timeout_secs((cli.timeout > 0).then_some(cli.timeout));

    if let Some(ref sizes) = cli.icon_sizes {
        builder = builder.icon_sizes(sizes.clone());
    }
    if let Some(ref path) = cli.soffice {
        builder = builder.soffice_path(path);
    }
    if let Some(ref path) = cli.ffmpeg {
        builder = builder.ffmpeg_path(path);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_root(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `-o` may name a file or an existing directory.
fn resolve_destination(output: Option<&Path>, suggested: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(suggested),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(suggested),
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ConvertError>().map(ConvertError::kind) {
        Some(FailureKind::Input) => 2,
        Some(FailureKind::Environment) => 3,
        Some(FailureKind::Internal) | None => 1,
    }
}

fn print_operations() {
    println!("{}", bold("OPERATIONS"));
    for op in Operation::ALL {
        let inputs = match op.cardinality() {
            Cardinality::Single => "1 file",
            Cardinality::Multiple => "1+ files",
        };
        println!(
            "  {} {:<9} → .{:<5} {}",
            cyan(&format!("{:<16}", op.name())),
            inputs,
            op.output_extension(),
            op.description()
        );
        println!(
            "  {:<16} {}",
            "",
            dim(&format!("accepts: {}", op.accepted_extensions().join(", ")))
        );
    }
}
