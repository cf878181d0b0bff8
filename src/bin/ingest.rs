//! CLI binary for edgequake-ingest.
//!
//! A thin shim over the library crate that maps CLI flags to `IngestConfig`
//! and prints or saves results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_ingest::{
    IngestConfig, IngestProgressCallback, IngestedDocument, Ingestor, OutputFormat, PageSeparator,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Live progress bar for directory batches. Files finish out of order, so
/// start times are tracked per file name.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    // Poisoned locks are recovered; the map only holds timestamps.
    fn start_times(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.start_times.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn elapsed_secs(&self, filename: &str) -> f64 {
        self.start_times()
            .remove(filename)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Ingesting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Ingesting {total_files} files…"))
        ));
    }

    fn on_file_start(&self, filename: &str) {
        self.start_times().insert(filename.to_string(), Instant::now());
        self.bar.set_message(filename.to_string());
    }

    fn on_file_complete(&self, filename: &str, page_count: usize, content_len: usize) {
        let secs = self.elapsed_secs(filename);
        self.bar.println(format!(
            "  {} {:<32}  {:>4} pages  {}  {}",
            green("✓"),
            filename,
            page_count,
            dim(&format!("{content_len:>7} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, filename: &str, error: &str) {
        let secs = self.elapsed_secs(filename);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            red("✗"),
            filename,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files ingested successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files ingested  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Quick ingest to stdout
  ingest document.pdf

  # Save to file
  ingest document.pdf -o output.md

  # Process a directory, one <stem>.md per document
  ingest docs/ -o processed/

  # Only Markdown files, 8 at a time
  ingest docs/ --pattern '*.md' --concurrency 8

  # Output as JSON
  ingest document.pdf --format json

  # RAG-ready chunks as JSON records
  ingest handbook.pdf --chunks --chunk-size 800 --chunk-overlap 80

  # Ingest from URL
  ingest https://example.com/report.pdf

SUPPORTED FORMATS:
  .pdf              pdfium text layer
  .md .csv .html    built-in text backends
  .docx .pptx .xlsx recognised; need a library Converter

ENVIRONMENT VARIABLES:
  INGEST_*                Every flag has an override, e.g. INGEST_FORMAT=json
  RUST_LOG                Log filter (overrides --verbose / --quiet)
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
"#;

/// Ingest documents into Markdown, HTML, JSON, text or RAG chunks.
#[derive(Parser, Debug)]
#[command(
    name = "ingest",
    version,
    about = "Ingest documents into Markdown, HTML, JSON, text or RAG chunks",
    long_about = "Convert PDF, HTML, Markdown and CSV documents (files, directories or URLs) \
into clean text, and optionally split the result into overlapping chunks for \
retrieval-augmented generation.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document file, directory, or HTTP/HTTPS URL.
    input: String,

    /// Output file (single document) or directory (directory input).
    #[arg(short, long, env = "INGEST_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, env = "INGEST_FORMAT", value_enum, default_value = "markdown")]
    format: FormatArg,

    /// Glob applied to file names in directory mode.
    #[arg(long, env = "INGEST_PATTERN")]
    pattern: Option<String>,

    /// Files ingested concurrently in directory mode.
    #[arg(short, long, env = "INGEST_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Emit chunk records as JSON instead of whole documents.
    #[arg(long, env = "INGEST_CHUNKS")]
    chunks: bool,

    /// Chunk size in characters.
    #[arg(long, env = "INGEST_CHUNK_SIZE", default_value_t = edgequake_ingest::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, env = "INGEST_CHUNK_OVERLAP", default_value_t = edgequake_ingest::DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Mark embedded images in the output.
    #[arg(long, env = "INGEST_IMAGES")]
    images: bool,

    /// Keep CSV sources verbatim instead of rendering tables.
    #[arg(long, env = "INGEST_NO_TABLES")]
    no_tables: bool,

    /// Page separator: none, hr, comment, or custom string.
    #[arg(long, env = "INGEST_SEPARATOR", default_value = "none")]
    separator: String,

    /// Disable progress bar.
    #[arg(long, env = "INGEST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INGEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "INGEST_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "INGEST_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Markdown,
    Html,
    Json,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

/// One chunk as printed by `--chunks`.
#[derive(Debug, Serialize)]
struct ChunkRecord<'a> {
    content: &'a str,
    source: &'a str,
    index: usize,
    metadata: ChunkMetadata,
}

#[derive(Debug, Serialize)]
struct ChunkMetadata {
    chunk_size: usize,
    chunk_overlap: usize,
    format: OutputFormat,
    page_count: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let is_url = cli.input.starts_with("http://") || cli.input.starts_with("https://");
    let input_path = PathBuf::from(&cli.input);
    let is_dir = !is_url && input_path.is_dir();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar (directory mode only) replaces INFO logs.
    let show_progress = is_dir && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    if !is_url && !input_path.exists() {
        eprintln!("Error: {} does not exist", input_path.display());
        std::process::exit(1);
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn IngestProgressCallback>)
    } else {
        None
    };

    let result = match build_config(&cli, progress_cb) {
        Ok(config) => {
            let ingestor = Ingestor::new(config);
            if is_dir {
                run_directory(&cli, &ingestor, &input_path).await
            } else {
                run_single(&cli, &ingestor).await
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", red("Error:"), e);
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `IngestConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<IngestConfig> {
    let mut builder = IngestConfig::builder()
        .output_format(cli.format.into())
        .extract_images(cli.images)
        .extract_tables(!cli.no_tables)
        .page_separator(parse_separator(&cli.separator))
        .concurrency(cli.concurrency)
        .chunking(cli.chunk_size, cli.chunk_overlap)
        .download_timeout_secs(cli.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_single(cli: &Cli, ingestor: &Ingestor) -> Result<()> {
    if cli.verbose {
        eprintln!("Processing {}...", cli.input);
    }

    let doc = ingestor
        .ingest(&cli.input)
        .await
        .with_context(|| format!("Failed to ingest {}", cli.input))?;

    if cli.chunks {
        let json = chunk_json(ingestor.config(), std::slice::from_ref(&doc))?;
        match cli.output {
            Some(ref path) => write_text(path, &json)?,
            None => println!("{json}"),
        }
    } else if let Some(ref path) = cli.output {
        doc.save(path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(doc.content.as_bytes())
            .context("Failed to write to stdout")?;
        if !doc.content.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if let Some(ref path) = cli.output {
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {:.2}s  →  {}",
                green("✔"),
                doc.page_count,
                doc.processing_time,
                bold(&path.display().to_string()),
            );
        }
    }
    Ok(())
}

async fn run_directory(cli: &Cli, ingestor: &Ingestor, dir: &Path) -> Result<()> {
    if cli.verbose {
        eprintln!("Processing directory {}...", dir.display());
    }

    let output = ingestor
        .ingest_directory(dir, cli.pattern.as_deref())
        .await
        .with_context(|| format!("Failed to ingest directory {}", dir.display()))?;

    match cli.output {
        Some(ref out_dir) => {
            std::fs::create_dir_all(out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            for doc in &output.documents {
                let stem = Path::new(&doc.filename)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| doc.filename.clone());
                let target = if cli.chunks {
                    let target = out_dir.join(format!("{stem}.chunks.json"));
                    write_text(&target, &chunk_json(ingestor.config(), std::slice::from_ref(doc))?)?;
                    target
                } else {
                    let target = out_dir.join(format!("{stem}.md"));
                    doc.save(&target)
                        .with_context(|| format!("Failed to save {}", target.display()))?;
                    target
                };
                if cli.verbose {
                    eprintln!("Saved {} to {}", doc.filename, target.display());
                }
            }
        }
        None if cli.chunks => {
            println!("{}", chunk_json(ingestor.config(), &output.documents)?);
        }
        None => {
            for doc in &output.documents {
                println!("\n=== {} ===", doc.filename);
                println!("{}", doc.content);
            }
        }
    }

    // With a progress bar the callback already printed the per-file log.
    if !cli.quiet && cli.no_progress {
        eprintln!(
            "Ingested {}/{} files ({} pages) in {}ms",
            output.stats.ingested_files,
            output.stats.total_files,
            output.stats.total_pages,
            output.stats.total_duration_ms
        );
        for failure in &output.failures {
            eprintln!("  {} {}", red("✗"), failure);
        }
    }
    if cli.verbose {
        eprintln!("Processing complete!");
    }
    Ok(())
}

/// Serialise every chunk of `docs` as a JSON array of records.
fn chunk_json(config: &IngestConfig, docs: &[IngestedDocument]) -> Result<String> {
    let chunker = config.chunker().context("Invalid chunk parameters")?;
    let chunked: Vec<(&IngestedDocument, Vec<String>)> =
        docs.iter().map(|doc| (doc, doc.chunks(&chunker))).collect();

    let records: Vec<ChunkRecord<'_>> = chunked
        .iter()
        .flat_map(|(doc, chunks)| {
            chunks.iter().enumerate().map(move |(index, content)| ChunkRecord {
                content,
                source: &doc.filename,
                index,
                metadata: ChunkMetadata {
                    chunk_size: chunker.chunk_size(),
                    chunk_overlap: chunker.overlap(),
                    format: doc.format,
                    page_count: doc.page_count,
                },
            })
        })
        .collect();

    serde_json::to_string_pretty(&records).context("Failed to serialise chunks")
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "comment" => PageSeparator::Comment,
        _ => PageSeparator::Custom(s.to_string()),
    }
}
