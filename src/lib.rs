//! # edgequake-ingest
//!
//! Turn PDF, HTML, Markdown and CSV documents into text, and text into
//! overlapping chunks ready for retrieval-augmented generation.
//!
//! ## Pipeline Overview
//!
//! ```text
//! path / URL / bytes / directory
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Convert   Converter backend (pdfium, text sources) on spawn_blocking
//!  ├─ 3. Export    markdown | html | json | text
//!  ├─ 4. Output    IngestedDocument (content + metadata), save / to_dict
//!  └─ 5. Chunk     fixed-size overlapping windows, word-boundary aware
//! ```
//!
//! Document parsing sits behind the [`Converter`] trait. The built-in
//! [`DefaultConverter`] reads the pdfium text layer for PDFs and handles
//! Markdown, CSV and HTML natively; DOCX, PPTX and XLSX need a converter
//! supplied through [`Ingestor::with_converter`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_ingest::{IngestConfig, Ingestor, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IngestConfig::builder()
//!         .output_format(OutputFormat::Markdown)
//!         .build()?;
//!     let ingestor = Ingestor::new(config);
//!
//!     let doc = ingestor.ingest("handbook.pdf").await?;
//!     println!("{} pages in {:.2}s", doc.page_count, doc.processing_time);
//!     for chunk in doc.get_chunks(1000, 100)? {
//!         println!("---\n{chunk}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ingest` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-ingest = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod chunk;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    is_supported, ConvertOptions, Converter, DefaultConverter, Document, InputFormat, StructuredDocument,
    SUPPORTED_EXTENSIONS,
};
pub use chunk::{chunk_text, Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use config::{IngestConfig, IngestConfigBuilder, OutputFormat, PageSeparator};
pub use error::{FileError, IngestError};
pub use ingest::{quick_ingest, Ingestor};
pub use output::{BatchStats, DirectoryOutput, IngestedDocument};
pub use progress::{IngestProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::DocumentStream;
