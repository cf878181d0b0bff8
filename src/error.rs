//! Error types for the edgequake-ingest library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`IngestError`]: **fatal** for the call that returned it. The input is
//!   missing, its format is unsupported, the converter failed, or the
//!   configuration is invalid.
//!
//! * [`FileError`]: **non-fatal**. One file of a directory batch failed but
//!   the rest of the batch went through. Stored in
//!   [`crate::output::DirectoryOutput::failures`] so callers can report
//!   partial success instead of losing the whole batch to one bad file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-ingest library.
#[derive(Debug, Error)]
pub enum IngestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Directory passed to a batch ingest does not exist.
    #[error("Directory not found: '{path}'")]
    DirectoryNotFound { path: PathBuf },

    /// The input is neither a regular file nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// The file extension is not one of the supported document formats.
    #[error("Unsupported format: '{extension}' ({path})\nSupported: .pdf .docx .pptx .xlsx .html .md .csv")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The format is supported but the active converter has no backend for it.
    #[error("No conversion backend for {format} documents\nProvide a Converter that handles this format.")]
    NoBackend { format: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// A glob pattern for directory ingestion could not be parsed.
    #[error("Invalid file pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The converter could not turn the file into a document.
    #[error("Conversion of '{path}' failed: {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    /// The document could not be exported in the requested format.
    #[error("Export to {format} failed: {detail}")]
    ExportFailed { format: String, detail: String },

    // ── Chunking errors ───────────────────────────────────────────────────
    /// Chunk size / overlap combination cannot make forward progress.
    #[error("Invalid chunk parameters (chunk_size={chunk_size}, overlap={overlap}): {reason}")]
    InvalidChunkParams {
        chunk_size: usize,
        overlap: usize,
        reason: &'static str,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first use.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file of a directory batch.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("Failed to ingest {filename}: {detail}")]
pub struct FileError {
    /// Full path of the file that failed.
    pub path: PathBuf,
    /// File name only, as shown to users.
    pub filename: String,
    /// Human-readable cause.
    pub detail: String,
}

impl FileError {
    pub(crate) fn new(path: PathBuf, err: &IngestError) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            filename,
            detail: err.to_string(),
        }
    }
}
