//! Progress-callback trait for per-file directory ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::IngestConfigBuilder::progress_callback`] to receive
//! events as [`crate::Ingestor::ingest_directory`] works through a batch.
//!
//! # Example
//!
//! ```rust
//! use edgequake_ingest::{IngestConfig, IngestProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl IngestProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, filename: &str, page_count: usize, _content_len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("#{done} {filename}: {page_count} pages");
//!     }
//! }
//!
//! let config = IngestConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by directory ingestion as it processes each file.
///
/// Files are converted concurrently, so `on_file_*` methods may be called
/// from different threads at once. All methods default to no-ops.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once, before the first file starts.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is handed to the converter.
    fn on_file_start(&self, filename: &str) {
        let _ = filename;
    }

    /// Called when a file was ingested.
    ///
    /// `content_len` is the byte length of the exported content.
    fn on_file_complete(&self, filename: &str, page_count: usize, content_len: usize) {
        let _ = (filename, page_count, content_len);
    }

    /// Called when a file failed; the batch continues.
    fn on_file_error(&self, filename: &str, error: &str) {
        let _ = (filename, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::IngestConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;
