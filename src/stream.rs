//! Streaming directory ingestion: emit documents as they complete.
//!
//! Unlike [`Ingestor::ingest_directory`], which returns only after every file
//! finishes, [`Ingestor::ingest_directory_stream`] yields each file's result
//! as soon as it is ready. Up to `config.concurrency` files are in flight, so
//! items arrive in completion order, not path order.

use crate::error::{FileError, IngestError};
use crate::ingest::{list_directory, Ingestor};
use crate::output::IngestedDocument;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<IngestedDocument, FileError>> + Send>>;

impl Ingestor {
    /// Ingest a directory, streaming each file's result as it completes.
    ///
    /// Matching is the same as [`Ingestor::ingest_directory`]. Batch start
    /// and per-file progress events fire; `on_batch_complete` does not, since
    /// the caller decides when the stream is done.
    ///
    /// # Errors
    /// `DirectoryNotFound` or `InvalidPattern`, before any file is touched.
    ///
    /// # Example
    /// ```rust,no_run
    /// use edgequake_ingest::{IngestConfig, Ingestor};
    /// use futures::StreamExt;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let ingestor = Ingestor::new(IngestConfig::default());
    /// let mut docs = ingestor.ingest_directory_stream("./docs", Some("*.md"))?;
    /// while let Some(item) = docs.next().await {
    ///     match item {
    ///         Ok(doc) => println!("{}: {} chars", doc.filename, doc.content.len()),
    ///         Err(e) => eprintln!("{e}"),
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn ingest_directory_stream(
        &self,
        dir: impl AsRef<Path>,
        pattern: Option<&str>,
    ) -> Result<DocumentStream, IngestError> {
        let files = list_directory(dir.as_ref(), pattern)?;
        info!(
            "Streaming ingestion of {} files from {}",
            files.len(),
            dir.as_ref().display()
        );

        if let Some(ref cb) = self.config().progress_callback {
            cb.on_batch_start(files.len());
        }

        let concurrency = self.config().concurrency.max(1);
        let this = self.clone();
        let s = stream::iter(files.into_iter().map(move |path| {
            let ingestor = this.clone();
            async move { ingestor.ingest_batch_file(&path).await }
        }))
        .buffer_unordered(concurrency);

        Ok(Box::pin(s))
    }
}
